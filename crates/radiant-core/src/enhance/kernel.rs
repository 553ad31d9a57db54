//! Lattice-energy neighbourhood kernel
//!
//! For one pixel, weighs every neighbour within a Chebyshev radius by the
//! Gaussian similarity `exp(-(c - v)^2)` ("lattice energy") and returns the
//! mean energy together with the energy-weighted mean difference. This is
//! one anisotropic diffusion step: similar neighbours pull strongly, edges
//! barely move.

/// Guards the gradient division on perfectly uniform neighbourhoods.
pub const ENERGY_EPSILON: f32 = 1e-8;

/// Kernel output for one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeResponse {
    /// Mean lattice energy over the neighbourhood (0.0-1.0]
    pub growth_rate: f32,
    /// Energy-weighted mean of `neighbour - centre`
    pub gradient: f32,
}

/// Neighbourhood radius used at scale `level`.
#[inline]
pub fn level_radius(level: u32) -> u32 {
    1 + level
}

/// Evaluate the kernel at `(x, y)` over `src` (row-major, `width` x `height`).
///
/// The neighbourhood is clipped to the image bounds and includes the centre.
#[inline]
pub fn lattice_response(
    src: &[f32],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    level: u32,
) -> LatticeResponse {
    let r = level_radius(level) as usize;
    let centre = src[y * width + x];

    let y0 = y.saturating_sub(r);
    let y1 = (y + r).min(height - 1);
    let x0 = x.saturating_sub(r);
    let x1 = (x + r).min(width - 1);

    let mut energy_sum = 0.0f32;
    let mut gradient_sum = 0.0f32;
    let mut count = 0u32;

    for ny in y0..=y1 {
        let row = &src[ny * width..(ny + 1) * width];
        for &v in &row[x0..=x1] {
            let diff = v - centre;
            let energy = (-(diff * diff)).exp();
            energy_sum += energy;
            gradient_sum += diff * energy;
            count += 1;
        }
    }

    LatticeResponse {
        growth_rate: energy_sum / count as f32,
        gradient: gradient_sum / (energy_sum + ENERGY_EPSILON),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_neighbourhood() {
        let src = vec![0.4f32; 25];
        let response = lattice_response(&src, 5, 5, 2, 2, 0);

        assert!((response.growth_rate - 1.0).abs() < 1e-6);
        assert!(response.gradient.abs() < 1e-9);
    }

    #[test]
    fn test_corner_is_clipped() {
        // 3x3 with a bright top-left corner; radius 1 at the corner sees 4 pixels
        let mut src = vec![0.0f32; 9];
        src[0] = 1.0;
        let response = lattice_response(&src, 3, 3, 0, 0, 0);

        let e = (-1.0f32).exp();
        let expected_growth = (1.0 + 3.0 * e) / 4.0;
        let expected_gradient = (3.0 * -1.0 * e) / (1.0 + 3.0 * e + ENERGY_EPSILON);

        assert!((response.growth_rate - expected_growth).abs() < 1e-6);
        assert!((response.gradient - expected_gradient).abs() < 1e-6);
    }

    #[test]
    fn test_radius_grows_with_level() {
        // A single bright pixel two columns away only enters at level 1
        let mut src = vec![0.0f32; 25];
        src[2 * 5 + 4] = 1.0;

        let level0 = lattice_response(&src, 5, 5, 2, 2, 0);
        let level1 = lattice_response(&src, 5, 5, 2, 2, 1);

        assert!(level0.gradient.abs() < 1e-9);
        assert!(level1.gradient > 0.0);
        assert_eq!(level_radius(3), 4);
    }
}
