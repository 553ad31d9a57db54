//! Edge-preserving recombination of base and detail layers

use super::multiscale::ScaleDecomposition;
use crate::field::{to_sample, Field16, FieldF32, MAX_SAMPLE};
use crate::parallel::for_each_row_mut;

/// Bilateral kernel diameter applied to the base layer.
pub const BILATERAL_DIAMETER: usize = 5;

/// Range sigma in normalized sample units.
pub const BILATERAL_SIGMA_RANGE: f32 = 0.1;

/// Spatial sigma derived from a kernel size, the usual Gaussian-kernel rule
/// `0.3 * ((ksize - 1) / 2 - 1) + 0.8`.
pub fn sigma_for_kernel(diameter: usize) -> f32 {
    0.3 * ((diameter as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Bilateral filter over a float field.
///
/// The window is clipped at the borders; only in-bounds neighbours carry
/// weight.
pub fn bilateral_filter(field: &FieldF32, diameter: usize, sigma_range: f32) -> FieldF32 {
    let width = field.width() as usize;
    let height = field.height() as usize;
    let src = field.data();
    let radius = (diameter / 2) as isize;
    let sigma_space = sigma_for_kernel(diameter);

    // Precompute spatial Gaussian weights
    let side = (2 * radius + 1) as usize;
    let space_coeff = -1.0 / (2.0 * sigma_space * sigma_space);
    let mut spatial = vec![0.0f32; side * side];
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let idx = (dy + radius) as usize * side + (dx + radius) as usize;
            spatial[idx] = (space_coeff * (dx * dx + dy * dy) as f32).exp();
        }
    }
    let range_coeff = -1.0 / (2.0 * sigma_range * sigma_range);

    let mut out = vec![0.0f32; src.len()];
    for_each_row_mut(&mut out, width, |y, row| {
        for (x, dst) in row.iter_mut().enumerate() {
            let centre = src[y * width + x];
            let mut weight_sum = 0.0f32;
            let mut value_sum = 0.0f32;

            for dy in -radius..=radius {
                let ny = y as isize + dy;
                if ny < 0 || ny >= height as isize {
                    continue;
                }
                let src_row = &src[ny as usize * width..(ny as usize + 1) * width];
                for dx in -radius..=radius {
                    let nx = x as isize + dx;
                    if nx < 0 || nx >= width as isize {
                        continue;
                    }
                    let v = src_row[nx as usize];
                    let diff = v - centre;
                    let w = spatial[(dy + radius) as usize * side + (dx + radius) as usize]
                        * (range_coeff * diff * diff).exp();
                    weight_sum += w;
                    value_sum += w * v;
                }
            }

            // The centre always contributes weight 1, so weight_sum > 0
            *dst = value_sum / weight_sum;
        }
    });

    field.with_data(out)
}

/// Smooth the base layer, add back the detail and rescale to 16 bits.
pub fn reconstruct(layers: &ScaleDecomposition) -> Field16 {
    let smoothed = bilateral_filter(&layers.base, BILATERAL_DIAMETER, BILATERAL_SIGMA_RANGE);
    let width = smoothed.width() as usize;
    let base = smoothed.data();
    let detail = layers.detail.data();

    let mut out = vec![0u16; base.len()];
    for_each_row_mut(&mut out, width, |y, row| {
        let offset = y * width;
        for (x, dst) in row.iter_mut().enumerate() {
            let value = base[offset + x] + detail[offset + x];
            *dst = to_sample(value * MAX_SAMPLE);
        }
    });

    smoothed.with_data(out)
}
