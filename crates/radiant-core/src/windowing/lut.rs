//! 16-bit to 8-bit lookup table

use super::{WindowParams, WindowingConfig};
use crate::field::{Field16, Field8, MAX_SAMPLE};
use crate::parallel::for_each_row_mut;

/// Number of LUT entries (every 16-bit sample value).
pub const LUT_SIZE: usize = 65536;

/// Gamma values within this distance of 1.0 are treated as linear.
const GAMMA_TOLERANCE: f64 = 0.01;

/// Immutable 65536-entry display mapping.
#[derive(Clone)]
pub struct Lut {
    table: Box<[u8]>,
}

impl std::fmt::Debug for Lut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lut").field("len", &self.table.len()).finish()
    }
}

impl Lut {
    /// Build the table for a window, applying gamma and the logistic
    /// contrast curve from `config`.
    pub fn build(window: &WindowParams, config: &WindowingConfig) -> Self {
        let (lower, upper) = window.bounds();
        let span = upper - lower;
        let gamma = config.gamma_correction;
        let apply_gamma = (gamma - 1.0).abs() > GAMMA_TOLERANCE;
        let contrast = config.contrast_enhancement;

        let table = (0..LUT_SIZE)
            .map(|i| {
                let value = i as f64;
                if value <= lower {
                    return 0u8;
                }
                if value >= upper {
                    return 255u8;
                }

                let mut t = (value - lower) / span;
                if apply_gamma {
                    t = t.powf(gamma);
                }
                if contrast > 0.0 {
                    t = logistic_contrast(t, contrast);
                }
                (t * 255.0).clamp(0.0, 255.0).round() as u8
            })
            .collect::<Vec<u8>>()
            .into_boxed_slice();

        Self { table }
    }

    #[inline]
    pub fn get(&self, sample: u16) -> u8 {
        self.table[sample as usize]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.table
    }

    /// Map every sample through the table.
    pub fn apply(&self, field: &Field16) -> Field8 {
        let width = field.width() as usize;
        let src = field.data();
        let mut out = vec![0u8; src.len()];

        for_each_row_mut(&mut out, width, |y, row| {
            let src_row = &src[y * width..(y + 1) * width];
            for (dst, &s) in row.iter_mut().zip(src_row) {
                *dst = self.table[s as usize];
            }
        });

        field.with_data(out)
    }
}

/// `1 / (1 + exp(-k (t - 0.5) 10)) * 0.5 + 0.25`
#[inline]
pub fn logistic_contrast(t: f64, k: f64) -> f64 {
    1.0 / (1.0 + (-k * (t - 0.5) * 10.0).exp()) * 0.5 + 0.25
}

impl WindowParams {
    /// Lower and upper sample bounds of the window, clamped to the 16-bit
    /// range with `upper >= lower + 1`.
    pub fn bounds(&self) -> (f64, f64) {
        let max = MAX_SAMPLE as f64;
        let lower = (self.level - self.width / 2.0).clamp(0.0, max);
        let upper = (self.level + self.width / 2.0).clamp(0.0, max).max(lower + 1.0);
        (lower, upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_config() -> WindowingConfig {
        WindowingConfig {
            gamma_correction: 1.0,
            contrast_enhancement: 0.0,
            ..WindowingConfig::default()
        }
    }

    #[test]
    fn test_linear_lut_is_piecewise_linear() {
        let window = WindowParams {
            level: 30_000.0,
            width: 20_000.0,
        };
        let lut = Lut::build(&window, &linear_config());

        assert_eq!(lut.get(0), 0);
        assert_eq!(lut.get(20_000), 0);
        assert_eq!(lut.get(40_000), 255);
        assert_eq!(lut.get(65_535), 255);

        let mid = lut.get(30_000);
        assert!(mid == 127 || mid == 128, "midpoint mapped to {}", mid);

        // Quarter point: 0.25 * 255 = 63.75
        assert_eq!(lut.get(25_000), 64);

        // Monotone non-decreasing
        assert!(lut.as_slice().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_gamma_darkens_midtones() {
        let window = WindowParams {
            level: 32_768.0,
            width: 65_535.0,
        };
        let linear = Lut::build(&window, &linear_config());
        let gamma = Lut::build(
            &window,
            &WindowingConfig {
                gamma_correction: 2.0,
                ..linear_config()
            },
        );
        assert!(gamma.get(32_768) < linear.get(32_768));
    }

    #[test]
    fn test_gamma_within_tolerance_is_ignored() {
        let window = WindowParams {
            level: 32_768.0,
            width: 40_000.0,
        };
        let linear = Lut::build(&window, &linear_config());
        let near_one = Lut::build(
            &window,
            &WindowingConfig {
                gamma_correction: 1.005,
                ..linear_config()
            },
        );
        assert_eq!(linear.as_slice(), near_one.as_slice());
    }

    #[test]
    fn test_logistic_contrast_curve() {
        assert!((logistic_contrast(0.5, 0.15) - 0.5).abs() < 1e-12);
        // Curve is bounded to (0.25, 0.75) inside the window
        assert!(logistic_contrast(0.0, 5.0) > 0.25);
        assert!(logistic_contrast(1.0, 5.0) < 0.75);
        assert!(logistic_contrast(0.8, 0.15) > logistic_contrast(0.2, 0.15));
    }

    #[test]
    fn test_zero_width_window_is_widened() {
        let window = WindowParams {
            level: 0.0,
            width: 0.0,
        };
        let (lower, upper) = window.bounds();
        assert_eq!(lower, 0.0);
        assert_eq!(upper, 1.0);

        let lut = Lut::build(&window, &linear_config());
        assert_eq!(lut.get(0), 0);
        assert_eq!(lut.get(1), 255);
    }

    #[test]
    fn test_apply_maps_every_sample() {
        let field = Field16::new(3, 1, vec![0, 30_000, 65_535]).unwrap();
        let window = WindowParams {
            level: 30_000.0,
            width: 20_000.0,
        };
        let lut = Lut::build(&window, &linear_config());
        let out = lut.apply(&field);

        assert_eq!(out.dimensions(), (3, 1));
        assert_eq!(out.data()[0], 0);
        assert_eq!(out.data()[2], 255);
    }
}
