//! Multiscale base/detail decomposition
//!
//! Runs the lattice kernel over the whole field once per scale level. Each
//! level reads the previous level's base layer and writes a fresh one, so the
//! two base buffers are swapped at every level boundary.

use log::debug;

use super::kernel::lattice_response;
use super::EnhancementConfig;
use crate::cancel::CancelFlag;
use crate::error::Result;
use crate::field::FieldF32;
use crate::parallel::for_each_row_pair_mut;

/// Double-buffered working set for one decomposition run.
struct ScaleLayers {
    current: Vec<f32>,
    next: Vec<f32>,
    detail: Vec<f32>,
}

impl ScaleLayers {
    fn new(normalized: &[f32]) -> Self {
        Self {
            current: normalized.to_vec(),
            next: vec![0.0; normalized.len()],
            detail: vec![0.0; normalized.len()],
        }
    }

    /// Make the base just written the input of the next level.
    fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }
}

/// Final base and accumulated detail layers.
#[derive(Debug, Clone)]
pub struct ScaleDecomposition {
    pub base: FieldF32,
    pub detail: FieldF32,
}

/// Weight applied to level `level` of `levels`: `((level + 1) / levels)^2`.
#[inline]
pub fn level_weight(level: u32, levels: u32) -> f32 {
    let ratio = (level + 1) as f32 / levels as f32;
    ratio * ratio
}

/// Decompose a normalized field into base and detail layers.
///
/// The cancel flag is checked before every level.
pub fn decompose(
    normalized: &FieldF32,
    config: &EnhancementConfig,
    cancel: &CancelFlag,
) -> Result<ScaleDecomposition> {
    let width = normalized.width() as usize;
    let height = normalized.height() as usize;
    let levels = config.effective_levels();
    let strength = config.strength;

    let mut layers = ScaleLayers::new(normalized.data());

    for level in 0..levels {
        cancel.checkpoint()?;

        let weight = strength * level_weight(level, levels);
        let current = &layers.current;

        for_each_row_pair_mut(
            &mut layers.next,
            &mut layers.detail,
            width,
            |y, next_row, detail_row| {
                for x in 0..width {
                    let response = lattice_response(current, width, height, x, y, level);
                    let value = current[y * width + x];
                    let base = value + response.gradient;
                    let local_detail = (value - base) * response.growth_rate;
                    detail_row[x] += weight * local_detail;
                    next_row[x] = base;
                }
            },
        );

        layers.swap();
        debug!("scale level {}/{} done (weight {:.4})", level + 1, levels, weight);
    }

    Ok(ScaleDecomposition {
        base: normalized.with_data(layers.current),
        detail: normalized.with_data(layers.detail),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn config(strength: f32, scale_levels: u32) -> EnhancementConfig {
        EnhancementConfig {
            strength,
            scale_levels,
        }
    }

    #[test]
    fn test_level_weight() {
        assert!((level_weight(0, 2) - 0.25).abs() < 1e-6);
        assert!((level_weight(1, 2) - 1.0).abs() < 1e-6);
        assert!((level_weight(2, 5) - 0.36).abs() < 1e-6);
    }

    #[test]
    fn test_constant_field_has_no_detail() {
        let field = FieldF32::filled(6, 5, 0.3).unwrap();
        let result = decompose(&field, &config(5.0, 3), &CancelFlag::new()).unwrap();

        assert!(result.detail.data().iter().all(|&d| d.abs() < 1e-6));
        assert!(result.base.data().iter().all(|&b| (b - 0.3).abs() < 1e-6));
    }

    #[test]
    fn test_step_edge_produces_detail() {
        let field = FieldF32::from_fn(8, 4, |x, _| if x < 4 { 0.2 } else { 0.8 }).unwrap();
        let result = decompose(&field, &config(5.0, 2), &CancelFlag::new()).unwrap();

        // Dark side of the edge is pulled up by diffusion, so its detail is negative
        let dark = result.detail.get(3, 1).copied().unwrap();
        let bright = result.detail.get(4, 1).copied().unwrap();
        assert!(dark < 0.0, "dark side detail {}", dark);
        assert!(bright > 0.0, "bright side detail {}", bright);
    }

    #[test]
    fn test_cancelled_before_first_level() {
        let field = FieldF32::filled(4, 4, 0.5).unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let result = decompose(&field, &config(5.0, 3), &cancel);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
