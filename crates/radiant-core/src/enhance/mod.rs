//! Multiscale anisotropic enhancement
//!
//! This module is organized into submodules:
//! - `kernel`: per-pixel lattice-energy diffusion step
//! - `multiscale`: level loop building the base and detail layers
//! - `reconstruct`: bilateral smoothing of the base and 16-bit recombination
//!
//! The entry points here validate the input, optionally flip polarity, and
//! run normalize → decompose → reconstruct.

pub mod kernel;
pub mod multiscale;
pub mod reconstruct;

#[cfg(test)]
mod tests;

use std::time::Instant;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::cancel::CancelFlag;
use crate::error::{Error, Result};
use crate::field::{invert_polarity, normalize, Field16};

pub use kernel::{lattice_response, LatticeResponse};
pub use multiscale::{decompose, ScaleDecomposition};
pub use reconstruct::{bilateral_filter, reconstruct};

/// Smallest number of scale levels actually run.
pub const MIN_SCALE_LEVELS: u32 = 2;
/// Largest number of scale levels actually run.
pub const MAX_SCALE_LEVELS: u32 = 5;

/// Parameters for one enhancement run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementConfig {
    /// Detail amplification (typical range 3-10)
    pub strength: f32,

    /// Requested scale levels; clamped into [2, 5] when run
    pub scale_levels: u32,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            strength: 5.0,
            scale_levels: 3,
        }
    }
}

impl EnhancementConfig {
    pub fn new(strength: f32, scale_levels: u32) -> Self {
        Self {
            strength,
            scale_levels,
        }
    }

    /// Levels that will actually run.
    pub fn effective_levels(&self) -> u32 {
        self.scale_levels.clamp(MIN_SCALE_LEVELS, MAX_SCALE_LEVELS)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.strength.is_finite() || self.strength <= 0.0 {
            return Err(Error::invalid(format!(
                "enhancement strength must be positive, got {}",
                self.strength
            )));
        }
        Ok(())
    }
}

/// Sample polarity of the incoming field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Polarity {
    /// Bright means dense; use as is
    #[default]
    Normal,
    /// Raw modality data; flip with `65535 - v` before enhancing
    Inverted,
}

/// Result of an enhancement run.
#[derive(Debug, Clone)]
pub struct EnhancementOutput {
    /// The unenhanced field (after polarity correction)
    pub original: Field16,

    /// The enhanced 16-bit field
    pub enhanced: Field16,
}

/// Enhance a 16-bit field.
pub fn enhance(field: &Field16, config: &EnhancementConfig) -> Result<EnhancementOutput> {
    enhance_with_cancel(field, config, Polarity::Normal, &CancelFlag::new())
}

/// Enhance raw modality data: flip polarity first, then enhance.
pub fn enhance_dicom(field: &Field16, config: &EnhancementConfig) -> Result<EnhancementOutput> {
    enhance_with_cancel(field, config, Polarity::Inverted, &CancelFlag::new())
}

/// Enhance with explicit polarity and a cancel flag checked between stages.
pub fn enhance_with_cancel(
    field: &Field16,
    config: &EnhancementConfig,
    polarity: Polarity,
    cancel: &CancelFlag,
) -> Result<EnhancementOutput> {
    config.validate()?;
    cancel.checkpoint()?;

    let start = Instant::now();
    let original = match polarity {
        Polarity::Normal => field.clone(),
        Polarity::Inverted => invert_polarity(field),
    };

    let normalized = normalize(&original)?;
    let layers = decompose(&normalized, config, cancel)?;
    cancel.checkpoint()?;
    let enhanced = reconstruct(&layers);

    debug!(
        "enhanced {}x{} (strength {}, levels {}, {:?})",
        field.width(),
        field.height(),
        config.strength,
        config.effective_levels(),
        polarity
    );
    info!("enhancement finished in {:.2?}", start.elapsed());

    Ok(EnhancementOutput { original, enhanced })
}
