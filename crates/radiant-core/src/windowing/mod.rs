//! Adaptive dynamic-range compression
//!
//! Maps a 16-bit field onto the 8-bit display range:
//! - `estimate`: pick a window (level/width) from the sample distribution
//! - `lut`: build and apply the 65536-entry display table
//! - `post`: optional local contrast, sharpening and denoising
//!
//! Presets are plain [`WindowingConfig`] values.

pub mod estimate;
pub mod lut;
pub mod post;


use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::{Field16, Field8};

pub use estimate::{block_bounds, estimate_window, histogram_bounds, RawBounds};
pub use lut::{Lut, LUT_SIZE};
pub use post::{equalize_local_contrast, median_filter, post_process, unsharp_mask};

/// Largest local-contrast tile count per axis.
pub const MAX_TILE_GRID: u32 = 64;

/// Largest median denoise level (11x11 kernel).
pub const MAX_NOISE_REDUCTION: u32 = 5;

/// Display window centred on `level` spanning `width` samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowParams {
    pub level: f64,
    pub width: f64,
}

/// Windowing and display post-processing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowingConfig {
    /// Dark-side percentile cutoff for the histogram strategy
    pub lower_percentile: f64,
    /// Bright-side percentile cutoff for the histogram strategy
    pub upper_percentile: f64,
    /// Window width floor in samples
    pub min_window_width: f64,
    /// Window width ceiling in samples (0 = unlimited)
    pub max_window_width: f64,
    /// Use tile statistics instead of the histogram
    pub use_block_statistics: bool,
    pub gamma_correction: f64,
    /// Logistic contrast strength (0 disables the curve)
    pub contrast_enhancement: f64,

    /// Master switch for the 8-bit stages below
    pub apply_post_processing: bool,
    pub use_local_contrast: bool,
    pub local_contrast_clip_limit: f32,
    /// Tiles across and down for local contrast
    pub local_contrast_tile_grid: [u32; 2],
    /// Unsharp-mask amount (0 disables sharpening)
    pub sharpening_amount: f32,
    /// Median denoise level (0 disables, 1 = 3x3, 2 = 5x5, ...)
    pub noise_reduction: u32,
}

impl Default for WindowingConfig {
    fn default() -> Self {
        Self {
            lower_percentile: 0.5,
            upper_percentile: 99.5,
            min_window_width: 2000.0,
            max_window_width: 0.0,
            use_block_statistics: true,
            gamma_correction: 1.1,
            contrast_enhancement: 0.15,
            apply_post_processing: true,
            use_local_contrast: true,
            local_contrast_clip_limit: 2.5,
            local_contrast_tile_grid: [8, 8],
            sharpening_amount: 0.2,
            noise_reduction: 1,
        }
    }
}

impl WindowingConfig {
    pub fn validate(&self) -> Result<()> {
        let (lower, upper) = (self.lower_percentile, self.upper_percentile);
        if !(0.0..=100.0).contains(&lower) || !(0.0..=100.0).contains(&upper) || lower >= upper {
            return Err(Error::invalid(format!(
                "percentiles must satisfy 0 <= lower < upper <= 100, got {} and {}",
                lower, upper
            )));
        }
        if !self.min_window_width.is_finite() || self.min_window_width < 0.0 {
            return Err(Error::invalid(format!(
                "min_window_width must be non-negative, got {}",
                self.min_window_width
            )));
        }
        if !self.max_window_width.is_finite() || self.max_window_width < 0.0 {
            return Err(Error::invalid(format!(
                "max_window_width must be non-negative, got {}",
                self.max_window_width
            )));
        }
        if !self.gamma_correction.is_finite() || self.gamma_correction <= 0.0 {
            return Err(Error::invalid(format!(
                "gamma_correction must be positive, got {}",
                self.gamma_correction
            )));
        }
        if !self.contrast_enhancement.is_finite() || self.contrast_enhancement < 0.0 {
            return Err(Error::invalid(format!(
                "contrast_enhancement must be non-negative, got {}",
                self.contrast_enhancement
            )));
        }
        if self.apply_post_processing {
            if self.use_local_contrast {
                if !self.local_contrast_clip_limit.is_finite() || self.local_contrast_clip_limit <= 0.0 {
                    return Err(Error::invalid(format!(
                        "local_contrast_clip_limit must be positive, got {}",
                        self.local_contrast_clip_limit
                    )));
                }
                let grid = self.local_contrast_tile_grid;
                if grid.iter().any(|&tiles| tiles == 0 || tiles > MAX_TILE_GRID) {
                    return Err(Error::invalid(format!(
                        "local_contrast_tile_grid must be 1..={} tiles per axis, got {:?}",
                        MAX_TILE_GRID, grid
                    )));
                }
            }
            if self.noise_reduction > MAX_NOISE_REDUCTION {
                return Err(Error::invalid(format!(
                    "noise_reduction must be at most {}, got {}",
                    MAX_NOISE_REDUCTION, self.noise_reduction
                )));
            }
            if !self.sharpening_amount.is_finite() || self.sharpening_amount < 0.0 {
                return Err(Error::invalid(format!(
                    "sharpening_amount must be non-negative, got {}",
                    self.sharpening_amount
                )));
            }
        }
        Ok(())
    }
}

/// Named windowing presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowingPreset {
    /// Histogram window, no post-processing
    Fast,
    /// The default configuration
    #[default]
    Optimal,
    /// Tighter cutoffs, stronger local contrast and 5x5 denoising
    HighQuality,
}

impl WindowingPreset {
    pub const ALL: [WindowingPreset; 3] = [Self::Fast, Self::Optimal, Self::HighQuality];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Optimal => "optimal",
            Self::HighQuality => "high-quality",
        }
    }

    pub fn config(self) -> WindowingConfig {
        match self {
            Self::Fast => WindowingConfig {
                use_block_statistics: false,
                apply_post_processing: false,
                use_local_contrast: false,
                sharpening_amount: 0.0,
                noise_reduction: 0,
                ..WindowingConfig::default()
            },
            Self::Optimal => WindowingConfig::default(),
            Self::HighQuality => WindowingConfig {
                lower_percentile: 0.1,
                upper_percentile: 99.9,
                gamma_correction: 1.05,
                contrast_enhancement: 0.2,
                local_contrast_clip_limit: 3.0,
                local_contrast_tile_grid: [16, 16],
                sharpening_amount: 0.3,
                noise_reduction: 2,
                ..WindowingConfig::default()
            },
        }
    }
}

impl fmt::Display for WindowingPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowingPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "fast" => Ok(Self::Fast),
            "optimal" | "default" => Ok(Self::Optimal),
            "high-quality" | "hq" => Ok(Self::HighQuality),
            other => Err(Error::invalid(format!("unknown windowing preset '{}'", other))),
        }
    }
}

/// Compress a 16-bit field to an 8-bit display image.
pub fn compress_dynamic_range(field: &Field16, config: &WindowingConfig) -> Result<Field8> {
    compress_dynamic_range_with_window(field, config).map(|(display, _)| display)
}

/// As [`compress_dynamic_range`], also returning the estimated window.
pub fn compress_dynamic_range_with_window(
    field: &Field16,
    config: &WindowingConfig,
) -> Result<(Field8, WindowParams)> {
    config.validate()?;
    let start = Instant::now();

    let window = estimate_window(field, config);
    info!(
        "window level {:.1}, width {:.1} ({})",
        window.level,
        window.width,
        if config.use_block_statistics {
            "block statistics"
        } else {
            "histogram"
        }
    );

    let lut = Lut::build(&window, config);
    let display = post_process(lut.apply(field), config);

    debug!(
        "compressed {}x{} in {:.2?}",
        field.width(),
        field.height(),
        start.elapsed()
    );
    Ok((display, window))
}
