//! Radiant Core Library
//!
//! Detail enhancement, display windowing and quality metrics for
//! single-channel 16-bit radiographs.
//!
//! A typical run decodes a [`Field16`], enhances it, compresses both the
//! original and the enhanced field for display, and scores the result:
//!
//! ```no_run
//! use radiant_core::{assess_quality, compress_dynamic_range, enhance};
//! use radiant_core::{EnhancementConfig, Field16, WindowingConfig};
//!
//! # fn main() -> radiant_core::Result<()> {
//! let field = Field16::from_fn(512, 512, |x, y| ((x * 97 + y * 31) % 65536) as u16)?;
//! let output = enhance(&field, &EnhancementConfig::default())?;
//! let display = compress_dynamic_range(&output.enhanced, &WindowingConfig::default())?;
//! let metrics = assess_quality(&output.original, &output.enhanced)?;
//! println!("{}x{} display, PSNR {:.2} dB", display.width(), display.height(), metrics.psnr);
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod config;
pub mod enhance;
pub mod error;
pub mod field;
pub mod parallel;
pub mod quality;
pub mod windowing;

// Re-export commonly used types
pub use cancel::CancelFlag;
pub use config::{load_pipeline_config, PipelineConfig, PipelineConfigHandle};
pub use enhance::{
    enhance, enhance_dicom, enhance_with_cancel, EnhancementConfig, EnhancementOutput, Polarity,
};
pub use error::{Error, Result};
pub use field::{
    denormalize, invert_polarity, normalize, DecodedImage, Field16, Field8, FieldF32, PixelField,
    Samples,
};
pub use quality::{assess_quality, psnr, spatial_frequency, ssim, QualityMetrics};
pub use windowing::{
    compress_dynamic_range, compress_dynamic_range_with_window, estimate_window, Lut,
    WindowParams, WindowingConfig, WindowingPreset,
};
