//! JSON metric reports
//!
//! serde_json has no representation for infinity, so PSNR is written as the
//! string `"inf"` when the compared images are identical.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use radiant_core::{EnhancementConfig, Polarity, QualityMetrics, WindowParams};
use serde::{Serialize, Serializer};

/// Metrics as written to reports.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsRecord {
    #[serde(serialize_with = "serialize_psnr")]
    pub psnr: f64,
    pub ssim: f64,
    pub spatial_frequency_original: f64,
    pub spatial_frequency_processed: f64,
    pub spatial_frequency_gain: f64,
}

impl From<QualityMetrics> for MetricsRecord {
    fn from(metrics: QualityMetrics) -> Self {
        Self {
            psnr: metrics.psnr,
            ssim: metrics.ssim,
            spatial_frequency_original: metrics.spatial_frequency_original,
            spatial_frequency_processed: metrics.spatial_frequency_processed,
            spatial_frequency_gain: metrics.spatial_frequency_gain(),
        }
    }
}

fn serialize_psnr<S: Serializer>(psnr: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if psnr.is_infinite() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_f64(*psnr)
    }
}

/// Per-image record of an enhancement run.
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub input: PathBuf,
    pub width: u32,
    pub height: u32,
    pub polarity: Polarity,
    pub enhancement: EnhancementConfig,
    pub enhanced_output: PathBuf,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub display_outputs: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_original: Option<WindowParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_enhanced: Option<WindowParams>,
    pub metrics: MetricsRecord,
    pub elapsed_secs: f64,
}

/// An image that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub input: PathBuf,
    pub error: String,
}

/// Whole-batch report.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generator: String,
    pub images: Vec<ImageReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureRecord>,
}

impl BatchReport {
    pub fn new(images: Vec<ImageReport>, failures: Vec<FailureRecord>) -> Self {
        Self {
            generator: generator(),
            images,
            failures,
        }
    }
}

/// One setting combination in a parameter sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepEntry {
    pub strength: f32,
    pub scale_levels: u32,
    pub metrics: MetricsRecord,
    pub elapsed_secs: f64,
}

/// Report of a parameter sweep over one image.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub generator: String,
    pub input: PathBuf,
    pub polarity: Polarity,
    pub entries: Vec<SweepEntry>,
}

impl SweepReport {
    pub fn new(input: PathBuf, polarity: Polarity, entries: Vec<SweepEntry>) -> Self {
        Self {
            generator: generator(),
            input,
            polarity,
            entries,
        }
    }

    /// Entry with the highest SSIM.
    pub fn best_by_ssim(&self) -> Option<&SweepEntry> {
        self.entries
            .iter()
            .max_by(|a, b| a.metrics.ssim.total_cmp(&b.metrics.ssim))
    }
}

fn generator() -> String {
    format!("radiant {}", env!("CARGO_PKG_VERSION"))
}

/// Serialize any report as pretty JSON.
pub fn write_report<T: Serialize, P: AsRef<Path>>(report: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    fs::write(path, json).with_context(|| format!("failed to write report {}", path.display()))
}
