//! Pipeline configuration loading.
//!
//! A `radiant.yml` file bundles the enhancement and windowing parameters.
//! Every field is optional; missing ones take the built-in defaults and
//! out-of-range ones are pulled back into range with a warning.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::enhance::{EnhancementConfig, Polarity, MAX_SCALE_LEVELS, MIN_SCALE_LEVELS};
use crate::error::{Error, Result};
use crate::windowing::{WindowingConfig, WindowingPreset, MAX_NOISE_REDUCTION, MAX_TILE_GRID};

/// Candidate config file names searched for on disk.
const CONFIG_FILENAMES: &[&str] = &["radiant.yml", "radiant.yaml"];

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "RADIANT_CONFIG";

/// Largest strength accepted from a config file.
const MAX_STRENGTH: f32 = 50.0;

/// Largest unsharp-mask amount accepted from a config file.
const MAX_SHARPENING: f32 = 5.0;

/// Complete configuration file structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub enhancement: EnhancementConfig,
    pub polarity: Polarity,
    /// Start from a named preset; explicit `windowing` keys are ignored
    /// when this is set
    pub preset: Option<WindowingPreset>,
    pub windowing: WindowingConfig,
}

impl PipelineConfig {
    /// Windowing parameters after applying `preset`.
    pub fn effective_windowing(&self) -> WindowingConfig {
        match self.preset {
            Some(preset) => preset.config(),
            None => self.windowing.clone(),
        }
    }

    /// Pull values back into their valid ranges, recording what changed.
    pub fn sanitize(mut self, warnings: &mut Vec<String>) -> Self {
        let enhancement = &mut self.enhancement;
        if !enhancement.strength.is_finite() || enhancement.strength <= 0.0 {
            warnings.push(format!(
                "enhancement.strength {} is not positive; using {}",
                enhancement.strength,
                EnhancementConfig::default().strength
            ));
            enhancement.strength = EnhancementConfig::default().strength;
        } else if enhancement.strength > MAX_STRENGTH {
            warnings.push(format!(
                "enhancement.strength {} clamped to {}",
                enhancement.strength, MAX_STRENGTH
            ));
            enhancement.strength = MAX_STRENGTH;
        }
        if enhancement.effective_levels() != enhancement.scale_levels {
            warnings.push(format!(
                "enhancement.scale_levels {} outside [{}, {}]; runs with {}",
                enhancement.scale_levels,
                MIN_SCALE_LEVELS,
                MAX_SCALE_LEVELS,
                enhancement.effective_levels()
            ));
            enhancement.scale_levels = enhancement.effective_levels();
        }

        let defaults = WindowingConfig::default();
        let windowing = &mut self.windowing;
        let (lower, upper) = (windowing.lower_percentile, windowing.upper_percentile);
        let lower_clamped = clamp_or(lower, 0.0, 50.0, defaults.lower_percentile);
        let upper_clamped = clamp_or(upper, 50.0, 100.0, defaults.upper_percentile);
        if lower_clamped >= upper_clamped {
            warnings.push(format!(
                "windowing percentiles {} and {} collapsed; using defaults",
                lower, upper
            ));
            windowing.lower_percentile = defaults.lower_percentile;
            windowing.upper_percentile = defaults.upper_percentile;
        } else {
            note_clamped("windowing.lower_percentile", lower, lower_clamped, warnings);
            note_clamped("windowing.upper_percentile", upper, upper_clamped, warnings);
            windowing.lower_percentile = lower_clamped;
            windowing.upper_percentile = upper_clamped;
        }

        sanitize_field(
            "windowing.min_window_width",
            &mut windowing.min_window_width,
            0.0,
            65535.0,
            defaults.min_window_width,
            warnings,
        );
        sanitize_field(
            "windowing.max_window_width",
            &mut windowing.max_window_width,
            0.0,
            f64::MAX,
            defaults.max_window_width,
            warnings,
        );
        if windowing.gamma_correction <= 0.0 || !windowing.gamma_correction.is_finite() {
            warnings.push(format!(
                "windowing.gamma_correction {} is not positive; using {}",
                windowing.gamma_correction, defaults.gamma_correction
            ));
            windowing.gamma_correction = defaults.gamma_correction;
        }
        sanitize_field(
            "windowing.contrast_enhancement",
            &mut windowing.contrast_enhancement,
            0.0,
            10.0,
            defaults.contrast_enhancement,
            warnings,
        );
        if windowing.local_contrast_clip_limit <= 0.0 || !windowing.local_contrast_clip_limit.is_finite() {
            warnings.push(format!(
                "windowing.local_contrast_clip_limit {} is not positive; using {}",
                windowing.local_contrast_clip_limit, defaults.local_contrast_clip_limit
            ));
            windowing.local_contrast_clip_limit = defaults.local_contrast_clip_limit;
        }
        let grid = windowing.local_contrast_tile_grid;
        let clamped_grid = grid.map(|tiles| tiles.clamp(1, MAX_TILE_GRID));
        if clamped_grid != grid {
            warnings.push(format!(
                "windowing.local_contrast_tile_grid {:?} outside [1, {}]; using {:?}",
                grid, MAX_TILE_GRID, clamped_grid
            ));
            windowing.local_contrast_tile_grid = clamped_grid;
        }
        sanitize_field(
            "windowing.sharpening_amount",
            &mut windowing.sharpening_amount,
            0.0,
            MAX_SHARPENING,
            defaults.sharpening_amount,
            warnings,
        );
        sanitize_field(
            "windowing.noise_reduction",
            &mut windowing.noise_reduction,
            0,
            MAX_NOISE_REDUCTION,
            defaults.noise_reduction,
            warnings,
        );
        self
    }
}

/// Clamp into `[lo, hi]`; values that do not compare (NaN) take `fallback`.
fn clamp_or<T: PartialOrd>(value: T, lo: T, hi: T, fallback: T) -> T {
    if value.partial_cmp(&lo).is_none() {
        fallback
    } else if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

fn note_clamped<T: PartialEq + fmt::Display>(name: &str, before: T, after: T, warnings: &mut Vec<String>) {
    if before != after {
        warnings.push(format!("{} {} out of range; using {}", name, before, after));
    }
}

fn sanitize_field<T>(name: &str, value: &mut T, lo: T, hi: T, fallback: T, warnings: &mut Vec<String>)
where
    T: PartialOrd + Copy + fmt::Display,
{
    let clamped = clamp_or(*value, lo, hi, fallback);
    note_clamped(name, *value, clamped, warnings);
    *value = clamped;
}

/// Loaded configuration, where it came from, and anything worth reporting.
#[derive(Debug, Clone)]
pub struct PipelineConfigHandle {
    pub config: PipelineConfig,
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl PipelineConfigHandle {
    fn with_config(config: PipelineConfig, source: Option<PathBuf>, warnings: Vec<String>) -> Self {
        Self {
            config,
            source,
            warnings,
        }
    }

    /// Log the source and warnings.
    pub fn log_usage(&self) {
        match &self.source {
            Some(source) => debug!("loaded pipeline config from {}", source.display()),
            None => debug!("using built-in pipeline defaults"),
        }
        for warning in &self.warnings {
            warn!("config: {}", warning);
        }
    }
}

/// Load configuration from disk, optionally forcing a specific path.
///
/// Candidates are tried in order (see [`config_candidates`]); the first file
/// that parses wins. Read or parse failures are recorded as warnings and
/// the search continues, ending with the built-in defaults.
pub fn load_pipeline_config(custom_path: Option<&Path>) -> PipelineConfigHandle {
    let mut warnings = Vec::new();

    for candidate in config_candidates(custom_path) {
        if !candidate.is_file() {
            continue;
        }

        match load_config_file(&candidate) {
            Ok(config) => {
                let sanitized = config.sanitize(&mut warnings);
                let source = fs::canonicalize(&candidate).unwrap_or(candidate);
                return PipelineConfigHandle::with_config(sanitized, Some(source), warnings);
            }
            Err(err) => warnings.push(err.to_string()),
        }
    }

    warnings.push("no pipeline config found; using built-in defaults".to_string());
    PipelineConfigHandle::with_config(PipelineConfig::default(), None, warnings)
}

/// Config file candidates in search order: the explicit path, the
/// `RADIANT_CONFIG` variable, `./config/` and `./`, then `~/radiant/`.
pub fn config_candidates(custom_path: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = custom_path {
        candidates.push(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        candidates.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        for name in CONFIG_FILENAMES {
            candidates.push(cwd.join("config").join(name));
            candidates.push(cwd.join(name));
        }
    }

    if let Some(home_dir) = dirs::home_dir() {
        for name in CONFIG_FILENAMES {
            candidates.push(home_dir.join("radiant").join(name));
        }
    }

    candidates
}

/// Read and parse one config file without sanitizing it.
pub fn load_config_file<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: format!("failed to read: {}", e),
    })?;

    serde_yaml::from_str(&contents).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: format!("failed to parse: {}", e),
    })
}

/// Write a config file as YAML.
pub fn save_config_file<P: AsRef<Path>>(config: &PipelineConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    let yaml = serde_yaml::to_string(config).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: format!("failed to serialize: {}", e),
    })?;

    fs::write(path, yaml).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: format!("failed to write: {}", e),
    })
}
