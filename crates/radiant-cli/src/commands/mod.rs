//! Command implementations for the radiant CLI.

mod assess;
mod compress;
mod enhance;
mod presets;
mod sweep;

use std::path::Path;

use anyhow::Result;
use radiant_core::{load_pipeline_config, PipelineConfig, Polarity, WindowingPreset};

pub use assess::cmd_assess;
pub use compress::cmd_compress;
pub use enhance::{cmd_enhance, EnhanceArgs};
pub use presets::cmd_presets;
pub use sweep::cmd_sweep;

/// Load the pipeline config and apply command-line overrides on top.
pub(crate) fn resolve_config(
    config_path: Option<&Path>,
    preset: Option<&str>,
    invert: bool,
) -> Result<PipelineConfig> {
    let handle = load_pipeline_config(config_path);
    handle.log_usage();

    let mut config = handle.config;
    if let Some(name) = preset {
        config.preset = Some(name.parse::<WindowingPreset>()?);
    }
    if invert {
        config.polarity = Polarity::Inverted;
    }
    Ok(config)
}
