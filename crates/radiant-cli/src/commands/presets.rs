use std::collections::BTreeMap;

use anyhow::Result;
use radiant_core::{WindowingConfig, WindowingPreset};

/// Print every windowing preset as YAML.
pub fn cmd_presets(name: Option<String>) -> Result<()> {
    let presets: BTreeMap<&str, WindowingConfig> = match name {
        Some(name) => {
            let preset = name.parse::<WindowingPreset>()?;
            BTreeMap::from([(preset.name(), preset.config())])
        }
        None => WindowingPreset::ALL
            .iter()
            .map(|preset| (preset.name(), preset.config()))
            .collect(),
    };

    print!("{}", serde_yaml::to_string(&presets)?);
    Ok(())
}
