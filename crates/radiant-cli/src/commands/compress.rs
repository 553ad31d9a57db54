use std::path::PathBuf;

use anyhow::Result;
use radiant_core::{compress_dynamic_range_with_window, invert_polarity, Polarity};

use super::resolve_config;
use radiant_cli::{decode_field, derived_path, export_png8, output_dir_for};

/// Write an 8-bit display rendition of a 16-bit image.
pub fn cmd_compress(
    input: PathBuf,
    out: Option<PathBuf>,
    preset: Option<String>,
    config: Option<PathBuf>,
    invert: bool,
) -> Result<()> {
    let config = resolve_config(config.as_deref(), preset.as_deref(), invert)?;

    let mut field = decode_field(&input)?;
    if config.polarity == Polarity::Inverted {
        field = invert_polarity(&field);
    }

    let (display, window) = compress_dynamic_range_with_window(&field, &config.effective_windowing())?;

    let output = match out {
        Some(path) => path,
        None => derived_path(&input, &output_dir_for(&input, None), "_display.png")?,
    };
    export_png8(&display, &output)?;

    println!(
        "{} -> {} (window level {:.1}, width {:.1})",
        input.display(),
        output.display(),
        window.level,
        window.width
    );
    Ok(())
}
