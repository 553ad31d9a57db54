//! Single-image processing, shared by the enhance and batch paths.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use log::debug;
use radiant_core::{
    assess_quality, compress_dynamic_range_with_window, enhance_with_cancel, CancelFlag,
    EnhancementConfig, Polarity, WindowingConfig,
};

use super::input::{derived_path, output_dir_for};
use crate::decoders::decode_field;
use crate::exporters::{export_png8, export_tiff16};
use crate::report::ImageReport;

/// Settings shared by every image of a run.
#[derive(Debug, Clone)]
pub struct ProcessingParams {
    pub enhancement: EnhancementConfig,
    pub polarity: Polarity,
    pub windowing: WindowingConfig,
    /// Also write 8-bit display PNGs of the original and enhanced fields
    pub write_display: bool,
}

/// Decode, enhance, export and score one image.
///
/// Writes `<stem>_enhanced.tif` and, when enabled,
/// `<stem>_original_display.png` and `<stem>_enhanced_display.png`.
pub fn process_single_image(
    input: &Path,
    out: Option<&Path>,
    params: &ProcessingParams,
    cancel: &CancelFlag,
) -> Result<ImageReport> {
    let start = Instant::now();
    cancel.checkpoint()?;

    let field = decode_field(input)?;
    let output = enhance_with_cancel(&field, &params.enhancement, params.polarity, cancel)
        .with_context(|| format!("enhancement failed for {}", input.display()))?;

    let out_dir = output_dir_for(input, out);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let enhanced_output = derived_path(input, &out_dir, "_enhanced.tif")?;
    export_tiff16(&output.enhanced, &enhanced_output)?;

    let mut display_outputs = Vec::new();
    let mut window_original = None;
    let mut window_enhanced = None;
    if params.write_display {
        cancel.checkpoint()?;
        let (display, window) = compress_dynamic_range_with_window(&output.original, &params.windowing)?;
        let path = derived_path(input, &out_dir, "_original_display.png")?;
        export_png8(&display, &path)?;
        display_outputs.push(path);
        window_original = Some(window);

        let (display, window) = compress_dynamic_range_with_window(&output.enhanced, &params.windowing)?;
        let path = derived_path(input, &out_dir, "_enhanced_display.png")?;
        export_png8(&display, &path)?;
        display_outputs.push(path);
        window_enhanced = Some(window);
    }

    let metrics = assess_quality(&output.original, &output.enhanced)?;
    debug!("{}: {:?}", input.display(), metrics);

    Ok(ImageReport {
        input: input.to_path_buf(),
        width: field.width(),
        height: field.height(),
        polarity: params.polarity,
        enhancement: params.enhancement,
        enhanced_output,
        display_outputs,
        window_original,
        window_enhanced,
        metrics: metrics.into(),
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
