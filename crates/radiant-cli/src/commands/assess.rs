use std::path::PathBuf;

use anyhow::Result;
use radiant_core::assess_quality;

use radiant_cli::{decode_field, MetricsRecord};

/// Compare a reference image with a processed one.
pub fn cmd_assess(original: PathBuf, processed: PathBuf, json: bool) -> Result<()> {
    let a = decode_field(&original)?;
    let b = decode_field(&processed)?;
    let metrics = assess_quality(&a, &b)?;

    if json {
        let record = MetricsRecord::from(metrics);
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("Original:  {}", original.display());
    println!("Processed: {}", processed.display());
    println!("  PSNR:              {:.4} dB", metrics.psnr);
    println!("  SSIM:              {:.6}", metrics.ssim);
    println!(
        "  Spatial frequency: {:.4} -> {:.4} ({:+.4})",
        metrics.spatial_frequency_original,
        metrics.spatial_frequency_processed,
        metrics.spatial_frequency_gain()
    );
    Ok(())
}
