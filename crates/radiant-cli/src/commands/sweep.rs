use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use rayon::prelude::*;

use radiant_cli::report::{SweepEntry, SweepReport};
use radiant_cli::{decode_field, write_report};
use radiant_core::{assess_quality, enhance_with_cancel, CancelFlag, EnhancementConfig};

use super::resolve_config;

/// Enhance one image over a grid of strengths and level counts.
pub fn cmd_sweep(
    input: PathBuf,
    strengths: Vec<f32>,
    levels: Vec<u32>,
    invert: bool,
    config: Option<PathBuf>,
    report: Option<PathBuf>,
) -> Result<()> {
    if strengths.is_empty() || levels.is_empty() {
        bail!("sweep needs at least one strength and one level count");
    }

    let config = resolve_config(config.as_deref(), None, invert)?;
    let grid: Vec<EnhancementConfig> = strengths
        .iter()
        .flat_map(|&strength| levels.iter().map(move |&l| EnhancementConfig::new(strength, l)))
        .collect();
    for settings in &grid {
        settings.validate()?;
    }

    let field = decode_field(&input)?;
    let cancel = CancelFlag::new();
    println!(
        "Sweeping {} settings over {} ({}x{})",
        grid.len(),
        input.display(),
        field.width(),
        field.height()
    );

    let entries: Vec<SweepEntry> = grid
        .par_iter()
        .map(|settings| -> Result<SweepEntry> {
            let start = Instant::now();
            let output = enhance_with_cancel(&field, settings, config.polarity, &cancel)?;
            let metrics = assess_quality(&output.original, &output.enhanced)?;
            Ok(SweepEntry {
                strength: settings.strength,
                scale_levels: settings.effective_levels(),
                metrics: metrics.into(),
                elapsed_secs: start.elapsed().as_secs_f64(),
            })
        })
        .collect::<Result<_>>()?;

    println!(
        "\n{:>8} {:>6} {:>10} {:>9} {:>10}",
        "strength", "levels", "psnr", "ssim", "sf gain"
    );
    for entry in &entries {
        println!(
            "{:>8.2} {:>6} {:>10.3} {:>9.5} {:>+10.3}",
            entry.strength,
            entry.scale_levels,
            entry.metrics.psnr,
            entry.metrics.ssim,
            entry.metrics.spatial_frequency_gain
        );
    }

    let sweep = SweepReport::new(input, config.polarity, entries);
    if let Some(best) = sweep.best_by_ssim() {
        println!(
            "\nHighest SSIM: strength {}, {} levels",
            best.strength, best.scale_levels
        );
    }
    if let Some(path) = report {
        write_report(&sweep, &path)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}
