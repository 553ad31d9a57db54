use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{bail, Result};
use log::{info, warn};
use rayon::prelude::*;

use radiant_cli::{
    expand_inputs, process_single_image, write_report, BatchReport, FailureRecord, ImageReport,
    ProcessingParams, SUPPORTED_EXTENSIONS,
};
use radiant_core::{CancelFlag, Error};

use super::resolve_config;

/// Options of the `enhance` command.
pub struct EnhanceArgs {
    pub input: PathBuf,
    pub out: Option<PathBuf>,
    pub strength: Option<f32>,
    pub levels: Option<u32>,
    pub invert: bool,
    pub preset: Option<String>,
    pub config: Option<PathBuf>,
    pub recursive: bool,
    pub no_display: bool,
    pub report: Option<PathBuf>,
    pub fail_fast: bool,
    pub silent: bool,
}

pub fn cmd_enhance(args: EnhanceArgs) -> Result<()> {
    let batch_start = Instant::now();

    let config = resolve_config(args.config.as_deref(), args.preset.as_deref(), args.invert)?;
    let mut enhancement = config.enhancement;
    if let Some(strength) = args.strength {
        enhancement.strength = strength;
    }
    if let Some(levels) = args.levels {
        enhancement.scale_levels = levels;
    }
    enhancement.validate()?;

    let params = ProcessingParams {
        enhancement,
        polarity: config.polarity,
        windowing: config.effective_windowing(),
        write_display: !args.no_display,
    };
    if params.write_display {
        params.windowing.validate()?;
    }

    let inputs = expand_inputs(std::slice::from_ref(&args.input), args.recursive)?;
    if inputs.is_empty() {
        bail!(
            "no supported image files found (supported: {})",
            SUPPORTED_EXTENSIONS.join(", ")
        );
    }

    if !args.silent {
        println!(
            "Enhancing {} image(s): strength {}, {} levels, {:?} polarity",
            inputs.len(),
            params.enhancement.strength,
            params.enhancement.effective_levels(),
            params.polarity
        );
    }

    let cancel = CancelFlag::new();
    let processed_count = AtomicUsize::new(0);
    let total_files = inputs.len();

    let results: Vec<Result<ImageReport>> = inputs
        .par_iter()
        .map(|input| {
            let result = process_single_image(input, args.out.as_deref(), &params, &cancel);
            let count = processed_count.fetch_add(1, Ordering::SeqCst) + 1;

            match &result {
                Ok(report) => {
                    if !args.silent {
                        println!(
                            "[{}/{}] {} -> {} (PSNR {:.2} dB, SSIM {:.4}, {:.2}s)",
                            count,
                            total_files,
                            input.display(),
                            report.enhanced_output.display(),
                            report.metrics.psnr,
                            report.metrics.ssim,
                            report.elapsed_secs
                        );
                    } else {
                        println!("{}", report.enhanced_output.display());
                    }
                }
                Err(err) => {
                    warn!("[{}/{}] {}: {:#}", count, total_files, input.display(), err);
                    if args.fail_fast {
                        cancel.cancel();
                    }
                }
            }
            result
        })
        .collect();

    let mut images = Vec::new();
    let mut failures = Vec::new();
    let mut cancelled = 0usize;
    for (input, result) in inputs.iter().zip(results) {
        match result {
            Ok(report) => images.push(report),
            Err(err) => {
                if matches!(err.downcast_ref::<Error>(), Some(Error::Cancelled)) {
                    cancelled += 1;
                }
                failures.push(FailureRecord {
                    input: input.clone(),
                    error: format!("{:#}", err),
                });
            }
        }
    }

    let batch_elapsed = batch_start.elapsed();
    info!("batch finished in {:.2?}", batch_elapsed);

    if !args.silent && total_files > 1 {
        println!("\n========================================");
        println!("ENHANCEMENT COMPLETE");
        println!("========================================");
        println!("  Successful: {}", images.len());
        println!("  Failed:     {}", failures.len() - cancelled);
        if cancelled > 0 {
            println!("  Cancelled:  {}", cancelled);
        }
        println!("  Total time: {:.2}s", batch_elapsed.as_secs_f64());
        if !failures.is_empty() {
            println!("\nErrors:");
            for failure in &failures {
                println!("  {}: {}", failure.input.display(), failure.error);
            }
        }
    }

    let failed = failures.len();
    if let Some(report_path) = &args.report {
        write_report(&BatchReport::new(images, failures), report_path)?;
        if !args.silent {
            println!("Report written to {}", report_path.display());
        }
    }

    if failed == 0 {
        Ok(())
    } else {
        bail!("{} of {} files failed to process", failed, total_files)
    }
}
