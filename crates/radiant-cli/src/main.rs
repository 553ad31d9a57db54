use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use radiant_core::parallel::with_thread_count;

mod commands;

use commands::{cmd_assess, cmd_compress, cmd_enhance, cmd_presets, cmd_sweep, EnhanceArgs};

#[derive(Parser)]
#[command(name = "radiant")]
#[command(version, about = "Radiograph detail enhancement and display windowing", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Number of worker threads (defaults to all cores)
    #[arg(short = 'j', long, value_name = "N", global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enhance 16-bit radiograph(s) and export results
    Enhance {
        /// Input file or directory
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output directory (defaults to the input's directory)
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Detail amplification (typical range 3-10)
        #[arg(short, long, value_name = "FLOAT")]
        strength: Option<f32>,

        /// Scale levels (clamped to 2-5)
        #[arg(short, long, value_name = "N")]
        levels: Option<u32>,

        /// Input is raw modality data with inverted polarity
        #[arg(long)]
        invert: bool,

        /// Windowing preset: fast, optimal or high-quality
        #[arg(short, long, value_name = "NAME")]
        preset: Option<String>,

        /// Pipeline config file (radiant.yml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Scan directories recursively
        #[arg(short, long)]
        recursive: bool,

        /// Skip the 8-bit display renditions
        #[arg(long)]
        no_display: bool,

        /// Write a JSON metrics report
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Abort remaining images after the first failure
        #[arg(long)]
        fail_fast: bool,

        /// Only print output paths
        #[arg(long)]
        silent: bool,
    },

    /// Compress a 16-bit image to an 8-bit display PNG
    Compress {
        /// Input file
        input: PathBuf,

        /// Output PNG (defaults to <stem>_display.png)
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Windowing preset: fast, optimal or high-quality
        #[arg(short, long, value_name = "NAME")]
        preset: Option<String>,

        /// Pipeline config file (radiant.yml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Input is raw modality data with inverted polarity
        #[arg(long)]
        invert: bool,
    },

    /// Compare two 16-bit images (PSNR, SSIM, spatial frequency)
    Assess {
        /// Reference image
        original: PathBuf,

        /// Processed image
        processed: PathBuf,

        /// Print metrics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Enhance one image over a grid of settings and compare metrics
    Sweep {
        /// Input file
        input: PathBuf,

        /// Strengths to try (comma-separated)
        #[arg(long, value_name = "LIST", value_delimiter = ',', default_value = "3,5,7")]
        strengths: Vec<f32>,

        /// Level counts to try (comma-separated)
        #[arg(long, value_name = "LIST", value_delimiter = ',', default_value = "2,3,4")]
        levels: Vec<u32>,

        /// Input is raw modality data with inverted polarity
        #[arg(long)]
        invert: bool,

        /// Pipeline config file (radiant.yml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write a JSON sweep report
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Print windowing presets as YAML
    Presets {
        /// Show a single preset
        name: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Enhance {
            input,
            out,
            strength,
            levels,
            invert,
            preset,
            config,
            recursive,
            no_display,
            report,
            fail_fast,
            silent,
        } => cmd_enhance(EnhanceArgs {
            input,
            out,
            strength,
            levels,
            invert,
            preset,
            config,
            recursive,
            no_display,
            report,
            fail_fast,
            silent,
        }),
        Commands::Compress {
            input,
            out,
            preset,
            config,
            invert,
        } => cmd_compress(input, out, preset, config, invert),
        Commands::Assess {
            original,
            processed,
            json,
        } => cmd_assess(original, processed, json),
        Commands::Sweep {
            input,
            strengths,
            levels,
            invert,
            config,
            report,
        } => cmd_sweep(input, strengths, levels, invert, config, report),
        Commands::Presets { name } => cmd_presets(name),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.threads {
        Some(threads) => with_thread_count(threads, || run(cli.command))
            .map_err(anyhow::Error::from)
            .and_then(|result| result),
        None => run(cli.command),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
