//! Command-line utilities for ForgeBench
//!
//! The benchmark run itself is driven through the library API, since the
//! decode engine is a capability supplied by the caller. This binary covers
//! the engine-free paths: dataset inspection and configuration validation.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use forgebench::config::BenchConfig;
use forgebench::dataset::Dataset;

#[derive(Parser, Debug)]
#[command(name = "forgebench", version)]
#[command(about = "Offline benchmark harness for continuous-batched decode engines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print descriptive statistics for a benchmark dataset file
    DatasetStats {
        /// Path to the dataset JSON file
        #[arg(long)]
        file: PathBuf,
    },
    /// Validate a benchmark configuration without touching an engine
    Check {
        /// Path to the dataset JSON file
        #[arg(long)]
        file: PathBuf,
        /// Padded prompt length
        #[arg(long, default_value_t = 1024)]
        max_prefill_predict_length: usize,
        /// Total sequence length
        #[arg(long, default_value_t = 2048)]
        max_target_length: usize,
        /// Number of warmup windows
        #[arg(long, default_value_t = 2)]
        warmup_windows: usize,
        /// Number of profiled windows
        #[arg(long, default_value_t = 0)]
        profile_windows: usize,
        /// Rows per window (defaults to the engine's slot count at run time)
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    forgebench::logging::init_from_env();
    let cli = Cli::parse();
    match cli.command {
        Commands::DatasetStats { file } => {
            let dataset = Dataset::load(&file)?;
            println!("Stats for dataset in file: {}", file.display());
            println!("{}", dataset.summary());
        }
        Commands::Check {
            file,
            max_prefill_predict_length,
            max_target_length,
            warmup_windows,
            profile_windows,
            batch_size,
        } => {
            let mut config = BenchConfig::new(file.clone())
                .with_max_prefill_predict_length(max_prefill_predict_length)
                .with_max_target_length(max_target_length)
                .with_warmup_windows(warmup_windows)
                .with_profile_windows(profile_windows);
            if let Some(batch_size) = batch_size {
                config = config.with_batch_size(batch_size);
            }
            config.validate()?;
            let dataset = Dataset::load(&file)?;
            println!(
                "ok: {} requests, {} decode steps per window",
                dataset.len(),
                config.decode_steps()
            );
        }
    }
    Ok(())
}
