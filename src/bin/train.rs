//! Train the daily sales regressor
//!
//! Usage:
//!   cargo run --release --bin train -- data/train-2023-08-31.parquet
//!
//! Accepts Parquet or CSV with a `total_sales` column; every other column is a
//! feature. Writes models/model-<name>.bin.

use clap::Parser;
use sales_forecast::cli::{self, DirArgs};
use sales_forecast::{telemetry, training, PipelineConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

const STAGE: &str = "train";
const USAGE: &str = "train <path to training data>";

#[derive(Parser, Debug)]
#[command(name = "train")]
#[command(about = "Fit a random forest on aggregated daily sales")]
struct Args {
    /// Aggregated sales table (.parquet or .csv)
    data_path: PathBuf,

    #[command(flatten)]
    dirs: DirArgs,
}

fn main() -> ExitCode {
    let args: Args = match cli::parse_or_exit(STAGE, USAGE) {
        Ok(args) => args,
        Err(code) => return code,
    };
    if let Err(e) = telemetry::init(STAGE, &args.dirs.log_dir) {
        eprintln!("logging unavailable: {}", e);
    }

    let config = PipelineConfig::default();
    match training::run(&args.dirs.paths(), &config.forest, &args.data_path) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(kind = e.kind(), "{}", e);
            ExitCode::FAILURE
        }
    }
}
