//! Predict total sales for prediction registers
//!
//! Usage:
//!   cargo run --release --bin predict -- \
//!     models/model-2023-08-31.bin data/predict-2023-09-07.parquet
//!
//! Writes data/predict-done-<name>.parquet: the input table plus a
//! `prediction_total_sales` column.

use clap::Parser;
use sales_forecast::cli::{self, DirArgs};
use sales_forecast::{prediction, telemetry, PipelineError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

const STAGE: &str = "predict";
const USAGE: &str = "predict <path to model> <path to data>";

#[derive(Parser, Debug)]
#[command(name = "predict")]
#[command(about = "Apply a trained model to prediction registers")]
struct Args {
    /// Model artifact written by `train`
    model_path: PathBuf,

    /// Prediction registers (.parquet or .csv)
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

    match prediction::run(&args.dirs.paths(), &args.model_path, &args.data_path) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e @ PipelineError::InputNotFound { .. }) => {
            error!(kind = e.kind(), "File not found: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(kind = e.kind(), "An error occurred: {}", e);
            ExitCode::FAILURE
        }
    }
}
