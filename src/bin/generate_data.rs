//! Synthetic retail data generator
//!
//! Writes raw transactions (`train`) or prediction registers (`predict`) for
//! every configured store and every day of an inclusive date range.
//!
//! Usage:
//!   cargo run --release --bin generate_data -- 2023 8 1 2023 8 31 train
//!
//! Output:
//!   data/train-<end-date>.csv or data/predict-<end-date>.parquet

use clap::Parser;
use sales_forecast::cli::{self, DirArgs};
use sales_forecast::generator::{self, Mode};
use sales_forecast::{telemetry, PipelineConfig, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

const STAGE: &str = "generate_data";
const USAGE: &str = "generate_data <year_from> <month_from> <day_from> \
                     <year_to> <month_to> <day_to> <train|predict>";

/// Synthetic sales data for the forecasting pipeline
#[derive(Parser, Debug)]
#[command(name = "generate_data")]
#[command(about = "Generate synthetic store transactions or prediction registers")]
struct Args {
    year_from: i32,
    month_from: u32,
    day_from: u32,
    year_to: i32,
    month_to: u32,
    day_to: u32,

    /// What to generate
    #[arg(value_enum)]
    mode: Mode,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    dirs: DirArgs,
}

fn run(args: &Args) -> Result<PathBuf> {
    let from = generator::parse_date(args.year_from, args.month_from, args.day_from)?;
    let to = generator::parse_date(args.year_to, args.month_to, args.day_to)?;
    let config = PipelineConfig::default();
    generator::run(&config, &args.dirs.paths(), from, to, args.mode, args.seed)
}

fn main() -> ExitCode {
    let args: Args = match cli::parse_or_exit(STAGE, USAGE) {
        Ok(args) => args,
        Err(code) => return code,
    };
    if let Err(e) = telemetry::init(STAGE, &args.dirs.log_dir) {
        eprintln!("logging unavailable: {}", e);
    }

    match run(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(kind = e.kind(), "{}", e);
            ExitCode::FAILURE
        }
    }
}
