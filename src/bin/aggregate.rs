//! Aggregate raw transactions into per-store daily totals
//!
//! Usage:
//!   cargo run --release --bin aggregate -- train-2023-08-31.csv
//!
//! Reads data/<file> and writes the same name with a .parquet extension.

use clap::Parser;
use sales_forecast::cli::{self, DirArgs};
use sales_forecast::{aggregate, telemetry};
use std::process::ExitCode;
use tracing::error;

const STAGE: &str = "aggregate";
const USAGE: &str = "aggregate <raw-csv-filename>";

#[derive(Parser, Debug)]
#[command(name = "aggregate")]
#[command(about = "Group raw transactions by store and day and sum their prices")]
struct Args {
    /// Raw transaction CSV, relative to the data directory
    file_name: String,

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

    match aggregate::run(&args.dirs.paths(), &args.file_name) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(kind = e.kind(), "Error processing data: {}", e);
            ExitCode::FAILURE
        }
    }
}
