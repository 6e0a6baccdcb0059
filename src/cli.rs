//! Command-line plumbing shared by the stage binaries

use crate::config::Paths;
use clap::{Args, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

/// Directory overrides accepted by every stage
#[derive(Args, Debug, Clone)]
pub struct DirArgs {
    /// Directory holding generated, aggregated and predicted tables
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory holding trained model artifacts
    #[arg(long, default_value = "models")]
    pub models_dir: PathBuf,

    /// Directory for the per-stage log files
    #[arg(long, default_value = "data/logs")]
    pub log_dir: PathBuf,
}

impl DirArgs {
    pub fn paths(&self) -> Paths {
        Paths {
            data_dir: self.data_dir.clone(),
            models_dir: self.models_dir.clone(),
            log_dir: self.log_dir.clone(),
        }
    }
}

/// Exit status for a failed parse: 0 for `--help`/`--version`, 1 for a usage error
pub fn exit_status(e: &clap::Error) -> u8 {
    if e.use_stderr() {
        1
    } else {
        0
    }
}

/// Parse arguments. Usage errors are logged to the stage's default log
/// (directory overrides are not known yet) and turn into exit code 1.
/// `--help` and `--version` print and exit 0 as usual.
pub fn parse_or_exit<T: Parser>(stage: &str, usage: &str) -> Result<T, ExitCode> {
    let e = match T::try_parse() {
        Ok(args) => return Ok(args),
        Err(e) => e,
    };
    let status = exit_status(&e);

    if status == 0 {
        if e.print().is_err() {
            eprintln!("{}", e);
        }
        return Err(ExitCode::from(status));
    }

    match crate::telemetry::init(stage, &Paths::default().log_dir) {
        Ok(()) => {
            tracing::error!("Invalid arguments: {}", e.to_string().trim());
            tracing::error!("USAGE: {}", usage);
        }
        Err(log_err) => {
            eprintln!("Invalid arguments: {}", e.to_string().trim());
            eprintln!("USAGE: {}", usage);
            eprintln!("logging unavailable: {}", log_err);
        }
    }
    Err(ExitCode::from(status))
}
