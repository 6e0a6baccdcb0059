//! Logging setup for the stage binaries
//!
//! Each stage appends to its own `<log_dir>/<stage>.log` and mirrors to stderr.
//! Library code only emits `tracing` events; without a subscriber they go nowhere.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::{self, time::FormatTime};
use tracing_subscriber::{prelude::*, EnvFilter};

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%y-%m-%d %H:%M"))
    }
}

pub fn log_path(log_dir: &Path, stage: &str) -> PathBuf {
    log_dir.join(format!("{}.log", stage))
}

/// Open `<log_dir>/<stage>.log` for appending, creating the directory if needed
pub fn open_log_file(log_dir: &Path, stage: &str) -> io::Result<File> {
    fs::create_dir_all(log_dir)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path(log_dir, stage))
}

/// Install the global subscriber. Falls back to stderr only when the log file
/// cannot be opened.
pub fn init(stage: &str, log_dir: &Path) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file, file_error) = match open_log_file(log_dir, stage) {
        Ok(file) => (Some(file), None),
        Err(e) => (None, Some(e)),
    };

    let file_layer = file.map(|file| {
        fmt::layer()
            .with_timer(LocalTimer)
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_writer(Mutex::new(file))
    });

    let stderr_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_target(true)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    if let Some(e) = file_error {
        tracing::warn!(
            path = %log_path(log_dir, stage).display(),
            error = %e,
            "File logging disabled"
        );
    }

    Ok(())
}
