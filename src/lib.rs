//! Batch sales forecasting pipeline
//!
//! Four one-shot stages share files on disk:
//! generate synthetic transactions, aggregate them into daily store totals,
//! train a random forest on the totals, and predict totals for new registers.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod models;
pub mod naming;
pub mod prediction;
pub mod table;
pub mod telemetry;
pub mod training;

pub use config::{Paths, PipelineConfig};
pub use error::{PipelineError, Result};
