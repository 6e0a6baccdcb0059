//! Error type shared by every pipeline stage

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single stage invocation. None of these are retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad arguments or configuration
    #[error("usage error: {0}")]
    Usage(String),

    #[error("input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// Input table is missing an expected column or holds unusable values
    #[error("data format is invalid: {0}")]
    Schema(String),

    #[error("model artifact is corrupt: {0}")]
    ModelCorrupt(String),

    /// The regression library rejected a fit or predict call
    #[error("regression model failed: {0}")]
    Estimator(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl PipelineError {
    pub fn missing_column(column: &str) -> Self {
        PipelineError::Schema(format!("missing column `{}`", column))
    }

    /// Short machine-friendly kind, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Usage(_) => "usage",
            PipelineError::InputNotFound { .. } => "input_not_found",
            PipelineError::Schema(_) => "schema",
            PipelineError::ModelCorrupt(_) => "model_corrupt",
            PipelineError::Estimator(_) => "estimator",
            PipelineError::Io(_) => "io",
            PipelineError::Csv(_) => "csv",
            PipelineError::Arrow(_) => "arrow",
            PipelineError::Parquet(_) => "parquet",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
