//! Error handling for erosivity processing operations.
//!
//! Structural problems with the inputs (missing files, missing columns,
//! unparseable timestamps) are fatal. Per-station data-quality issues such
//! as an unknown ecological zone are not errors at all: they surface as
//! missing values in the output table.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ErosivityError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Unparseable timestamp '{value}' in {path} (row {row})")]
    InvalidTimestamp {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("Malformed input in {path}: {reason}")]
    MalformedInput { path: PathBuf, reason: String },

    #[error("Invalid station identifier '{value}'")]
    InvalidStationId { value: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Processing failed for station {station_id}: {reason}")]
    StationFailed { station_id: i64, reason: String },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ErosivityError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_column(path: impl Into<PathBuf>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            path: path.into(),
            column: column.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ErosivityError>;
