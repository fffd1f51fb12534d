//! Error handling for the complaint/weather join pipeline.
//!
//! Every fatal condition names the file, column or invariant involved so the
//! operator can see exactly which gate stopped the run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Missing required column(s) in {path}: {}", .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error(
        "Weather file {path} has no station identity column; a time-only join against it is not safe"
    )]
    MissingStationIdentity { path: PathBuf },

    #[error(
        "Weather file {path} contains {} stations ({}); configure station_id to pick one",
        .stations.len(),
        .stations.join(", ")
    )]
    AmbiguousStation { path: PathBuf, stations: Vec<String> },

    #[error("No valid rows left in {path} after {stage} ({dropped} rows dropped)")]
    NoValidRows {
        path: PathBuf,
        stage: String,
        dropped: usize,
    },

    #[error("Invariant violated [{invariant}]: {details}")]
    InvariantViolation {
        invariant: &'static str,
        details: String,
    },

    #[error("Natural key {column} has {count} missing value(s) in {path}")]
    NaturalKey {
        path: PathBuf,
        column: String,
        count: usize,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    pub(crate) fn invariant(invariant: &'static str, details: impl Into<String>) -> Self {
        Self::InvariantViolation {
            invariant,
            details: details.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Name of the violated invariant, if this is an invariant failure
    pub fn invariant_name(&self) -> Option<&'static str> {
        match self {
            Self::InvariantViolation { invariant, .. } => Some(invariant),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
