//! NYC 311 × NOAA ISD hourly join
//!
//! A Rust library for joining NYC 311 noise complaints to station weather on a
//! time-zone-correct canonical hour.
//!
//! This library provides tools for:
//! - Decoding NOAA ISD mandatory fields with their missing-value sentinels
//! - Normalizing timestamps from a declared source zone to local civil time
//! - Aggregating station observations to one row per local hour
//! - Left-joining complaints to hourly weather without losing or duplicating rows
//! - Checking hour uniqueness, row conservation, year bounds and coverage
//! - Building the day-part by temperature-bin series for the report

pub mod aggregate;
pub mod config;
pub mod constants;
pub mod error;
pub mod ingest;
pub mod invariants;
pub mod isd;
pub mod join;
pub mod models;
pub mod normalize;
pub mod output;
pub mod processor;
pub mod report;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use models::{DayPart, HourlyWeather, JoinedRecord, SourceZone, WeatherFormat};
pub use processor::JoinProcessor;
