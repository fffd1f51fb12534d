//! Pipeline orchestration.
//!
//! Runs the weather and join stages in order: ingest, normalize, aggregate,
//! join, check, and only then persist. Any failed gate returns before a file is
//! written, so a broken run never leaves a half-updated canonical table behind.

pub mod inspect;

#[cfg(test)]
pub mod tests;

pub use self::inspect::{Inspection, SourceSummary, TimeRange};

use crate::aggregate::aggregate_hourly;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::ingest::{read_complaints, read_hourly, read_weather};
use crate::invariants::{validate_hourly, validate_joined};
use crate::join::join_hourly;
use crate::models::{HourlyWeather, JoinStats, JoinedRecord, ProcessingStats, WeatherStats};
use crate::output::{RunContract, TableWriter, contract_path};

use chrono_tz::Tz;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Hourly weather prepared in memory, not yet written
#[derive(Debug, Clone)]
pub struct PreparedWeather {
    pub hours: Vec<HourlyWeather>,
    pub station_id: String,
    pub stats: WeatherStats,
}

/// Joined rows that passed every check, with the provenance to persist
#[derive(Debug, Clone)]
pub struct PreparedJoin {
    pub joined: Vec<JoinedRecord>,
    pub stats: JoinStats,
    pub contract: RunContract,
}

/// Main processor for the complaint/weather join
#[derive(Debug)]
pub struct JoinProcessor {
    config: PipelineConfig,
    tz: Tz,
    show_progress: bool,
}

impl JoinProcessor {
    /// Create a processor; the configuration is validated up front
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let tz = config.tz()?;
        Ok(Self {
            config,
            tz,
            show_progress: true,
        })
    }

    /// Show or hide the per-stage spinners
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ingest, normalize and aggregate the raw weather export
    pub fn prepare_weather(&self) -> Result<PreparedWeather> {
        let config = &self.config;
        let ingest = self.stage("Reading weather observations", || {
            read_weather(
                &config.paths.weather_input,
                config.weather_format,
                config.station_id.as_deref(),
                config.weather_zone,
                self.tz,
            )
        })?;

        let aggregation = self.stage("Aggregating to local hours", || {
            Ok(aggregate_hourly(&ingest.observations, config.year))
        })?;
        validate_hourly(&aggregation.hours, config.year)?;

        let stats = WeatherStats {
            out_of_year: aggregation.out_of_year,
            hours: aggregation.hours.len(),
            temperature_missing_hours: aggregation.temperature_missing(),
            ..ingest.stats
        };
        debug!("Weather stats: {:?}", stats);

        Ok(PreparedWeather {
            hours: aggregation.hours,
            station_id: ingest.station_id,
            stats,
        })
    }

    /// Join complaints onto `hours` and run every check on the result
    pub fn prepare_join(
        &self,
        hours: &[HourlyWeather],
        station_id: Option<String>,
    ) -> Result<PreparedJoin> {
        let config = &self.config;
        let ingest = self.stage("Reading complaints", || {
            read_complaints(&config.paths.complaints_input, config.complaint_zone, self.tz)
        })?;

        let joined = self.stage("Joining on canonical hour", || {
            join_hourly(&ingest.complaints, hours)
        })?;
        let coverage = validate_joined(ingest.complaints.len(), &joined, config.max_missing_pct)?;

        let stats = JoinStats {
            complaints_read: ingest.rows_read,
            unparseable_timestamps: ingest.unparseable_timestamps,
            joined_rows: joined.len(),
            matched_rows: coverage.matched,
        };

        let contract = RunContract {
            timezone: config.timezone.clone(),
            year: config.year,
            station_id: station_id.or_else(|| config.station_id.clone()),
            weather_format: config.weather_format,
            weather_source_zone: config.weather_zone,
            complaint_source_zone: config.complaint_zone,
            complaints_input: config.paths.complaints_input.display().to_string(),
            hourly_input: config.paths.hourly_output.display().to_string(),
            complaints_read: stats.complaints_read,
            unparseable_complaint_timestamps: stats.unparseable_timestamps,
            joined_rows: stats.joined_rows,
            coverage,
            coverage_percent: coverage.to_string(),
        };

        Ok(PreparedJoin {
            joined,
            stats,
            contract,
        })
    }

    /// Raw weather -> hourly table
    pub fn run_weather(&self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        let weather = self.prepare_weather()?;

        let hourly_path = self.config.paths.hourly_output.clone();
        TableWriter::new(&hourly_path).write_hourly(&weather.hours)?;

        Ok(ProcessingStats {
            weather: Some(weather.stats),
            join: None,
            outputs: vec![hourly_path],
            processing_time_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Complaints + persisted hourly table -> joined and canonical tables
    pub fn run_join(&self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        let hours = self.stage("Reading hourly weather", || {
            read_hourly(&self.config.paths.hourly_output)
        })?;
        validate_hourly(&hours, self.config.year)?;
        let prepared = self.prepare_join(&hours, None)?;
        let outputs = self.write_join(&prepared)?;

        Ok(ProcessingStats {
            weather: None,
            join: Some(prepared.stats),
            outputs,
            processing_time_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Both stages; nothing is written unless every check passes
    pub fn run_all(&self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        let weather = self.prepare_weather()?;
        let prepared = self.prepare_join(&weather.hours, Some(weather.station_id.clone()))?;

        let hourly_path = self.config.paths.hourly_output.clone();
        TableWriter::new(&hourly_path).write_hourly(&weather.hours)?;
        let mut outputs = vec![hourly_path];
        outputs.extend(self.write_join(&prepared)?);

        Ok(ProcessingStats {
            weather: Some(weather.stats),
            join: Some(prepared.stats),
            outputs,
            processing_time_ms: start_time.elapsed().as_millis(),
        })
    }

    fn write_join(&self, prepared: &PreparedJoin) -> Result<Vec<PathBuf>> {
        let paths = &self.config.paths;
        TableWriter::new(&paths.joined_output).write_joined(&prepared.joined)?;
        TableWriter::new(&paths.canonical_output).write_canonical(&prepared.joined)?;

        let sidecar = contract_path(&paths.canonical_output);
        TableWriter::new(&sidecar).write_contract(&prepared.contract)?;

        info!(
            "Canonical table written with {} weather coverage",
            prepared.contract.coverage
        );
        Ok(vec![
            paths.joined_output.clone(),
            paths.canonical_output.clone(),
            sidecar,
        ])
    }

    /// Run `work` behind a spinner labelled `message`
    fn stage<T>(&self, message: &str, work: impl FnOnce() -> Result<T>) -> Result<T> {
        let spinner = if self.show_progress {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));

        debug!("Stage started: {}", message);
        let result = work();
        spinner.finish_and_clear();
        result
    }
}
