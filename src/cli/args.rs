//! Command-line argument definitions for the nyc311-weather pipeline
//!
//! Global flags select the config file and verbosity. Each pipeline subcommand
//! accepts the same overrides, applied on top of the layered configuration.

use crate::config::PipelineConfig;
use crate::models::{SourceZone, WeatherFormat};
use crate::report::ReportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the complaint/weather join
///
/// Prepares hourly station weather, joins NYC 311 noise complaints to it on a
/// time-zone-correct local hour, validates the result and reports the
/// day-part by temperature series.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "nyc311-weather",
    version,
    about = "Join NYC 311 noise complaints with NOAA ISD weather on a time-zone-correct hour",
    long_about = "Normalizes 311 complaint timestamps and NOAA ISD station observations to local \
                  civil time in one declared zone, aggregates weather to one row per local hour, \
                  left-joins complaints onto it and refuses to write a canonical table unless \
                  hour uniqueness, row conservation and the coverage bound all hold."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    ///
    /// TOML configuration file. If not specified, looks for
    /// ~/.config/nyc311-weather/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Raw weather export -> hourly weather table
    Weather(PipelineArgs),
    /// Complaints + hourly table -> joined and canonical tables
    Join(PipelineArgs),
    /// Weather and join stages in one invocation
    Run(PipelineArgs),
    /// Day-part by temperature series from the canonical table
    Report(ReportArgs),
    /// Check both inputs line up in time without writing anything
    Inspect(PipelineArgs),
}

/// Overrides shared by the pipeline subcommands
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PipelineArgs {
    /// Raw weather export
    #[arg(long = "weather-input", value_name = "FILE")]
    pub weather_input: Option<PathBuf>,

    /// 311 complaint export
    #[arg(long = "complaints-input", value_name = "FILE")]
    pub complaints_input: Option<PathBuf>,

    /// Hourly weather table (written by `weather`, read by `join`)
    #[arg(long = "hourly", value_name = "FILE")]
    pub hourly_output: Option<PathBuf>,

    #[arg(long = "joined-output", value_name = "FILE")]
    pub joined_output: Option<PathBuf>,

    #[arg(long = "canonical-output", value_name = "FILE")]
    pub canonical_output: Option<PathBuf>,

    /// IANA zone to normalize to (e.g. America/New_York)
    #[arg(long = "timezone", value_name = "ZONE")]
    pub timezone: Option<String>,

    /// Local calendar year to keep
    #[arg(long = "year")]
    pub year: Option<i32>,

    /// Station to keep from a multi-station weather file
    #[arg(long = "station", value_name = "ID")]
    pub station_id: Option<String>,

    #[arg(long = "weather-format", value_enum)]
    pub weather_format: Option<WeatherFormat>,

    /// Zone the weather timestamps are recorded in
    #[arg(long = "weather-zone", value_enum)]
    pub weather_zone: Option<SourceZone>,

    /// Zone the complaint timestamps are recorded in
    #[arg(long = "complaint-zone", value_enum)]
    pub complaint_zone: Option<SourceZone>,

    /// Largest tolerated share of complaints without a temperature (percent)
    #[arg(long = "max-missing-pct", value_name = "PCT")]
    pub max_missing_pct: Option<f64>,
}

/// Arguments for the report command
#[derive(Debug, Clone, Parser)]
pub struct ReportArgs {
    /// Canonical table to read (defaults to the configured canonical output)
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Temperature bin width in °C (2, 3, 4 or 5)
    #[arg(short = 'b', long = "bin-width", value_name = "C")]
    pub bin_width: Option<u32>,

    #[arg(short = 'f', long = "format", value_enum, default_value = "human")]
    pub format: ReportFormat,
}

impl Args {
    /// Log level implied by `--quiet` and the `-v` count
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl PipelineArgs {
    /// Layer command-line overrides on top of `config`
    pub fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(path) = &self.weather_input {
            config = config.with_weather_input(path);
        }
        if let Some(path) = &self.complaints_input {
            config = config.with_complaints_input(path);
        }
        if let Some(path) = &self.hourly_output {
            config = config.with_hourly_output(path);
        }
        if let Some(path) = &self.joined_output {
            config = config.with_joined_output(path);
        }
        if let Some(path) = &self.canonical_output {
            config = config.with_canonical_output(path);
        }
        if let Some(timezone) = &self.timezone {
            config = config.with_timezone(timezone.clone());
        }
        if let Some(year) = self.year {
            config = config.with_year(year);
        }
        if let Some(station) = &self.station_id {
            config = config.with_station(station.clone());
        }
        if let Some(format) = self.weather_format {
            config = config.with_weather_format(format);
        }
        if let Some(zone) = self.weather_zone {
            config = config.with_weather_zone(zone);
        }
        if let Some(zone) = self.complaint_zone {
            config = config.with_complaint_zone(zone);
        }
        if let Some(pct) = self.max_missing_pct {
            config = config.with_max_missing_pct(pct);
        }
        config
    }
}
