//! Configuration management and validation.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `NYC311_WEATHER_*` environment variables, then command-line overrides.
//! Weather and complaints each declare their own source zone.

use crate::constants::{
    ALLOWED_BIN_WIDTHS_C, APP_NAME, DEFAULT_BIN_WIDTH_C, DEFAULT_CANONICAL_OUTPUT,
    DEFAULT_COMPLAINTS_INPUT, DEFAULT_DATA_DIR, DEFAULT_HOURLY_OUTPUT, DEFAULT_JOINED_OUTPUT,
    DEFAULT_MAX_MISSING_PCT, DEFAULT_REPORT_YEAR, DEFAULT_TIMEZONE, DEFAULT_WEATHER_INPUT,
    ENV_PREFIX,
};
use crate::error::{PipelineError, Result};
use crate::models::{SourceZone, WeatherFormat};
use chrono_tz::Tz;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathConfig {
    pub weather_input: PathBuf,
    pub complaints_input: PathBuf,
    pub hourly_output: PathBuf,
    pub joined_output: PathBuf,
    pub canonical_output: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        let data = Path::new(DEFAULT_DATA_DIR);
        Self {
            weather_input: data.join(DEFAULT_WEATHER_INPUT),
            complaints_input: data.join(DEFAULT_COMPLAINTS_INPUT),
            hourly_output: data.join(DEFAULT_HOURLY_OUTPUT),
            joined_output: data.join(DEFAULT_JOINED_OUTPUT),
            canonical_output: data.join(DEFAULT_CANONICAL_OUTPUT),
        }
    }
}

/// Main configuration for a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// IANA zone every timestamp is normalized to
    pub timezone: String,

    /// Local calendar year the hourly table is restricted to
    pub year: i32,

    /// Station to keep from a multi-station weather file
    pub station_id: Option<String>,

    pub weather_format: WeatherFormat,

    /// Zone the weather timestamps are recorded in
    pub weather_zone: SourceZone,

    /// Zone the complaint timestamps are recorded in
    pub complaint_zone: SourceZone,

    /// Largest tolerated share of joined rows without a temperature (percent)
    pub max_missing_pct: f64,

    /// Temperature bin width for the report (°C)
    pub bin_width_c: u32,

    pub paths: PathConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            year: DEFAULT_REPORT_YEAR,
            station_id: None,
            weather_format: WeatherFormat::Isd,
            weather_zone: SourceZone::Utc,
            complaint_zone: SourceZone::LocalNaive,
            max_missing_pct: DEFAULT_MAX_MISSING_PCT,
            bin_width_c: DEFAULT_BIN_WIDTH_C,
            paths: PathConfig::default(),
        }
    }
}

/// `$XDG_CONFIG_HOME/nyc311-weather/config.toml` (or the platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
}

impl PipelineConfig {
    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| PipelineError::configuration(format!("invalid config file: {e}")))
    }

    /// Read a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::configuration(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Defaults, then the config file, then the process environment
    ///
    /// An explicit `path` must exist; the default location is only used when
    /// present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply `NYC311_WEATHER_*` overrides looked up through `lookup`
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((_, value)) = var("TIMEZONE") {
            self.timezone = value;
        }
        if let Some((key, value)) = var("YEAR") {
            self.year = parse_env(&key, &value)?;
        }
        if let Some((_, value)) = var("STATION_ID") {
            self.station_id = Some(value).filter(|v| !v.trim().is_empty());
        }
        if let Some((key, value)) = var("WEATHER_FORMAT") {
            self.weather_format = parse_enum(&key, &value)?;
        }
        if let Some((key, value)) = var("WEATHER_ZONE") {
            self.weather_zone = parse_enum(&key, &value)?;
        }
        if let Some((key, value)) = var("COMPLAINT_ZONE") {
            self.complaint_zone = parse_enum(&key, &value)?;
        }
        if let Some((key, value)) = var("MAX_MISSING_PCT") {
            self.max_missing_pct = parse_env(&key, &value)?;
        }
        if let Some((key, value)) = var("BIN_WIDTH_C") {
            self.bin_width_c = parse_env(&key, &value)?;
        }
        if let Some((_, value)) = var("WEATHER_INPUT") {
            self.paths.weather_input = value.into();
        }
        if let Some((_, value)) = var("COMPLAINTS_INPUT") {
            self.paths.complaints_input = value.into();
        }
        if let Some((_, value)) = var("HOURLY_OUTPUT") {
            self.paths.hourly_output = value.into();
        }
        if let Some((_, value)) = var("JOINED_OUTPUT") {
            self.paths.joined_output = value.into();
        }
        if let Some((_, value)) = var("CANONICAL_OUTPUT") {
            self.paths.canonical_output = value.into();
        }
        Ok(self)
    }

    /// Resolved target time zone
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|_| {
            PipelineError::configuration(format!("unknown time zone '{}'", self.timezone))
        })
    }

    /// Check the settings are usable before any file is touched
    pub fn validate(&self) -> Result<()> {
        self.tz()?;

        if !(1900..=2100).contains(&self.year) {
            return Err(PipelineError::configuration(format!(
                "year {} is out of range",
                self.year
            )));
        }
        if !(0.0..=100.0).contains(&self.max_missing_pct) {
            return Err(PipelineError::configuration(format!(
                "max_missing_pct must be between 0 and 100, got {}",
                self.max_missing_pct
            )));
        }
        if !ALLOWED_BIN_WIDTHS_C.contains(&self.bin_width_c) {
            return Err(PipelineError::configuration(format!(
                "bin_width_c must be one of {ALLOWED_BIN_WIDTHS_C:?}, got {}",
                self.bin_width_c
            )));
        }
        if self.station_id.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(PipelineError::configuration("station_id must not be empty"));
        }
        Ok(())
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn with_station(mut self, station_id: impl Into<String>) -> Self {
        self.station_id = Some(station_id.into());
        self
    }

    pub fn with_weather_format(mut self, format: WeatherFormat) -> Self {
        self.weather_format = format;
        self
    }

    pub fn with_weather_zone(mut self, zone: SourceZone) -> Self {
        self.weather_zone = zone;
        self
    }

    pub fn with_complaint_zone(mut self, zone: SourceZone) -> Self {
        self.complaint_zone = zone;
        self
    }

    pub fn with_max_missing_pct(mut self, pct: f64) -> Self {
        self.max_missing_pct = pct;
        self
    }

    pub fn with_bin_width(mut self, width: u32) -> Self {
        self.bin_width_c = width;
        self
    }

    pub fn with_weather_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.weather_input = path.into();
        self
    }

    pub fn with_complaints_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.complaints_input = path.into();
        self
    }

    pub fn with_hourly_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.hourly_output = path.into();
        self
    }

    pub fn with_joined_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.joined_output = path.into();
        self
    }

    pub fn with_canonical_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.canonical_output = path.into();
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PipelineError::configuration(format!("invalid value for {key}: '{value}'")))
}

fn parse_enum<T: ValueEnum>(key: &str, value: &str) -> Result<T> {
    T::from_str(value.trim(), true)
        .map_err(|_| PipelineError::configuration(format!("invalid value for {key}: '{value}'")))
}
