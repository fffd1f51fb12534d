//! Application constants for the complaint/weather join
//!
//! Column names, ISD sentinel codes and default values shared by the
//! ingestors, the processor and the reporting layer.

// =============================================================================
// Time Contract
// =============================================================================

/// Civil time zone every timestamp is normalized to
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Calendar year the analysis covers (local time)
pub const DEFAULT_REPORT_YEAR: i32 = 2023;

/// Format used for every persisted timestamp (naive local, no zone marker)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// NOAA ISD Encoding
// =============================================================================

/// Missing-value sentinel codes used by ISD mandatory data fields
pub mod sentinels {
    /// Air temperature (TMP), tenths of a degree Celsius
    pub const AIR_TEMPERATURE: i64 = 9999;

    /// Dew point temperature (DEW), tenths of a degree Celsius
    pub const DEW_POINT: i64 = 9999;

    /// Sea level pressure (SLP), tenths of a hectopascal
    pub const SEA_LEVEL_PRESSURE: i64 = 99999;
}

/// ISD stores measurements as integers scaled by ten
pub const ISD_SCALE: f64 = 10.0;

/// Raw ISD export columns
pub mod isd_columns {
    pub const STATION: &str = "STATION";
    pub const AIR_TEMPERATURE: &str = "TMP";
    pub const DEW_POINT: &str = "DEW";
    pub const SEA_LEVEL_PRESSURE: &str = "SLP";
}

/// Case-insensitive names accepted for the ISD observation time column
pub const ISD_TIME_COLUMN_PATTERN: &str = r"(?i)^date(_?time)?$";

/// Pre-decoded ("clean") weather export columns
pub mod clean_columns {
    pub const DATETIME: &str = "datetime";
    pub const STATION: &str = "station_id";
}

// =============================================================================
// Derived Tables
// =============================================================================

/// Measurement column names shared by the hourly, joined and canonical tables
pub mod measurement_columns {
    pub const AIR_TEMPERATURE: &str = "air_temp_c";
    pub const DEW_POINT: &str = "dew_point_c";
    pub const SEA_LEVEL_PRESSURE: &str = "sea_level_pressure_hpa";
}

/// Canonical hour column of the hourly weather table
pub const HOUR_COLUMN: &str = "hour";

/// Number of raw observations behind each hourly row
pub const OBSERVATION_COUNT_COLUMN: &str = "observation_count";

/// Complaint export columns (first match wins)
pub mod complaint_columns {
    pub const ID_CANDIDATES: &[&str] = &["unique_key", "complaint_id"];
    pub const CREATED_CANDIDATES: &[&str] = &["created_date", "created_at"];
    pub const COMPLAINT_TYPE: &str = "complaint_type";
    pub const DESCRIPTOR: &str = "descriptor";
    pub const LOCATION_TYPE: &str = "location_type";
    pub const INCIDENT_ZIP: &str = "incident_zip";
    pub const BOROUGH: &str = "borough";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
}

/// Columns of the canonical file consumed by the reporting layer
pub mod canonical_columns {
    pub const COMPLAINT_ID: &str = "complaint_id";
    pub const CREATED_AT: &str = "created_at";
    pub const CREATED_HOUR: &str = "created_hour";
    pub const TEMPERATURE: &str = "temperature_c";

    /// Columns the reporting layer refuses to render without
    pub const REQUIRED: &[&str] = &[CREATED_HOUR, TEMPERATURE, COMPLAINT_ID];
}

// =============================================================================
// Defaults
// =============================================================================

/// Default location of data files relative to the working directory
pub const DEFAULT_DATA_DIR: &str = "data";

pub const DEFAULT_WEATHER_INPUT: &str = "74486094789.csv";
pub const DEFAULT_COMPLAINTS_INPUT: &str = "nyc311_noise_residential_brooklyn_2023.csv";
pub const DEFAULT_HOURLY_OUTPUT: &str = "weather_kjfk_hourly_2023.csv";
pub const DEFAULT_JOINED_OUTPUT: &str = "nyc311_noise_brooklyn_2023_with_weather.csv";
pub const DEFAULT_CANONICAL_OUTPUT: &str = "nyc311_noise_brooklyn_2023_with_weather_canonical.csv";

/// Suffix appended to the canonical file name for the provenance sidecar
pub const CONTRACT_SUFFIX: &str = "contract.json";

/// Maximum tolerated share of joined rows without a temperature, in percent
pub const DEFAULT_MAX_MISSING_PCT: f64 = 10.0;

/// Temperature bucket width for the report, in degrees Celsius
pub const DEFAULT_BIN_WIDTH_C: u32 = 3;

/// Bucket widths offered by the report
pub const ALLOWED_BIN_WIDTHS_C: &[u32] = &[2, 3, 4, 5];

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "NYC311_WEATHER_";

/// Application name used for the config directory and log filter
pub const APP_NAME: &str = "nyc311-weather";
pub const LOG_TARGET: &str = "nyc311_weather";
