//! Core data structures for the complaint/weather join.
//!
//! Typed records for each stage of the pipeline, the source-zone declaration
//! every timestamp column must carry, and the run statistics reported at the end.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Time zone a source records its timestamps in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceZone {
    /// Universal time; converted to local civil time per instant
    Utc,
    /// Already local wall-clock time without a zone marker
    #[value(name = "already-local-naive")]
    #[serde(rename = "already-local-naive")]
    LocalNaive,
}

impl fmt::Display for SourceZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceZone::Utc => write!(f, "utc"),
            SourceZone::LocalNaive => write!(f, "already-local-naive"),
        }
    }
}

/// Layout of the weather input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherFormat {
    /// Raw NOAA ISD export with encoded TMP/DEW/SLP fields
    Isd,
    /// Pre-decoded export with numeric measurement columns
    Clean,
}

/// A single 311 complaint as exported by the open-data portal
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComplaintRecord {
    pub complaint_id: String,
    /// Timestamp exactly as found in the export
    pub created_at: String,
    pub complaint_type: Option<String>,
    pub descriptor: Option<String>,
    pub location_type: Option<String>,
    pub incident_zip: Option<String>,
    pub borough: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A complaint whose creation time has been normalized to local civil time
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedComplaint {
    pub record: ComplaintRecord,
    pub created_at: NaiveDateTime,
    pub hour: NaiveDateTime,
}

/// One raw station observation
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherObservation {
    pub station_id: String,
    pub observed_at_utc: DateTime<Utc>,
    /// Local civil time in the analysis zone; the aggregation key
    pub observed_at_local: NaiveDateTime,
    pub air_temp_c: Option<f64>,
    pub dew_point_c: Option<f64>,
    pub sea_level_pressure_hpa: Option<f64>,
}

/// Station weather reduced to one row per canonical local hour
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyWeather {
    pub hour: NaiveDateTime,
    pub air_temp_c: Option<f64>,
    pub dew_point_c: Option<f64>,
    pub sea_level_pressure_hpa: Option<f64>,
    pub observation_count: usize,
}

impl HourlyWeather {
    /// Hour with no measurements, used when reading back a persisted table
    pub fn empty(hour: NaiveDateTime) -> Self {
        Self {
            hour,
            air_temp_c: None,
            dew_point_c: None,
            sea_level_pressure_hpa: None,
            observation_count: 0,
        }
    }
}

/// A complaint left-joined to at most one hourly weather row
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub complaint: ComplaintRecord,
    pub created_at: NaiveDateTime,
    pub hour: NaiveDateTime,
    pub air_temp_c: Option<f64>,
    pub dew_point_c: Option<f64>,
    pub sea_level_pressure_hpa: Option<f64>,
}

impl JoinedRecord {
    pub fn has_weather(&self) -> bool {
        self.air_temp_c.is_some()
    }
}

/// Row of the canonical file as the reporting layer reads it
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub complaint_id: String,
    pub created_hour: NaiveDateTime,
    pub temperature_c: Option<f64>,
}

/// Part of the day a complaint was created in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayPart {
    Day,
    Evening,
    Night,
}

impl DayPart {
    /// All day parts in display order
    pub const ALL: [DayPart; 3] = [DayPart::Day, DayPart::Evening, DayPart::Night];

    /// Day is 08-17, Evening is 18-22, everything else is Night
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            8..=17 => DayPart::Day,
            18..=22 => DayPart::Evening,
            _ => DayPart::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayPart::Day => "Day",
            DayPart::Evening => "Evening",
            DayPart::Night => "Night",
        }
    }
}

impl fmt::Display for DayPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics for a weather preparation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherStats {
    pub rows_read: usize,
    pub unparseable_timestamps: usize,
    /// Local wall-clock times inside a forward DST gap, kept as recorded
    pub skipped_local_times: usize,
    pub missing_station: usize,
    pub other_station: usize,
    pub out_of_year: usize,
    pub hours: usize,
    pub temperature_missing_hours: usize,
}

/// Statistics for a join run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JoinStats {
    pub complaints_read: usize,
    pub unparseable_timestamps: usize,
    pub joined_rows: usize,
    pub matched_rows: usize,
}

/// Paths and counts produced by a pipeline invocation
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub weather: Option<WeatherStats>,
    pub join: Option<JoinStats>,
    pub outputs: Vec<PathBuf>,
    pub processing_time_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_part_boundaries() {
        assert_eq!(DayPart::from_hour(7), DayPart::Night);
        assert_eq!(DayPart::from_hour(8), DayPart::Day);
        assert_eq!(DayPart::from_hour(17), DayPart::Day);
        assert_eq!(DayPart::from_hour(18), DayPart::Evening);
        assert_eq!(DayPart::from_hour(22), DayPart::Evening);
        assert_eq!(DayPart::from_hour(23), DayPart::Night);
        assert_eq!(DayPart::from_hour(0), DayPart::Night);
    }

    #[test]
    fn test_source_zone_serde_names() {
        let json = serde_json::to_string(&SourceZone::LocalNaive).unwrap();
        assert_eq!(json, "\"already-local-naive\"");
        let zone: SourceZone = serde_json::from_str("\"utc\"").unwrap();
        assert_eq!(zone, SourceZone::Utc);
        assert_eq!(SourceZone::LocalNaive.to_string(), "already-local-naive");
    }
}
