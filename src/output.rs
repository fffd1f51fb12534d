//! CSV writers for the hourly, joined and canonical tables
//!
//! Every table is rebuilt from typed records and written in full with the
//! polars CSV writer, overwriting whatever was there. Timestamps are written as
//! naive local time in [`TIMESTAMP_FORMAT`], so the same input always produces
//! byte-identical files.

use crate::constants::{
    CONTRACT_SUFFIX, HOUR_COLUMN, OBSERVATION_COUNT_COLUMN, TIMESTAMP_FORMAT, canonical_columns,
    complaint_columns, measurement_columns,
};
use crate::error::Result;
use crate::invariants::Coverage;
use crate::models::{HourlyWeather, JoinedRecord, SourceZone, WeatherFormat};
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Provenance record written next to the canonical file
///
/// Pins the time contract the canonical table was produced under, so the
/// reporting layer (or a reader) never has to guess the source zones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunContract {
    pub timezone: String,
    pub year: i32,
    pub station_id: Option<String>,
    pub weather_format: WeatherFormat,
    pub weather_source_zone: SourceZone,
    pub complaint_source_zone: SourceZone,
    pub complaints_input: String,
    pub hourly_input: String,
    pub complaints_read: usize,
    pub unparseable_complaint_timestamps: usize,
    pub joined_rows: usize,
    pub coverage: Coverage,
    pub coverage_percent: String,
}

/// Sidecar path for a canonical file, e.g. `out.csv` -> `out.csv.contract.json`
pub fn contract_path(canonical: &Path) -> PathBuf {
    let mut name = canonical.as_os_str().to_os_string();
    name.push(".");
    name.push(CONTRACT_SUFFIX);
    PathBuf::from(name)
}

/// Writes derived tables to a single CSV file
#[derive(Debug, Clone)]
pub struct TableWriter {
    output_path: PathBuf,
}

impl TableWriter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    /// Hourly weather: one row per canonical hour
    pub fn write_hourly(&self, hours: &[HourlyWeather]) -> Result<usize> {
        let frame = DataFrame::new(vec![
            Column::new(
                HOUR_COLUMN.into(),
                hours.iter().map(|h| format_timestamp(h.hour)).collect::<Vec<_>>(),
            ),
            Column::new(
                measurement_columns::AIR_TEMPERATURE.into(),
                hours.iter().map(|h| h.air_temp_c).collect::<Vec<_>>(),
            ),
            Column::new(
                measurement_columns::DEW_POINT.into(),
                hours.iter().map(|h| h.dew_point_c).collect::<Vec<_>>(),
            ),
            Column::new(
                measurement_columns::SEA_LEVEL_PRESSURE.into(),
                hours.iter().map(|h| h.sea_level_pressure_hpa).collect::<Vec<_>>(),
            ),
            Column::new(
                OBSERVATION_COUNT_COLUMN.into(),
                hours
                    .iter()
                    .map(|h| h.observation_count as u64)
                    .collect::<Vec<_>>(),
            ),
        ])?;
        self.write_frame(frame)
    }

    /// Joined table: complaint fields with the matched hour's weather
    pub fn write_joined(&self, joined: &[JoinedRecord]) -> Result<usize> {
        let frame = DataFrame::new(vec![
            Column::new(
                canonical_columns::COMPLAINT_ID.into(),
                joined
                    .iter()
                    .map(|r| r.complaint.complaint_id.clone())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                canonical_columns::CREATED_AT.into(),
                joined.iter().map(|r| format_timestamp(r.created_at)).collect::<Vec<_>>(),
            ),
            Column::new(
                HOUR_COLUMN.into(),
                joined.iter().map(|r| format_timestamp(r.hour)).collect::<Vec<_>>(),
            ),
            Column::new(
                complaint_columns::COMPLAINT_TYPE.into(),
                joined
                    .iter()
                    .map(|r| r.complaint.complaint_type.clone())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                complaint_columns::DESCRIPTOR.into(),
                joined
                    .iter()
                    .map(|r| r.complaint.descriptor.clone())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                complaint_columns::LOCATION_TYPE.into(),
                joined
                    .iter()
                    .map(|r| r.complaint.location_type.clone())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                complaint_columns::INCIDENT_ZIP.into(),
                joined
                    .iter()
                    .map(|r| r.complaint.incident_zip.clone())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                complaint_columns::BOROUGH.into(),
                joined
                    .iter()
                    .map(|r| r.complaint.borough.clone())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                complaint_columns::LATITUDE.into(),
                joined.iter().map(|r| r.complaint.latitude).collect::<Vec<_>>(),
            ),
            Column::new(
                complaint_columns::LONGITUDE.into(),
                joined.iter().map(|r| r.complaint.longitude).collect::<Vec<_>>(),
            ),
            Column::new(
                measurement_columns::AIR_TEMPERATURE.into(),
                joined.iter().map(|r| r.air_temp_c).collect::<Vec<_>>(),
            ),
            Column::new(
                measurement_columns::DEW_POINT.into(),
                joined.iter().map(|r| r.dew_point_c).collect::<Vec<_>>(),
            ),
            Column::new(
                measurement_columns::SEA_LEVEL_PRESSURE.into(),
                joined
                    .iter()
                    .map(|r| r.sea_level_pressure_hpa)
                    .collect::<Vec<_>>(),
            ),
        ])?;
        self.write_frame(frame)
    }

    /// Canonical table: the narrow schema the reporting layer reads
    pub fn write_canonical(&self, joined: &[JoinedRecord]) -> Result<usize> {
        let frame = DataFrame::new(vec![
            Column::new(
                canonical_columns::COMPLAINT_ID.into(),
                joined
                    .iter()
                    .map(|r| r.complaint.complaint_id.clone())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                canonical_columns::CREATED_AT.into(),
                joined.iter().map(|r| format_timestamp(r.created_at)).collect::<Vec<_>>(),
            ),
            Column::new(
                canonical_columns::CREATED_HOUR.into(),
                joined.iter().map(|r| format_timestamp(r.hour)).collect::<Vec<_>>(),
            ),
            Column::new(
                canonical_columns::TEMPERATURE.into(),
                joined.iter().map(|r| r.air_temp_c).collect::<Vec<_>>(),
            ),
            Column::new(
                measurement_columns::DEW_POINT.into(),
                joined.iter().map(|r| r.dew_point_c).collect::<Vec<_>>(),
            ),
            Column::new(
                measurement_columns::SEA_LEVEL_PRESSURE.into(),
                joined
                    .iter()
                    .map(|r| r.sea_level_pressure_hpa)
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                complaint_columns::COMPLAINT_TYPE.into(),
                joined
                    .iter()
                    .map(|r| r.complaint.complaint_type.clone())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                complaint_columns::DESCRIPTOR.into(),
                joined
                    .iter()
                    .map(|r| r.complaint.descriptor.clone())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                complaint_columns::BOROUGH.into(),
                joined
                    .iter()
                    .map(|r| r.complaint.borough.clone())
                    .collect::<Vec<_>>(),
            ),
        ])?;
        self.write_frame(frame)
    }

    /// Pretty-printed JSON for the provenance sidecar
    pub fn write_contract(&self, contract: &RunContract) -> Result<()> {
        self.ensure_parent()?;
        let mut json = serde_json::to_string_pretty(contract)?;
        json.push('\n');
        fs::write(&self.output_path, json)?;
        debug!("Wrote run contract to {}", self.output_path.display());
        Ok(())
    }

    fn write_frame(&self, mut frame: DataFrame) -> Result<usize> {
        self.ensure_parent()?;
        let mut file = fs::File::create(&self.output_path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut frame)?;

        info!(
            "Wrote {} rows to {}",
            frame.height(),
            self.output_path.display()
        );
        Ok(frame.height())
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}
