//! Reader for a persisted hourly weather table
//!
//! The `join` stage consumes the file the `weather` stage wrote. Its hours must
//! be naive local timestamps already floored to the hour; anything else means
//! the file was not produced under the same time contract.

use crate::constants::{HOUR_COLUMN, OBSERVATION_COUNT_COLUMN, measurement_columns};
use crate::error::{PipelineError, Result};
use crate::ingest::CsvTable;
use crate::invariants::{NAIVE_HOUR, check_unique_hours};
use crate::isd::parse_measurement;
use crate::models::HourlyWeather;
use crate::normalize::{RawTimestamp, floor_to_hour, parse_timestamp};
use std::path::Path;
use tracing::info;

/// Load hourly weather written by the `weather` stage
///
/// Hours must be unique. The year bound depends on the run configuration and
/// is checked by the caller.
pub fn read_hourly(path: &Path) -> Result<Vec<HourlyWeather>> {
    let rows = read_hourly_rows(path)?;
    check_unique_hours(&rows)?;
    info!("Loaded {} hourly weather rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parse an hourly table without gating on hour uniqueness
///
/// Used where duplicates should be reported rather than rejected.
pub fn read_hourly_rows(path: &Path) -> Result<Vec<HourlyWeather>> {
    let table = CsvTable::read(path)?;
    table.require(&[HOUR_COLUMN, measurement_columns::AIR_TEMPERATURE])?;

    let hours = table.strings(HOUR_COLUMN)?;
    let air_temps = table.strings(measurement_columns::AIR_TEMPERATURE)?;
    let dew_points = table.optional_strings(measurement_columns::DEW_POINT)?;
    let pressures = table.optional_strings(measurement_columns::SEA_LEVEL_PRESSURE)?;
    let counts = table.optional_strings(OBSERVATION_COUNT_COLUMN)?;

    let mut rows = Vec::with_capacity(table.height());
    for (row, value) in hours.iter().enumerate() {
        let text = value.as_deref().unwrap_or_default();
        let hour = match parse_timestamp(text) {
            Some(RawTimestamp::Naive(hour)) if floor_to_hour(hour) == hour => hour,
            _ => {
                return Err(PipelineError::invariant(
                    NAIVE_HOUR,
                    format!(
                        "row {} of {} has hour '{}', expected a naive local hour",
                        row + 1,
                        path.display(),
                        text
                    ),
                ));
            }
        };

        rows.push(HourlyWeather {
            hour,
            air_temp_c: air_temps[row].as_deref().and_then(parse_measurement),
            dew_point_c: dew_points[row].as_deref().and_then(parse_measurement),
            sea_level_pressure_hpa: pressures[row].as_deref().and_then(parse_measurement),
            observation_count: counts[row]
                .as_deref()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        });
    }

    Ok(rows)
}
