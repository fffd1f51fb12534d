//! Station weather ingestor
//!
//! Reads either a raw NOAA ISD export or a pre-decoded export into typed
//! observations. Station identity is resolved here: a weather file that mixes
//! stations can only be joined once a single station has been chosen.

use crate::constants::{ISD_TIME_COLUMN_PATTERN, clean_columns, isd_columns, measurement_columns};
use crate::error::{PipelineError, Result};
use crate::ingest::CsvTable;
use crate::isd;
use crate::models::{SourceZone, WeatherFormat, WeatherObservation, WeatherStats};
use crate::normalize::{
    RawTimestamp, is_skipped_local_time, parse_timestamp, to_local_naive, to_utc,
};
use chrono_tz::Tz;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Typed observations plus the counts of rows dropped on the way in
#[derive(Debug, Clone, Default)]
pub struct WeatherIngest {
    pub observations: Vec<WeatherObservation>,
    pub station_id: String,
    pub stats: WeatherStats,
}

/// Resolved column names for one weather layout
struct WeatherColumns {
    time: String,
    station: String,
    air_temp: String,
    dew_point: String,
    sea_level_pressure: String,
}

impl WeatherColumns {
    fn resolve(table: &CsvTable, format: WeatherFormat) -> Result<Self> {
        let (time, station, air_temp, dew_point, sea_level_pressure) = match format {
            WeatherFormat::Isd => {
                let pattern = Regex::new(ISD_TIME_COLUMN_PATTERN)
                    .map_err(|e| PipelineError::configuration(e.to_string()))?;
                (
                    table.find_column_matching(&pattern),
                    isd_columns::STATION,
                    isd_columns::AIR_TEMPERATURE,
                    isd_columns::DEW_POINT,
                    isd_columns::SEA_LEVEL_PRESSURE,
                )
            }
            WeatherFormat::Clean => (
                table.find_column(&[clean_columns::DATETIME]),
                clean_columns::STATION,
                measurement_columns::AIR_TEMPERATURE,
                measurement_columns::DEW_POINT,
                measurement_columns::SEA_LEVEL_PRESSURE,
            ),
        };

        let mut missing = Vec::new();
        if time.is_none() {
            missing.push(match format {
                WeatherFormat::Isd => "DATE".to_string(),
                WeatherFormat::Clean => clean_columns::DATETIME.to_string(),
            });
        }
        if !table.has_column(air_temp) {
            missing.push(air_temp.to_string());
        }
        if !missing.is_empty() {
            return Err(table.missing_columns(missing));
        }

        if !table.has_column(station) {
            return Err(PipelineError::MissingStationIdentity {
                path: table.path().to_path_buf(),
            });
        }

        Ok(Self {
            time: time.unwrap_or_default(),
            station: station.to_string(),
            air_temp: air_temp.to_string(),
            dew_point: dew_point.to_string(),
            sea_level_pressure: sea_level_pressure.to_string(),
        })
    }
}

/// Decode one measurement cell according to the file layout
fn decode_measurement(
    format: WeatherFormat,
    value: Option<&str>,
    isd_decoder: fn(&str) -> Option<f64>,
) -> Option<f64> {
    let value = value?;
    match format {
        WeatherFormat::Isd => isd_decoder(value),
        WeatherFormat::Clean => isd::parse_measurement(value),
    }
}

/// Read a weather export into observations for a single station
///
/// `station` picks one station out of a multi-station file; without it a file
/// holding more than one station is rejected.
pub fn read_weather(
    path: &Path,
    format: WeatherFormat,
    station: Option<&str>,
    zone: SourceZone,
    tz: Tz,
) -> Result<WeatherIngest> {
    let table = CsvTable::read(path)?;
    let columns = WeatherColumns::resolve(&table, format)?;
    debug!(
        "Weather columns in {}: time={}, station={}, temperature={}",
        path.display(),
        columns.time,
        columns.station,
        columns.air_temp
    );

    let times = table.strings(&columns.time)?;
    let stations = table.strings(&columns.station)?;
    let air_temps = table.strings(&columns.air_temp)?;
    let dew_points = table.optional_strings(&columns.dew_point)?;
    let pressures = table.optional_strings(&columns.sea_level_pressure)?;

    let mut stats = WeatherStats {
        rows_read: table.height(),
        ..Default::default()
    };

    let mut candidates = Vec::with_capacity(table.height());
    for (row, station_value) in stations.iter().enumerate() {
        let Some((raw, instant)) = times[row]
            .as_deref()
            .and_then(parse_timestamp)
            .and_then(|raw| to_utc(raw, zone, tz).map(|instant| (raw, instant)))
        else {
            stats.unparseable_timestamps += 1;
            continue;
        };
        let Some(station_value) = station_value else {
            stats.missing_station += 1;
            continue;
        };
        if let (RawTimestamp::Naive(naive), SourceZone::LocalNaive) = (raw, zone) {
            if is_skipped_local_time(naive, tz) {
                stats.skipped_local_times += 1;
            }
        }

        candidates.push(WeatherObservation {
            station_id: station_value.clone(),
            observed_at_utc: instant,
            observed_at_local: to_local_naive(raw, zone, tz),
            air_temp_c: decode_measurement(
                format,
                air_temps[row].as_deref(),
                isd::decode_air_temperature,
            ),
            dew_point_c: decode_measurement(
                format,
                dew_points[row].as_deref(),
                isd::decode_dew_point,
            ),
            sea_level_pressure_hpa: decode_measurement(
                format,
                pressures[row].as_deref(),
                isd::decode_sea_level_pressure,
            ),
        });
    }

    if stats.unparseable_timestamps > 0 {
        warn!(
            "Dropped {} weather rows with unparseable timestamps",
            stats.unparseable_timestamps
        );
    }
    if stats.skipped_local_times > 0 {
        warn!(
            "Kept {} weather rows whose local time falls in a DST gap",
            stats.skipped_local_times
        );
    }
    if stats.missing_station > 0 {
        warn!(
            "Dropped {} weather rows without a station id",
            stats.missing_station
        );
    }

    let present: BTreeSet<&str> = candidates.iter().map(|o| o.station_id.as_str()).collect();
    let station_id = match station {
        Some(configured) => configured.to_string(),
        None if present.len() > 1 => {
            return Err(PipelineError::AmbiguousStation {
                path: path.to_path_buf(),
                stations: present.iter().map(|s| s.to_string()).collect(),
            });
        }
        None => present.iter().next().map(|s| s.to_string()).unwrap_or_default(),
    };

    let before = candidates.len();
    let observations: Vec<WeatherObservation> = candidates
        .into_iter()
        .filter(|o| o.station_id == station_id)
        .collect();
    stats.other_station = before - observations.len();
    if stats.other_station > 0 {
        info!(
            "Kept station {}, dropped {} rows from other stations",
            station_id, stats.other_station
        );
    }

    if observations.is_empty() {
        return Err(PipelineError::NoValidRows {
            path: path.to_path_buf(),
            stage: format!("weather ingest for station '{station_id}'"),
            dropped: stats.rows_read,
        });
    }

    info!(
        "Read {} observations for station {} from {}",
        observations.len(),
        station_id,
        path.display()
    );

    Ok(WeatherIngest {
        observations,
        station_id,
        stats,
    })
}
