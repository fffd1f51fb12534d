//! Many-to-one left join of complaints onto hourly weather
//!
//! The complaint stream drives cardinality. Hourly uniqueness on the weather
//! side is checked before the join runs, so a duplicated hour can never fan a
//! complaint out into several rows.

use crate::error::Result;
use crate::invariants::check_unique_hours;
use crate::models::{HourlyWeather, JoinedRecord, NormalizedComplaint};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use tracing::debug;

/// Left-join complaints to hourly weather on equal canonical hour
///
/// Output order follows `complaints`. Unmatched complaints are kept with
/// missing weather fields.
pub fn join_hourly(
    complaints: &[NormalizedComplaint],
    hourly: &[HourlyWeather],
) -> Result<Vec<JoinedRecord>> {
    check_unique_hours(hourly)?;

    let by_hour: HashMap<NaiveDateTime, &HourlyWeather> =
        hourly.iter().map(|row| (row.hour, row)).collect();

    let joined: Vec<JoinedRecord> = complaints
        .iter()
        .map(|complaint| {
            let weather = by_hour.get(&complaint.hour);
            JoinedRecord {
                complaint: complaint.record.clone(),
                created_at: complaint.created_at,
                hour: complaint.hour,
                air_temp_c: weather.and_then(|w| w.air_temp_c),
                dew_point_c: weather.and_then(|w| w.dew_point_c),
                sea_level_pressure_hpa: weather.and_then(|w| w.sea_level_pressure_hpa),
            }
        })
        .collect();

    let matched = complaints
        .iter()
        .filter(|c| by_hour.contains_key(&c.hour))
        .count();
    debug!(
        "Joined {} complaints against {} weather hours ({} matched an hour)",
        complaints.len(),
        hourly.len(),
        matched
    );

    Ok(joined)
}
