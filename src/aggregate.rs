//! Hourly aggregation of station weather
//!
//! Collapses zero or more sub-hourly observations into at most one row per
//! canonical local hour. Means are taken over non-missing values only, and an
//! hour with no observations is simply absent rather than zero-filled.

use crate::models::{HourlyWeather, WeatherObservation};
use crate::normalize::floor_to_hour;
use chrono::{Datelike, NaiveDateTime};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Running mean over the non-missing values of one measurement
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    pub fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    pub fn result(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

#[derive(Debug, Default)]
struct HourAccumulator {
    air_temp_c: MeanAccumulator,
    dew_point_c: MeanAccumulator,
    sea_level_pressure_hpa: MeanAccumulator,
    observations: usize,
}

impl HourAccumulator {
    fn add(&mut self, observation: &WeatherObservation) {
        self.air_temp_c.add(observation.air_temp_c);
        self.dew_point_c.add(observation.dew_point_c);
        self.sea_level_pressure_hpa
            .add(observation.sea_level_pressure_hpa);
        self.observations += 1;
    }

    fn finish(&self, hour: NaiveDateTime) -> HourlyWeather {
        HourlyWeather {
            hour,
            air_temp_c: self.air_temp_c.result(),
            dew_point_c: self.dew_point_c.result(),
            sea_level_pressure_hpa: self.sea_level_pressure_hpa.result(),
            observation_count: self.observations,
        }
    }
}

/// Output of [`aggregate_hourly`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HourlyAggregation {
    /// One row per canonical hour, in ascending hour order
    pub hours: Vec<HourlyWeather>,
    /// Observations whose local hour fell outside the reporting year
    pub out_of_year: usize,
}

impl HourlyAggregation {
    /// Number of hours with no usable air temperature
    pub fn temperature_missing(&self) -> usize {
        self.hours.iter().filter(|h| h.air_temp_c.is_none()).count()
    }
}

/// Canonical local hour of an observation
pub fn canonical_hour(observation: &WeatherObservation) -> NaiveDateTime {
    floor_to_hour(observation.observed_at_local)
}

/// Group observations by canonical local hour and average each measurement
///
/// Only hours inside the local calendar `year` are kept. The result is ordered
/// by hour, so repeated runs over the same input produce identical output.
pub fn aggregate_hourly(
    observations: &[WeatherObservation],
    year: i32,
) -> HourlyAggregation {
    let mut groups: BTreeMap<NaiveDateTime, HourAccumulator> = BTreeMap::new();
    let mut out_of_year = 0;

    for observation in observations {
        let hour = canonical_hour(observation);
        if hour.year() != year {
            out_of_year += 1;
            continue;
        }
        groups.entry(hour).or_default().add(observation);
    }

    let hours: Vec<HourlyWeather> = groups
        .iter()
        .map(|(hour, accumulator)| accumulator.finish(*hour))
        .collect();

    debug!(
        "Aggregated {} observations into {} hours ({} outside {})",
        observations.len(),
        hours.len(),
        out_of_year,
        year
    );

    let aggregation = HourlyAggregation { hours, out_of_year };
    info!(
        "Hourly aggregation: {} hours, {} without air temperature",
        aggregation.hours.len(),
        aggregation.temperature_missing()
    );
    aggregation
}
