//! Post-hoc invariant checks for the hourly join
//!
//! Each check is a standalone function over typed records so it can run
//! independently of the transform that produced them. A failed check returns
//! [`PipelineError::InvariantViolation`] naming the invariant; callers abort
//! before anything is persisted.

use crate::error::{PipelineError, Result};
use crate::models::{HourlyWeather, JoinedRecord};
use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

pub const UNIQUE_HOUR: &str = "unique_hour";
pub const ROW_CONSERVATION: &str = "row_conservation";
pub const YEAR_BOUND: &str = "year_bound";
pub const NATURAL_KEY: &str = "natural_key";
pub const COVERAGE_BOUND: &str = "coverage_bound";
pub const NAIVE_HOUR: &str = "naive_hour";

/// The hour column must not contain duplicates
pub fn check_unique_hours(hours: &[HourlyWeather]) -> Result<()> {
    let mut seen = HashSet::with_capacity(hours.len());
    let mut duplicates: Vec<NaiveDateTime> = Vec::new();

    for row in hours {
        if !seen.insert(row.hour) {
            duplicates.push(row.hour);
        }
    }

    if duplicates.is_empty() {
        debug!("{} hours, all unique", hours.len());
        return Ok(());
    }

    duplicates.sort();
    duplicates.dedup();
    let sample: Vec<String> = duplicates.iter().take(5).map(|h| h.to_string()).collect();
    Err(PipelineError::invariant(
        UNIQUE_HOUR,
        format!(
            "{} of {} hourly rows share an hour with another row (e.g. {})",
            hours.len() - seen.len(),
            hours.len(),
            sample.join(", ")
        ),
    ))
}

/// Every hour must lie within the calendar `year`
pub fn check_year_bound(hours: &[HourlyWeather], year: i32) -> Result<()> {
    let (Some(min), Some(max)) = (
        hours.iter().map(|h| h.hour).min(),
        hours.iter().map(|h| h.hour).max(),
    ) else {
        return Ok(());
    };

    if min.year() != year || max.year() != year {
        return Err(PipelineError::invariant(
            YEAR_BOUND,
            format!("hours span {min} to {max}, expected only {year}"),
        ));
    }

    debug!("Hours span {} to {} within {}", min, max, year);
    Ok(())
}

/// The join must neither drop nor duplicate complaint rows
pub fn check_row_conservation(complaints: usize, joined: usize) -> Result<()> {
    if complaints != joined {
        return Err(PipelineError::invariant(
            ROW_CONSERVATION,
            format!("{complaints} complaints went in but {joined} joined rows came out"),
        ));
    }
    Ok(())
}

/// `complaint_id` must be present on every joined row
pub fn check_natural_keys(joined: &[JoinedRecord]) -> Result<()> {
    let missing = joined
        .iter()
        .filter(|row| row.complaint.complaint_id.trim().is_empty())
        .count();

    if missing > 0 {
        return Err(PipelineError::invariant(
            NATURAL_KEY,
            format!("{missing} joined rows have an empty complaint_id"),
        ));
    }
    Ok(())
}

/// Share of joined rows that carry a primary measurement (air temperature)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub total: usize,
    pub matched: usize,
}

impl Coverage {
    pub fn new(total: usize, matched: usize) -> Self {
        Self { total, matched }
    }

    pub fn from_joined(joined: &[JoinedRecord]) -> Self {
        Self::new(
            joined.len(),
            joined.iter().filter(|row| row.has_weather()).count(),
        )
    }

    pub fn missing(&self) -> usize {
        self.total - self.matched
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.matched as f64 * 100.0 / self.total as f64
        }
    }

    pub fn missing_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.missing() as f64 * 100.0 / self.total as f64
        }
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.percent())
    }
}

/// The missing rate must stay within `max_missing_pct`
pub fn check_coverage_bound(coverage: Coverage, max_missing_pct: f64) -> Result<()> {
    let missing_pct = coverage.missing_percent();
    if missing_pct > max_missing_pct {
        return Err(PipelineError::invariant(
            COVERAGE_BOUND,
            format!(
                "{} of {} joined rows have no temperature ({missing_pct:.2}% > {max_missing_pct:.2}%)",
                coverage.missing(),
                coverage.total
            ),
        ));
    }
    if coverage.missing() > 0 {
        warn!(
            "{} of {} joined rows have no matching weather hour ({:.2}% missing)",
            coverage.missing(),
            coverage.total,
            missing_pct
        );
    }
    Ok(())
}

/// Run the checks the hourly weather table must pass before it is persisted
pub fn validate_hourly(hours: &[HourlyWeather], year: i32) -> Result<()> {
    check_unique_hours(hours)?;
    check_year_bound(hours, year)?;
    info!("Hourly weather invariants hold: {} unique hours in {}", hours.len(), year);
    Ok(())
}

/// Run the checks the joined table must pass before it is declared canonical
pub fn validate_joined(
    complaints: usize,
    joined: &[JoinedRecord],
    max_missing_pct: f64,
) -> Result<Coverage> {
    check_row_conservation(complaints, joined.len())?;
    check_natural_keys(joined)?;
    let coverage = Coverage::from_joined(joined);
    check_coverage_bound(coverage, max_missing_pct)?;
    info!(
        "Join invariants hold: {} rows, weather coverage {}",
        joined.len(),
        coverage
    );
    Ok(coverage)
}
