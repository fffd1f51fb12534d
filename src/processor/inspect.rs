//! Dry-run alignment check of both inputs
//!
//! Reports row counts, time ranges, hour uniqueness and the declared source
//! zones without writing anything, so a zone mismatch can be spotted before a
//! join is persisted.

use super::JoinProcessor;
use crate::error::Result;
use crate::ingest::{read_complaints, read_hourly_rows};
use crate::invariants::Coverage;
use crate::models::{HourlyWeather, SourceZone};
use chrono::{Datelike, NaiveDateTime};
use colored::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::{info, warn};

/// First and last canonical hour of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
}

impl TimeRange {
    fn of(hours: impl IntoIterator<Item = NaiveDateTime>) -> Option<Self> {
        let mut iter = hours.into_iter();
        let first = iter.next()?;
        let (first, last) = iter.fold((first, first), |(lo, hi), h| (lo.min(h), hi.max(h)));
        Some(Self { first, last })
    }
}

/// What one input looks like after normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub path: PathBuf,
    /// `None` for a persisted hourly table, which is already local
    pub declared_zone: Option<SourceZone>,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub distinct_hours: usize,
    pub range: Option<TimeRange>,
}

/// Alignment report for the complaint and weather inputs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub timezone: String,
    pub complaints: SourceSummary,
    pub weather: SourceSummary,
    /// Weather rows sharing an hour with an earlier row
    pub duplicate_weather_hours: usize,
    /// Weather hours outside the configured year
    pub out_of_year_weather_hours: usize,
    /// Complaint hours that have a weather row
    pub overlapping_hours: usize,
    /// Share of complaints a join would give a temperature
    pub coverage: Coverage,
    pub temperature_min_c: Option<f64>,
    pub temperature_max_c: Option<f64>,
}

impl JoinProcessor {
    /// Inspect both inputs without writing anything
    ///
    /// Weather comes from the persisted hourly table when it exists, otherwise
    /// from the raw export aggregated in memory. A persisted table is read
    /// without the hour checks so duplicate and out-of-year hours are counted
    /// instead of aborting the report.
    pub fn inspect(&self) -> Result<Inspection> {
        let config = self.config();
        let hourly_path = &config.paths.hourly_output;

        let (hours, weather) = if hourly_path.exists() {
            let hours = read_hourly_rows(hourly_path)?;
            let summary = summarize_hours(hourly_path.clone(), None, hours.len(), &hours);
            (hours, summary)
        } else {
            let prepared = self.prepare_weather()?;
            let summary = summarize_hours(
                config.paths.weather_input.clone(),
                Some(config.weather_zone),
                prepared.stats.rows_read,
                &prepared.hours,
            );
            (prepared.hours, summary)
        };

        let ingest = read_complaints(&config.paths.complaints_input, config.complaint_zone, self.tz)?;
        let complaint_hours: HashSet<NaiveDateTime> =
            ingest.complaints.iter().map(|c| c.hour).collect();
        let complaints = SourceSummary {
            path: config.paths.complaints_input.clone(),
            declared_zone: Some(config.complaint_zone),
            rows_read: ingest.rows_read,
            rows_kept: ingest.complaints.len(),
            distinct_hours: complaint_hours.len(),
            range: TimeRange::of(ingest.complaints.iter().map(|c| c.hour)),
        };

        let by_hour: HashMap<NaiveDateTime, &HourlyWeather> =
            hours.iter().map(|h| (h.hour, h)).collect();
        let overlapping_hours = complaint_hours
            .iter()
            .filter(|h| by_hour.contains_key(h))
            .count();
        let matched = ingest
            .complaints
            .iter()
            .filter(|c| by_hour.get(&c.hour).is_some_and(|w| w.air_temp_c.is_some()))
            .count();

        let temperatures = hours.iter().filter_map(|h| h.air_temp_c);
        let temperature_min_c = temperatures.clone().reduce(f64::min);
        let temperature_max_c = temperatures.reduce(f64::max);

        let duplicate_weather_hours = weather.rows_kept - weather.distinct_hours;
        let out_of_year_weather_hours = hours
            .iter()
            .filter(|h| h.hour.year() != config.year)
            .count();
        if duplicate_weather_hours > 0 || out_of_year_weather_hours > 0 {
            warn!(
                "Weather has {} duplicate hours and {} hours outside {}; a join would be refused",
                duplicate_weather_hours, out_of_year_weather_hours, config.year
            );
        }

        let inspection = Inspection {
            timezone: config.timezone.clone(),
            complaints,
            weather,
            duplicate_weather_hours,
            out_of_year_weather_hours,
            overlapping_hours,
            coverage: Coverage::new(ingest.complaints.len(), matched),
            temperature_min_c,
            temperature_max_c,
        };
        info!(
            "Inspection: {} complaint hours, {} overlap weather, projected coverage {}",
            inspection.complaints.distinct_hours,
            inspection.overlapping_hours,
            inspection.coverage
        );
        Ok(inspection)
    }
}

fn summarize_hours(
    path: PathBuf,
    declared_zone: Option<SourceZone>,
    rows_read: usize,
    hours: &[HourlyWeather],
) -> SourceSummary {
    let distinct: HashSet<NaiveDateTime> = hours.iter().map(|h| h.hour).collect();
    SourceSummary {
        path,
        declared_zone,
        rows_read,
        rows_kept: hours.len(),
        distinct_hours: distinct.len(),
        range: TimeRange::of(hours.iter().map(|h| h.hour)),
    }
}

impl Inspection {
    /// Print a colored summary to stdout
    pub fn print(&self) {
        println!("{}", "Time alignment check".bright_green().bold());
        println!("  {} {}", "Target zone:".bright_cyan(), self.timezone);

        for (label, source) in [("Complaints", &self.complaints), ("Weather", &self.weather)] {
            println!("\n{}", format!("=== {label} ===").bright_yellow());
            println!("  {} {}", "File:".bright_cyan(), source.path.display());
            let zone = source
                .declared_zone
                .map_or_else(|| "hourly table (local)".to_string(), |z| z.to_string());
            println!("  {} {}", "Declared zone:".bright_cyan(), zone);
            println!(
                "  {} {} read, {} kept",
                "Rows:".bright_cyan(),
                source.rows_read,
                source.rows_kept
            );
            match source.range {
                Some(range) => println!(
                    "  {} {} .. {}",
                    "Hours:".bright_cyan(),
                    range.first,
                    range.last
                ),
                None => println!("  {} none", "Hours:".bright_cyan()),
            }
            println!(
                "  {} {}",
                "Distinct hours:".bright_cyan(),
                source.distinct_hours
            );
        }

        println!("\n{}", "=== Weather hour checks ===".bright_yellow());
        for (label, count) in [
            ("Duplicate hours:", self.duplicate_weather_hours),
            ("Hours outside year:", self.out_of_year_weather_hours),
        ] {
            let shown = if count == 0 {
                count.to_string().green()
            } else {
                count.to_string().red().bold()
            };
            println!("  {} {}", label.bright_cyan(), shown);
        }

        println!("\n{}", "=== Join preview ===".bright_yellow());
        println!(
            "  {} {}",
            "Overlapping hours:".bright_cyan(),
            self.overlapping_hours
        );
        println!(
            "  {} {} ({} of {} complaints)",
            "Coverage:".bright_cyan(),
            self.coverage.to_string().bright_white().bold(),
            self.coverage.matched,
            self.coverage.total
        );
        if let (Some(min), Some(max)) = (self.temperature_min_c, self.temperature_max_c) {
            println!("  {} {min:.1} .. {max:.1} °C", "Temperature:".bright_cyan());
        }
    }
}
