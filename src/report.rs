//! Reporting contract over the canonical joined file
//!
//! Loads the canonical table, buckets complaints by day part and temperature
//! bin, and renders the three series the narrative compares. Loading fails fast
//! on a schema or key problem instead of drawing from a partial table, and the
//! share of complaints without a temperature is always disclosed.

use crate::constants::{ALLOWED_BIN_WIDTHS_C, canonical_columns};
use crate::error::{PipelineError, Result};
use crate::ingest::CsvTable;
use crate::invariants::Coverage;
use crate::isd::parse_measurement;
use crate::models::{CanonicalRecord, DayPart};
use crate::normalize::{RawTimestamp, parse_timestamp};
use chrono::Timelike;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, info};

/// Output layout of the `report` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// Aligned table for the terminal
    #[default]
    Human,
    Json,
    Csv,
}

/// Complaint count for one temperature bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BinCount {
    /// Lower edge of the bin in °C
    pub bin_c: i64,
    pub complaints: usize,
}

/// Counts for one day part, ordered by bin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayPartSeries {
    pub day_part: DayPart,
    pub bins: Vec<BinCount>,
}

impl DayPartSeries {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.complaints).sum()
    }
}

/// Day, Evening and Night series plus the coverage they were drawn from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplaintSeries {
    pub bin_width_c: u32,
    pub series: Vec<DayPartSeries>,
    pub coverage: Coverage,
    pub coverage_percent: String,
}

impl ComplaintSeries {
    pub fn get(&self, day_part: DayPart) -> Option<&DayPartSeries> {
        self.series.iter().find(|s| s.day_part == day_part)
    }
}

/// Load the canonical file, refusing to proceed on any key problem
pub fn load_canonical(path: &Path) -> Result<Vec<CanonicalRecord>> {
    let table = CsvTable::read(path)?;
    table.require(canonical_columns::REQUIRED)?;

    let ids = table.strings(canonical_columns::COMPLAINT_ID)?;
    let hours = table.strings(canonical_columns::CREATED_HOUR)?;
    let temperatures = table.strings(canonical_columns::TEMPERATURE)?;

    let missing_ids = ids.iter().filter(|id| id.is_none()).count();
    if missing_ids > 0 {
        return Err(PipelineError::NaturalKey {
            path: path.to_path_buf(),
            column: canonical_columns::COMPLAINT_ID.to_string(),
            count: missing_ids,
        });
    }

    let parsed: Vec<_> = hours
        .iter()
        .map(|value| match value.as_deref().and_then(parse_timestamp) {
            Some(RawTimestamp::Naive(hour)) => Some(hour),
            _ => None,
        })
        .collect();
    let bad_hours = parsed.iter().filter(|h| h.is_none()).count();
    if bad_hours > 0 {
        return Err(PipelineError::NaturalKey {
            path: path.to_path_buf(),
            column: canonical_columns::CREATED_HOUR.to_string(),
            count: bad_hours,
        });
    }

    let records: Vec<CanonicalRecord> = ids
        .into_iter()
        .zip(parsed)
        .zip(temperatures)
        .filter_map(|((id, hour), temperature)| {
            Some(CanonicalRecord {
                complaint_id: id?,
                created_hour: hour?,
                temperature_c: temperature.as_deref().and_then(parse_measurement),
            })
        })
        .collect();

    info!("Loaded {} canonical rows from {}", records.len(), path.display());
    Ok(records)
}

/// Lower edge of the `width`-degree bin containing `temperature_c`
pub fn temperature_bin(temperature_c: f64, width: u32) -> i64 {
    let width = f64::from(width.max(1));
    ((temperature_c / width).floor() * width) as i64
}

/// Reject bin widths the report does not offer
pub fn validate_bin_width(width: u32) -> Result<u32> {
    if ALLOWED_BIN_WIDTHS_C.contains(&width) {
        Ok(width)
    } else {
        Err(PipelineError::configuration(format!(
            "bin width must be one of {ALLOWED_BIN_WIDTHS_C:?} °C, got {width}"
        )))
    }
}

/// Count complaints per day part and temperature bin
///
/// Rows without a temperature are excluded from the counts and reported
/// through the returned coverage.
pub fn build_series(records: &[CanonicalRecord], bin_width: u32) -> ComplaintSeries {
    let mut counts: BTreeMap<(DayPart, i64), usize> = BTreeMap::new();
    let mut matched = 0;

    for record in records {
        let Some(temperature) = record.temperature_c else {
            continue;
        };
        matched += 1;
        let day_part = DayPart::from_hour(record.created_hour.hour());
        *counts
            .entry((day_part, temperature_bin(temperature, bin_width)))
            .or_default() += 1;
    }

    let series = DayPart::ALL
        .iter()
        .map(|&day_part| DayPartSeries {
            day_part,
            bins: counts
                .iter()
                .filter(|((part, _), _)| *part == day_part)
                .map(|((_, bin), complaints)| BinCount {
                    bin_c: *bin,
                    complaints: *complaints,
                })
                .collect(),
        })
        .collect();

    let coverage = Coverage::new(records.len(), matched);
    debug!(
        "Built series over {} rows at {} °C bins ({} coverage)",
        records.len(),
        bin_width,
        coverage
    );

    ComplaintSeries {
        bin_width_c: bin_width,
        series,
        coverage,
        coverage_percent: coverage.to_string(),
    }
}

/// Render the series in the requested layout
pub fn render(series: &ComplaintSeries, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => {
            let mut json = serde_json::to_string_pretty(series)?;
            json.push('\n');
            Ok(json)
        }
        ReportFormat::Csv => Ok(render_csv(series)),
        ReportFormat::Human => Ok(render_human(series)),
    }
}

fn render_csv(series: &ComplaintSeries) -> String {
    let mut out = String::from("day_part,temperature_bin_c,complaints\n");
    for part in &series.series {
        for bin in &part.bins {
            let _ = writeln!(out, "{},{},{}", part.day_part, bin.bin_c, bin.complaints);
        }
    }
    out
}

fn render_human(series: &ComplaintSeries) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        format!(
            "Complaints by day part and temperature ({} °C bins)",
            series.bin_width_c
        )
        .bold()
    );

    let bins: Vec<i64> = {
        let mut all: Vec<i64> = series
            .series
            .iter()
            .flat_map(|s| s.bins.iter().map(|b| b.bin_c))
            .collect();
        all.sort_unstable();
        all.dedup();
        all
    };

    let _ = write!(out, "{:>10}", "bin °C");
    for part in &series.series {
        let _ = write!(out, "{:>10}", part.day_part.as_str());
    }
    out.push('\n');

    for bin in bins {
        let _ = write!(out, "{bin:>10}");
        for part in &series.series {
            let count = part
                .bins
                .iter()
                .find(|b| b.bin_c == bin)
                .map_or(0, |b| b.complaints);
            let _ = write!(out, "{count:>10}");
        }
        out.push('\n');
    }

    let _ = write!(out, "{:>10}", "total");
    for part in &series.series {
        let _ = write!(out, "{:>10}", part.total());
    }
    out.push('\n');

    let coverage = series.coverage;
    let _ = writeln!(
        out,
        "{} {} of {} complaints have a temperature ({} excluded)",
        "Coverage:".cyan(),
        series.coverage_percent,
        coverage.total,
        coverage.missing()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::fs;
    use tempfile::TempDir;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 7, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn record(id: &str, h: u32, temp: Option<f64>) -> CanonicalRecord {
        CanonicalRecord {
            complaint_id: id.to_string(),
            created_hour: at(h),
            temperature_c: temp,
        }
    }

    #[test]
    fn test_temperature_bin() {
        assert_eq!(temperature_bin(30.0, 5), 30);
        assert_eq!(temperature_bin(34.9, 5), 30);
        assert_eq!(temperature_bin(20.9, 3), 18);
        assert_eq!(temperature_bin(-1.2, 3), -3);
        assert_eq!(temperature_bin(0.0, 2), 0);
    }

    #[test]
    fn test_bin_width_validation() {
        assert_eq!(validate_bin_width(5).unwrap(), 5);
        assert!(validate_bin_width(7).is_err());
    }

    #[test]
    fn test_evening_complaint_lands_in_thirty_degree_bin() {
        let series = build_series(&[record("1", 20, Some(30.0))], 5);
        let evening = series.get(DayPart::Evening).unwrap();
        assert_eq!(
            evening.bins,
            vec![BinCount {
                bin_c: 30,
                complaints: 1
            }]
        );
        assert!(series.get(DayPart::Day).unwrap().bins.is_empty());
        assert!(series.get(DayPart::Night).unwrap().bins.is_empty());
    }

    #[test]
    fn test_series_sorted_by_bin_and_missing_excluded() {
        let records = vec![
            record("1", 9, Some(27.0)),
            record("2", 10, Some(12.0)),
            record("3", 11, Some(13.5)),
            record("4", 23, None),
            record("5", 2, Some(-4.0)),
        ];
        let series = build_series(&records, 3);

        let day: Vec<_> = series
            .get(DayPart::Day)
            .unwrap()
            .bins
            .iter()
            .map(|b| (b.bin_c, b.complaints))
            .collect();
        assert_eq!(day, vec![(12, 2), (27, 1)]);

        let night = series.get(DayPart::Night).unwrap();
        assert_eq!(night.total(), 1);
        assert_eq!(night.bins[0].bin_c, -6);

        assert_eq!(series.coverage, Coverage::new(5, 4));
        assert_eq!(series.coverage_percent, "80.00%");
    }

    #[test]
    fn test_series_order_is_day_evening_night() {
        let series = build_series(&[], 3);
        let parts: Vec<_> = series.series.iter().map(|s| s.day_part).collect();
        assert_eq!(parts, DayPart::ALL.to_vec());
    }

    #[test]
    fn test_render_csv_and_json() {
        let series = build_series(&[record("1", 20, Some(30.0))], 5);

        let csv = render(&series, ReportFormat::Csv).unwrap();
        assert_eq!(csv, "day_part,temperature_bin_c,complaints\nEvening,30,1\n");

        let json = render(&series, ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["bin_width_c"], 5);
        assert_eq!(value["series"][1]["day_part"], "Evening");
        assert_eq!(value["series"][1]["bins"][0]["bin_c"], 30);
        assert_eq!(value["coverage_percent"], "100.00%");
    }

    #[test]
    fn test_render_human_discloses_coverage() {
        let series = build_series(&[record("1", 20, Some(30.0)), record("2", 21, None)], 5);
        let text = render(&series, ReportFormat::Human).unwrap();
        assert!(text.contains("Evening"));
        assert!(text.contains("50.00% of 2 complaints have a temperature (1 excluded)"));
    }

    fn write(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("canonical.csv");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_canonical() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "complaint_id,created_at,created_hour,temperature_c\n\
             1,2023-07-01 20:15:00,2023-07-01 20:00:00,30.0\n\
             2,2023-07-01 21:15:00,2023-07-01 21:00:00,\n",
        );
        let records = load_canonical(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].created_hour, at(20));
        assert_eq!(records[0].temperature_c, Some(30.0));
        assert_eq!(records[1].temperature_c, None);
    }

    #[test]
    fn test_load_canonical_fails_fast() {
        let dir = TempDir::new().unwrap();

        let err = load_canonical(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::InputNotFound { .. }));

        let path = write(&dir, "complaint_id,created_hour\n1,2023-07-01 20:00:00\n");
        match load_canonical(&path).unwrap_err() {
            PipelineError::MissingColumns { columns, .. } => {
                assert_eq!(columns, vec!["temperature_c".to_string()]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }

        let path = write(
            &dir,
            "complaint_id,created_hour,temperature_c\n1,not an hour,30.0\n2,,30.0\n",
        );
        match load_canonical(&path).unwrap_err() {
            PipelineError::NaturalKey { column, count, .. } => {
                assert_eq!(column, "created_hour");
                assert_eq!(count, 2);
            }
            other => panic!("expected NaturalKey, got {other:?}"),
        }

        let path = write(
            &dir,
            "complaint_id,created_hour,temperature_c\n,2023-07-01 20:00:00,30.0\n",
        );
        match load_canonical(&path).unwrap_err() {
            PipelineError::NaturalKey { column, .. } => assert_eq!(column, "complaint_id"),
            other => panic!("expected NaturalKey, got {other:?}"),
        }
    }
}
