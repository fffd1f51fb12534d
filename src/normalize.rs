//! Civil-time normalization.
//!
//! Converts timestamp columns from their declared source zone into naive local
//! wall-clock time in a single target zone and floors them to the canonical
//! hour. The source zone is always declared by the caller; there is no default
//! that would let two sources silently share one.

use crate::models::SourceZone;
use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;
use tracing::{debug, warn};

/// Timestamp as parsed from text, before any zone handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTimestamp {
    /// No zone marker in the source text
    Naive(NaiveDateTime),
    /// Explicit offset (or `Z`) in the source text
    Aware(DateTime<FixedOffset>),
}

const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a timestamp in any of the layouts the upstream exports use
pub fn parse_timestamp(value: &str) -> Option<RawTimestamp> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(RawTimestamp::Aware(dt));
    }
    for format in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(RawTimestamp::Aware(dt));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(RawTimestamp::Naive(dt));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(RawTimestamp::Naive)
}

/// Interpret a parsed timestamp as an absolute UTC instant
///
/// Naive values are read in the declared zone: as UTC, or as wall-clock time in `tz`.
pub fn to_utc(raw: RawTimestamp, zone: SourceZone, tz: Tz) -> Option<DateTime<Utc>> {
    match (raw, zone) {
        (RawTimestamp::Aware(dt), _) => Some(dt.with_timezone(&Utc)),
        (RawTimestamp::Naive(naive), SourceZone::Utc) => Some(Utc.from_utc_datetime(&naive)),
        (RawTimestamp::Naive(naive), SourceZone::LocalNaive) => local_to_utc(naive, tz),
    }
}

/// Hours to step back from a skipped wall-clock time to reach a valid one
const TRANSITION_LOOKBACK_HOURS: i64 = 2;

/// UTC instant of a local wall-clock time in `tz`
///
/// Ambiguous times take the earlier instant. A time skipped by a forward
/// transition is read with the offset in force just before it, so
/// `02:30` on a spring-forward night in New York becomes `07:30` UTC.
pub fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            let lookback = Duration::hours(TRANSITION_LOOKBACK_HOURS);
            tz.from_local_datetime(&(naive - lookback))
                .earliest()
                .map(|before| before.with_timezone(&Utc) + lookback)
        }
    }
}

/// Whether a wall-clock time falls in a forward-transition gap of `tz`
pub fn is_skipped_local_time(naive: NaiveDateTime, tz: Tz) -> bool {
    matches!(tz.from_local_datetime(&naive), LocalResult::None)
}

/// Convert a UTC instant to naive local civil time in `tz`
///
/// The offset is resolved per instant, so standard and daylight time are both
/// handled without assuming a fixed offset.
pub fn utc_to_local_naive(instant: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

/// Convert a parsed timestamp to naive local time according to its declared zone
pub fn to_local_naive(raw: RawTimestamp, zone: SourceZone, tz: Tz) -> NaiveDateTime {
    match (raw, zone) {
        (RawTimestamp::Aware(dt), _) => dt.with_timezone(&tz).naive_local(),
        (RawTimestamp::Naive(naive), SourceZone::Utc) => {
            utc_to_local_naive(Utc.from_utc_datetime(&naive), tz)
        }
        (RawTimestamp::Naive(naive), SourceZone::LocalNaive) => naive,
    }
}

/// Truncate a local timestamp to its containing hour
pub fn floor_to_hour(value: NaiveDateTime) -> NaiveDateTime {
    value
        .date()
        .and_hms_opt(value.hour(), 0, 0)
        .unwrap_or(value)
}

/// Result of normalizing a column of timestamp strings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedColumn {
    /// Local timestamp per input row, `None` where parsing failed
    pub local: Vec<Option<NaiveDateTime>>,
    /// Number of rows that failed to parse
    pub dropped: usize,
}

impl NormalizedColumn {
    /// Canonical hour per input row, `None` where parsing failed
    pub fn hours(&self) -> impl Iterator<Item = Option<NaiveDateTime>> + '_ {
        self.local.iter().map(|value| value.map(floor_to_hour))
    }
}

/// Normalize a column of timestamp strings from `zone` to naive local time in `tz`
pub fn normalize_column<'a, I>(values: I, zone: SourceZone, tz: Tz) -> NormalizedColumn
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut column = NormalizedColumn::default();

    for value in values {
        let local = value
            .and_then(parse_timestamp)
            .map(|raw| to_local_naive(raw, zone, tz));
        if local.is_none() {
            column.dropped += 1;
        }
        column.local.push(local);
    }

    if column.dropped > 0 {
        warn!(
            "{} of {} timestamps could not be parsed and will be dropped",
            column.dropped,
            column.local.len()
        );
    }
    debug!(
        "Normalized {} timestamps from {} to {}",
        column.local.len(),
        zone,
        tz.name()
    );

    column
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ny() -> Tz {
        chrono_tz::America::New_York
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_timestamp_layouts() {
        let expected = local(2023, 7, 1, 20, 15, 0);
        for text in [
            "2023-07-01T20:15:00",
            "2023-07-01 20:15:00",
            "2023-07-01T20:15:00.000",
            "2023-07-01 20:15",
            "07/01/2023 08:15:00 PM",
        ] {
            assert_eq!(
                parse_timestamp(text),
                Some(RawTimestamp::Naive(expected)),
                "layout {text}"
            );
        }

        match parse_timestamp("2023-07-01T20:15:00Z") {
            Some(RawTimestamp::Aware(dt)) => assert_eq!(dt.naive_utc(), expected),
            other => panic!("expected aware timestamp, got {other:?}"),
        }

        assert_eq!(
            parse_timestamp("2023-07-01"),
            Some(RawTimestamp::Naive(local(2023, 7, 1, 0, 0, 0)))
        );
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_utc_to_local_uses_daylight_offset_in_summer() {
        let raw = parse_timestamp("2023-07-02T00:51:00").unwrap();
        let converted = to_local_naive(raw, SourceZone::Utc, ny());
        assert_eq!(converted, local(2023, 7, 1, 20, 51, 0));
    }

    #[test]
    fn test_utc_to_local_uses_standard_offset_in_winter() {
        let raw = parse_timestamp("2023-01-15T12:00:00").unwrap();
        let converted = to_local_naive(raw, SourceZone::Utc, ny());
        assert_eq!(converted, local(2023, 1, 15, 7, 0, 0));
    }

    #[test]
    fn test_local_naive_source_is_not_shifted() {
        let raw = parse_timestamp("2023-07-01 20:00:00").unwrap();
        let converted = to_local_naive(raw, SourceZone::LocalNaive, ny());
        assert_eq!(converted, local(2023, 7, 1, 20, 0, 0));
    }

    #[test]
    fn test_aware_input_is_converted_regardless_of_declaration() {
        let raw = parse_timestamp("2023-07-02T00:00:00+00:00").unwrap();
        assert_eq!(
            to_local_naive(raw, SourceZone::LocalNaive, ny()),
            local(2023, 7, 1, 20, 0, 0)
        );
    }

    #[test]
    fn test_new_year_boundary_crosses_into_previous_local_year() {
        let raw = parse_timestamp("2024-01-01T03:00:00").unwrap();
        let converted = to_local_naive(raw, SourceZone::Utc, ny());
        assert_eq!(converted, local(2023, 12, 31, 22, 0, 0));
    }

    #[test]
    fn test_floor_to_hour() {
        assert_eq!(
            floor_to_hour(local(2023, 3, 5, 14, 59, 59)),
            local(2023, 3, 5, 14, 0, 0)
        );
        assert_eq!(
            floor_to_hour(local(2023, 3, 5, 14, 0, 0)),
            local(2023, 3, 5, 14, 0, 0)
        );
    }

    #[test]
    fn test_normalize_column_counts_dropped_rows() {
        let values = vec![
            Some("2023-07-01T12:30:00"),
            Some("garbage"),
            None,
            Some("2023-07-01T13:05:00"),
        ];
        let column = normalize_column(values, SourceZone::Utc, ny());

        assert_eq!(column.dropped, 2);
        assert_eq!(column.local.len(), 4);
        let hours: Vec<_> = column.hours().collect();
        assert_eq!(hours[0], Some(local(2023, 7, 1, 8, 0, 0)));
        assert_eq!(hours[1], None);
        assert_eq!(hours[2], None);
        assert_eq!(hours[3], Some(local(2023, 7, 1, 9, 0, 0)));
    }

    #[test]
    fn test_to_utc_round_trips_local_declaration() {
        let raw = parse_timestamp("2023-07-01 20:00:00").unwrap();
        let instant = to_utc(raw, SourceZone::LocalNaive, ny()).unwrap();
        assert_eq!(instant.naive_utc(), local(2023, 7, 2, 0, 0, 0));

        let utc = to_utc(raw, SourceZone::Utc, ny()).unwrap();
        assert_eq!(utc.naive_utc(), local(2023, 7, 1, 20, 0, 0));
    }

    #[test]
    fn test_spring_forward_gap_is_resolved_not_dropped() {
        let skipped = local(2023, 3, 12, 2, 30, 0);
        assert!(is_skipped_local_time(skipped, ny()));
        assert!(!is_skipped_local_time(local(2023, 3, 12, 3, 30, 0), ny()));

        let instant = local_to_utc(skipped, ny()).unwrap();
        assert_eq!(instant.naive_utc(), local(2023, 3, 12, 7, 30, 0));

        // Wall-clock time is what the local declaration keeps
        let raw = RawTimestamp::Naive(skipped);
        assert_eq!(to_local_naive(raw, SourceZone::LocalNaive, ny()), skipped);
    }

    #[test]
    fn test_fall_back_ambiguity_takes_earlier_instant() {
        let instant = local_to_utc(local(2023, 11, 5, 1, 30, 0), ny()).unwrap();
        assert_eq!(instant.naive_utc(), local(2023, 11, 5, 5, 30, 0));
    }
}
