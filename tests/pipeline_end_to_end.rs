//! End-to-end tests through the public library API

use nyc311_weather::invariants::{UNIQUE_HOUR, YEAR_BOUND, check_year_bound};
use nyc311_weather::report::{ReportFormat, build_series, load_canonical, render};
use nyc311_weather::{DayPart, HourlyWeather, JoinProcessor, PipelineConfig, SourceZone};
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config_in(dir: &Path) -> PipelineConfig {
    PipelineConfig::default()
        .with_weather_input(dir.join("74486094789.csv"))
        .with_complaints_input(dir.join("noise.csv"))
        .with_hourly_output(dir.join("out/hourly.csv"))
        .with_joined_output(dir.join("out/joined.csv"))
        .with_canonical_output(dir.join("out/canonical.csv"))
}

#[test]
fn test_evening_complaint_at_thirty_degrees() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("74486094789.csv"),
        "STATION,DATE,TMP\n74486094789,2023-07-02T00:00:00,\"+0300,1\"\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("noise.csv"),
        "unique_key,created_date\n1,2023-07-01 20:00:00\n",
    )
    .unwrap();

    let config = config_in(dir.path());
    JoinProcessor::new(config.clone())
        .unwrap()
        .with_progress(false)
        .run_all()
        .unwrap();

    let records = load_canonical(&config.paths.canonical_output).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].created_hour,
        NaiveDate::from_ymd_opt(2023, 7, 1)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap()
    );
    assert_eq!(records[0].temperature_c, Some(30.0));

    let series = build_series(&records, 5);
    let evening = series.get(DayPart::Evening).unwrap();
    assert_eq!(evening.bins.len(), 1);
    assert_eq!(evening.bins[0].bin_c, 30);
    assert_eq!(evening.bins[0].complaints, 1);

    let csv = render(&series, ReportFormat::Csv).unwrap();
    assert_eq!(csv, "day_part,temperature_bin_c,complaints\nEvening,30,1\n");
}

#[test]
fn test_winter_offset_and_year_filter() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("74486094789.csv"),
        "STATION,DATE,TMP,DEW,SLP\n\
         74486094789,2023-01-01T03:00:00,\"+0050,1\",\"+0010,1\",\"10150,1\"\n\
         74486094789,2023-01-15T13:51:00,\"-0010,1\",\"-0080,1\",\"10201,1\"\n\
         74486094789,2023-01-15T13:55:00,\"-0014,1\",\"+9999,9\",\"99999,9\"\n\
         74486094789,2024-01-01T04:00:00,\"+0020,1\",\"+0000,1\",\"10180,1\"\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("noise.csv"),
        "unique_key,created_date\n\
         10,01/15/2023 08:59:59 AM\n\
         11,2023-12-31 23:30:00\n",
    )
    .unwrap();

    let config = config_in(dir.path());
    let processor = JoinProcessor::new(config.clone()).unwrap().with_progress(false);
    let weather = processor.prepare_weather().unwrap();

    // 2023-01-01 03:00 UTC is 2022 locally; 2024-01-01 04:00 UTC is 23:00 on New Year's Eve
    assert_eq!(weather.stats.out_of_year, 1);
    let hours: Vec<_> = weather.hours.iter().map(|h| h.hour.to_string()).collect();
    assert_eq!(hours, vec!["2023-01-15 08:00:00", "2023-12-31 23:00:00"]);
    assert_eq!(weather.hours[0].air_temp_c, Some(-1.2));
    assert_eq!(weather.hours[0].dew_point_c, Some(-8.0));
    assert_eq!(weather.hours[0].observation_count, 2);

    let prepared = processor
        .prepare_join(&weather.hours, Some(weather.station_id.clone()))
        .unwrap();
    assert_eq!(prepared.joined.len(), 2);
    assert_eq!(prepared.joined[1].air_temp_c, Some(2.0));
    assert_eq!(prepared.contract.coverage_percent, "100.00%");
}

#[test]
fn test_declared_complaint_zone_changes_the_match() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("74486094789.csv"),
        "STATION,DATE,TMP\n74486094789,2023-07-02T00:00:00,\"+0300,1\"\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("noise.csv"),
        "unique_key,created_date\n1,2023-07-02 00:00:00\n",
    )
    .unwrap();

    // Read as UTC the complaint is 20:00 local and matches
    let config = config_in(dir.path()).with_complaint_zone(SourceZone::Utc);
    let processor = JoinProcessor::new(config).unwrap().with_progress(false);
    let weather = processor.prepare_weather().unwrap();
    let prepared = processor.prepare_join(&weather.hours, None).unwrap();
    assert_eq!(prepared.joined[0].air_temp_c, Some(30.0));

    // Read as local wall-clock it is midnight and has no weather hour
    let config = config_in(dir.path()).with_max_missing_pct(100.0);
    let processor = JoinProcessor::new(config).unwrap().with_progress(false);
    let prepared = processor.prepare_join(&weather.hours, None).unwrap();
    assert_eq!(prepared.joined[0].air_temp_c, None);
    assert_eq!(prepared.contract.coverage_percent, "0.00%");
}

#[test]
fn test_duplicate_hourly_rows_block_the_join_stage() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("out")).unwrap();
    fs::write(
        dir.path().join("out/hourly.csv"),
        "hour,air_temp_c\n2023-07-01 20:00:00,30.0\n2023-07-01 20:00:00,29.0\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("noise.csv"),
        "unique_key,created_date\n1,2023-07-01 20:00:00\n",
    )
    .unwrap();

    let config = config_in(dir.path());
    let err = JoinProcessor::new(config.clone())
        .unwrap()
        .with_progress(false)
        .run_join()
        .unwrap_err();
    assert_eq!(err.invariant_name(), Some(UNIQUE_HOUR));
    assert!(!config.paths.canonical_output.exists());
}

#[test]
fn test_hour_in_following_year_is_fatal() {
    let hour = |y, m, d, h| {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    };
    let hours = vec![
        HourlyWeather::empty(hour(2023, 12, 31, 23)),
        HourlyWeather::empty(hour(2024, 1, 1, 0)),
    ];
    let err = check_year_bound(&hours, 2023).unwrap_err();
    assert_eq!(err.invariant_name(), Some(YEAR_BOUND));
}

#[test]
fn test_json_report_discloses_coverage() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("canonical.csv");
    fs::write(
        &path,
        "complaint_id,created_at,created_hour,temperature_c\n\
         1,2023-07-01 09:05:00,2023-07-01 09:00:00,21.0\n\
         2,2023-07-01 18:05:00,2023-07-01 18:00:00,\n",
    )
    .unwrap();

    let series = build_series(&load_canonical(&path).unwrap(), 3);
    let json: serde_json::Value =
        serde_json::from_str(&render(&series, ReportFormat::Json).unwrap()).unwrap();
    assert_eq!(json["coverage_percent"], "50.00%");
    assert_eq!(json["coverage"]["total"], 2);
    assert_eq!(json["series"][0]["day_part"], "Day");
    assert_eq!(json["series"][0]["bins"][0]["bin_c"], 21);
}
