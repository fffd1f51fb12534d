//! Integration tests for the processor module
//!
//! Runs the full pipeline against small ISD and 311 fixtures written to a
//! temporary directory.


use crate::config::PipelineConfig;
use std::fs;
use tempfile::TempDir;

/// Raw ISD export for KJFK: two July hours plus one row that is 2024 locally
pub const WEATHER_CSV: &str = "\
STATION,DATE,SOURCE,TMP,DEW,SLP
74486094789,2023-07-02T00:51:00,7,\"+0300,1\",\"+0211,1\",\"10132,1\"
74486094789,2023-07-02T01:51:00,7,\"+0250,1\",\"+0200,1\",\"99999,9\"
74486094789,2024-01-01T06:00:00,7,\"-0010,1\",\"-0050,1\",\"10200,1\"
";

/// Complaints in local wall-clock time, mixing both export layouts
pub const COMPLAINTS_CSV: &str = "\
unique_key,created_date,complaint_type,descriptor,location_type,incident_zip,borough
1,2023-07-01 20:15:00,Noise - Residential,Loud Music/Party,Residential Building/House,11201,BROOKLYN
2,07/01/2023 08:45:00 PM,Noise - Residential,Banging/Pounding,Residential Building/House,11215,BROOKLYN
3,2023-07-01T21:30:00.000,Noise - Residential,Loud Talking,Residential Building/House,11211,BROOKLYN
";

/// Write the fixtures and point a config at them
pub fn fixture(weather: &str, complaints: &str) -> (TempDir, PipelineConfig) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("weather.csv"), weather).unwrap();
    fs::write(dir.path().join("complaints.csv"), complaints).unwrap();

    let out = dir.path().join("out");
    let config = PipelineConfig::default()
        .with_weather_input(dir.path().join("weather.csv"))
        .with_complaints_input(dir.path().join("complaints.csv"))
        .with_hourly_output(out.join("hourly.csv"))
        .with_joined_output(out.join("joined.csv"))
        .with_canonical_output(out.join("canonical.csv"));
    (dir, config)
}
