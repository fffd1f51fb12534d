//! 311 complaint ingestor
//!
//! Loads the complaint export, normalizes `created_date` to local civil time and
//! floors it to the canonical hour. Descriptive columns are carried through
//! untouched when present.

use crate::constants::complaint_columns;
use crate::error::{PipelineError, Result};
use crate::ingest::CsvTable;
use crate::models::{ComplaintRecord, NormalizedComplaint, SourceZone};
use crate::normalize::{floor_to_hour, normalize_column};
use chrono_tz::Tz;
use std::path::Path;
use tracing::{debug, info};

/// Normalized complaints plus the number of rows dropped for bad timestamps
#[derive(Debug, Clone, Default)]
pub struct ComplaintIngest {
    pub complaints: Vec<NormalizedComplaint>,
    pub rows_read: usize,
    pub unparseable_timestamps: usize,
}

/// Read a complaint export and normalize its creation timestamps
pub fn read_complaints(path: &Path, zone: SourceZone, tz: Tz) -> Result<ComplaintIngest> {
    let table = CsvTable::read(path)?;

    let id_column = table.find_column(complaint_columns::ID_CANDIDATES);
    let created_column = table.find_column(complaint_columns::CREATED_CANDIDATES);
    let (Some(id_column), Some(created_column)) = (id_column.clone(), created_column.clone())
    else {
        let mut missing = Vec::new();
        if id_column.is_none() {
            missing.push(complaint_columns::ID_CANDIDATES.join("|"));
        }
        if created_column.is_none() {
            missing.push(complaint_columns::CREATED_CANDIDATES.join("|"));
        }
        return Err(table.missing_columns(missing));
    };
    debug!(
        "Complaint columns in {}: id={}, created={}",
        path.display(),
        id_column,
        created_column
    );

    let ids = table.strings(&id_column)?;
    let created = table.strings(&created_column)?;
    let complaint_types = table.optional_strings(complaint_columns::COMPLAINT_TYPE)?;
    let descriptors = table.optional_strings(complaint_columns::DESCRIPTOR)?;
    let location_types = table.optional_strings(complaint_columns::LOCATION_TYPE)?;
    let zips = table.optional_strings(complaint_columns::INCIDENT_ZIP)?;
    let boroughs = table.optional_strings(complaint_columns::BOROUGH)?;
    let latitudes = table.optional_strings(complaint_columns::LATITUDE)?;
    let longitudes = table.optional_strings(complaint_columns::LONGITUDE)?;

    let normalized = normalize_column(created.iter().map(|v| v.as_deref()), zone, tz);

    let mut complaints = Vec::with_capacity(table.height() - normalized.dropped);
    for (row, local) in normalized.local.iter().enumerate() {
        let Some(local) = local else {
            continue;
        };
        let record = ComplaintRecord {
            // An empty id is kept so the natural-key check can reject the table
            complaint_id: ids[row].clone().unwrap_or_default(),
            created_at: created[row].clone().unwrap_or_default(),
            complaint_type: complaint_types[row].clone(),
            descriptor: descriptors[row].clone(),
            location_type: location_types[row].clone(),
            incident_zip: zips[row].clone(),
            borough: boroughs[row].clone(),
            latitude: latitudes[row].as_deref().and_then(|v| v.parse().ok()),
            longitude: longitudes[row].as_deref().and_then(|v| v.parse().ok()),
        };
        complaints.push(NormalizedComplaint {
            record,
            created_at: *local,
            hour: floor_to_hour(*local),
        });
    }

    if complaints.is_empty() {
        return Err(PipelineError::NoValidRows {
            path: path.to_path_buf(),
            stage: "complaint timestamp normalization".to_string(),
            dropped: normalized.dropped,
        });
    }

    info!(
        "Read {} complaints from {} ({} dropped for unparseable {})",
        complaints.len(),
        path.display(),
        normalized.dropped,
        created_column
    );

    Ok(ComplaintIngest {
        complaints,
        rows_read: table.height(),
        unparseable_timestamps: normalized.dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn ny() -> Tz {
        chrono_tz::America::New_York
    }

    fn write(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("complaints.csv");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reads_open_data_export() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "unique_key,created_date,complaint_type,descriptor,borough,incident_zip,latitude\n\
             58000001,07/01/2023 08:15:42 PM,Noise - Residential,Loud Music/Party,BROOKLYN,11201,40.69\n\
             58000002,2023-07-01T21:59:59.000,Noise - Residential,Banging/Pounding,BROOKLYN,,\n",
        );

        let ingest = read_complaints(&path, SourceZone::LocalNaive, ny()).unwrap();
        assert_eq!(ingest.rows_read, 2);
        assert_eq!(ingest.unparseable_timestamps, 0);

        let first = &ingest.complaints[0];
        assert_eq!(first.record.complaint_id, "58000001");
        assert_eq!(first.record.descriptor.as_deref(), Some("Loud Music/Party"));
        assert_eq!(first.record.incident_zip.as_deref(), Some("11201"));
        assert_eq!(first.record.latitude, Some(40.69));
        assert_eq!(
            first.hour,
            NaiveDate::from_ymd_opt(2023, 7, 1).unwrap().and_hms_opt(20, 0, 0).unwrap()
        );

        let second = &ingest.complaints[1];
        assert_eq!(second.record.incident_zip, None);
        assert_eq!(
            second.hour,
            NaiveDate::from_ymd_opt(2023, 7, 1).unwrap().and_hms_opt(21, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_alternate_column_names() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "complaint_id,created_at\nc-1,2023-01-01 00:30:00\n");
        let ingest = read_complaints(&path, SourceZone::LocalNaive, ny()).unwrap();
        assert_eq!(ingest.complaints[0].record.complaint_id, "c-1");
        assert_eq!(ingest.complaints[0].record.borough, None);
    }

    #[test]
    fn test_utc_declared_complaints_are_shifted() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "unique_key,created_date\n1,2023-07-02T00:10:00\n");
        let ingest = read_complaints(&path, SourceZone::Utc, ny()).unwrap();
        assert_eq!(
            ingest.complaints[0].hour,
            NaiveDate::from_ymd_opt(2023, 7, 1).unwrap().and_hms_opt(20, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_unparseable_timestamps_are_dropped_and_counted() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "unique_key,created_date\n1,2023-07-01 20:00:00\n2,yesterday\n3,\n",
        );
        let ingest = read_complaints(&path, SourceZone::LocalNaive, ny()).unwrap();
        assert_eq!(ingest.rows_read, 3);
        assert_eq!(ingest.complaints.len(), 1);
        assert_eq!(ingest.unparseable_timestamps, 2);
    }

    #[test]
    fn test_all_rows_dropped_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "unique_key,created_date\n1,never\n");
        let err = read_complaints(&path, SourceZone::LocalNaive, ny()).unwrap_err();
        assert!(matches!(err, PipelineError::NoValidRows { dropped: 1, .. }));
    }

    #[test]
    fn test_missing_key_columns() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "id,when\n1,2023-07-01 20:00:00\n");
        match read_complaints(&path, SourceZone::LocalNaive, ny()).unwrap_err() {
            PipelineError::MissingColumns { columns, .. } => {
                assert_eq!(
                    columns,
                    vec![
                        "unique_key|complaint_id".to_string(),
                        "created_date|created_at".to_string()
                    ]
                );
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }
}
