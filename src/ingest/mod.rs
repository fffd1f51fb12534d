//! Raw ingestors for the flat-file inputs.
//!
//! Every input is read through [`CsvTable`], which loads the file with polars
//! as all-string columns (leading zeros in ISD codes and ZIPs survive) and
//! fails fast with the path and column names when the schema is incomplete.

pub mod complaints;
pub mod hourly;
pub mod weather;

pub use complaints::{ComplaintIngest, read_complaints};
pub use hourly::{read_hourly, read_hourly_rows};
pub use weather::{WeatherIngest, read_weather};

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A CSV file loaded as string columns
#[derive(Debug, Clone)]
pub struct CsvTable {
    path: PathBuf,
    frame: DataFrame,
}

impl CsvTable {
    /// Read a comma-separated file with a header row
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        debug!(
            "Read {} rows x {} columns from {}",
            frame.height(),
            frame.width(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            frame,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// First of `candidates` present in the file
    pub fn find_column(&self, candidates: &[&str]) -> Option<String> {
        candidates
            .iter()
            .find(|name| self.has_column(name))
            .map(|name| name.to_string())
    }

    /// First column whose name matches `pattern`
    pub fn find_column_matching(&self, pattern: &Regex) -> Option<String> {
        self.column_names()
            .into_iter()
            .find(|name| pattern.is_match(name))
    }

    /// Fail with every missing column named at once
    pub fn require(&self, columns: &[&str]) -> Result<()> {
        let missing: Vec<String> = columns
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(self.missing_columns(missing))
        }
    }

    pub(crate) fn missing_columns(&self, columns: Vec<String>) -> PipelineError {
        PipelineError::MissingColumns {
            path: self.path.clone(),
            columns,
        }
    }

    /// Trimmed values of a column; empty cells become `None`
    pub fn strings(&self, name: &str) -> Result<Vec<Option<String>>> {
        let series = self
            .frame
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let values = series.str()?;

        Ok(values
            .into_iter()
            .map(|value| {
                value
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
            .collect())
    }

    /// Like [`CsvTable::strings`], but an absent column yields all `None`
    pub fn optional_strings(&self, name: &str) -> Result<Vec<Option<String>>> {
        if self.has_column(name) {
            self.strings(name)
        } else {
            Ok(vec![None; self.height()])
        }
    }
}
