use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::RecordError;

/// The bin contents of one lumisection of a monitoring element.
///
/// 1D histograms are a flat list of `x_bin` values, 2D histograms are `x_bin` rows of
/// `y_bin` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistogramData {
    OneD(Vec<f64>),
    TwoD(Vec<Vec<f64>>),
}

impl HistogramData {
    /// The shape of the bin contents as given
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::OneD(values) => vec![values.len()],
            Self::TwoD(rows) => {
                let width = rows.first().map(|r| r.len()).unwrap_or(0);
                if rows.iter().all(|r| r.len() == width) {
                    vec![rows.len(), width]
                } else {
                    // Ragged; report every row so the mismatch is visible
                    let mut shape = vec![rows.len()];
                    shape.extend(rows.iter().map(|r| r.len()));
                    shape
                }
            }
        }
    }

    pub fn total(&self) -> f64 {
        match self {
            Self::OneD(values) => values.iter().sum(),
            Self::TwoD(rows) => rows.iter().flatten().sum(),
        }
    }
}

/// A single row of the histogram record table: one monitoring element at one lumisection.
///
/// The field names follow the histogram query service. Any extra columns the service
/// sends along (dataset, path, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramRecord {
    pub me: String,
    pub ls_number: u32,
    pub me_id: u32,
    pub entries: u64,
    pub data: HistogramData,
    pub x_min: f64,
    pub x_max: f64,
    pub x_bin: usize,
    #[serde(default)]
    pub y_min: Option<f64>,
    #[serde(default)]
    pub y_max: Option<f64>,
    #[serde(default)]
    pub y_bin: Option<usize>,
    #[serde(default)]
    pub run_number: Option<i32>,
}

/// Record tables come either as a bare array or wrapped in a paginated response
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordFile<T> {
    Rows(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> RecordFile<T> {
    fn into_rows(self) -> Vec<T> {
        match self {
            Self::Rows(rows) => rows,
            Self::Paged { results } => results,
        }
    }
}

/// Parse a JSON table of rows
pub fn parse_table<T: serde::de::DeserializeOwned>(json: &str) -> Result<Vec<T>, RecordError> {
    Ok(serde_json::from_str::<RecordFile<T>>(json)?.into_rows())
}

/// Read a JSON table of rows from a file
pub fn read_table<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, RecordError> {
    if !path.exists() {
        return Err(RecordError::BadFilePath(path.to_path_buf()));
    }
    let json_str = std::fs::read_to_string(path)?;
    parse_table(&json_str)
}

/// Read the histogram record table for a run
pub fn read_records(path: &Path) -> Result<Vec<HistogramRecord>, RecordError> {
    read_table(path)
}
