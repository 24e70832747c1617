use std::path::PathBuf;
use thiserror::Error;

use super::medata::View;
use super::worker_status::WorkerStatus;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuilderError {
    #[error("Builder was given an empty histogram record table")]
    EmptyTable,
    #[error("Unrecognized monitoring element id {id} found for ME {me}")]
    UnrecognizedMEId { id: u32, me: String },
    #[error("ME {me} at lumisection {ls} has data of shape {found:?}; expected {expected:?}")]
    BadShape {
        me: String,
        ls: u32,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("ME {0} is classified as 2D but its records carry no y axis declaration")]
    MissingYAxis(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriggerRateError {
    #[error("Trigger rate vector has length {0} but the ME has {1} lumisections")]
    Length(usize, usize),
    #[error("Trigger rates are missing lumisection {0}")]
    MissingLumisection(u32),
    #[error("Keyed trigger rates were given {0} lumisection numbers but {1} rates")]
    KeyLength(usize, usize),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MEDataError {
    #[error("MEData failed to build due to Builder error: {0}")]
    BuilderError(#[from] BuilderError),
    #[error("MEData failed to normalize due to trigger rate error: {0}")]
    TriggerRateError(#[from] TriggerRateError),
    #[error("Monitoring element {0} is not present in MEData")]
    UnknownME(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid dimension: ME {0} is not 2D and has no y bins")]
    InvalidDimension(String),
    #[error("Invalid lumisection range: {0}")]
    InvalidRange(String),
    #[error("The {0} view of ME {1} has not been computed")]
    ViewNotComputed(View, String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReferenceError {
    #[error("Reference overlay failed due to MEData error: {0}")]
    MEDataError(#[from] MEDataError),
    #[error("Reference overlays are only available for 1D MEs; {0} is 2D")]
    ReferenceDimension(String),
    #[error("ME {0} has {1} bins but its reference has {2}")]
    BinMismatch(String, usize, usize),
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Could not read record table because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Record table failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Record table failed to parse JSON: {0}")]
    ParsingError(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config refers to path {0:?} which does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report failed due to MEData error: {0}")]
    MEDataError(#[from] MEDataError),
    #[error("Report failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Report failed to convert to yaml: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to record table error: {0}")]
    RecordError(#[from] RecordError),
    #[error("Processor failed due to MEData error: {0}")]
    MEDataError(#[from] MEDataError),
    #[error("Processor failed due to reference overlay error: {0}")]
    ReferenceError(#[from] ReferenceError),
    #[error("Processor failed due to Report error: {0}")]
    ReportError(#[from] ReportError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
}
