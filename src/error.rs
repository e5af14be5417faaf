//! Error types for SWAT result extraction.
//!
//! Every failure stops the current extraction call. Callers that can live with
//! partial results (the validator, the performance harness) decide whether to
//! carry on with the next combination.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::{DataReadingMethod, UnitType};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid model settings in {path} (line {line}): {reason}")]
    Config {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Invalid field in {path} (line {line}): {reason}")]
    Format {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Wrong SQLite query: {sql}")]
    Query {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Couldn't find column {column} for {unit}")]
    UnknownColumn { unit: UnitType, column: String },

    #[error("{backend} doesn't support {unit}")]
    UnsupportedUnit { backend: &'static str, unit: UnitType },

    #[error(
        "Wrong number of records from {unit} {method} on column {column} and id {id}: expected {expected}, found {found}"
    )]
    RecordCount {
        unit: UnitType,
        method: DataReadingMethod,
        column: String,
        id: i64,
        expected: usize,
        found: usize,
    },

    #[error("The number of rows are different: {reference} in reference, {candidate} in candidate")]
    RowCountMismatch { reference: usize, candidate: usize },

    #[error("The SQLite database doesn't exist: {path}")]
    MissingDatabase { path: PathBuf },

    #[error("Output file doesn't exist: {path}")]
    MissingOutputFile { path: PathBuf },

    #[error("The SQLite extractor is not connected, call open() first")]
    NotConnected,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Timing for {operation} was never recorded")]
    TimingUnset { operation: String },
}

pub type Result<T> = std::result::Result<T, ExtractError>;
