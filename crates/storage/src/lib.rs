//! Storage Layer
//!
//! Appends finished measurement tables to a CSV file. Owns the file
//! lifecycle: header bootstrap, overwrite/append policy, and the
//! frame-count limit. The pipeline core only produces tables and never
//! learns how many were persisted.

mod writer;

pub use writer::{MeasurementWriter, StorageConfig};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The measurement file already exists and overwriting is disabled
    #[error("measurement file {0} already exists and overwrite is disabled")]
    FileExists(String),

    /// Filesystem failure while creating or appending the file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
