//! Record I/O errors

use std::path::PathBuf;
use thiserror::Error;

/// Failure reading or writing record files.
///
/// Malformed lines are not errors; they are skipped while parsing.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Could not open or read a record file
    #[error("failed to read {path}: {source}")]
    Read {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Could not create or write a record file
    #[error("failed to write {path}: {source}")]
    Write {
        /// File being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl RecordError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RecordError::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RecordError::Write {
            path: path.into(),
            source,
        }
    }
}
