//! Benchmark error taxonomy
//!
//! Per-tool failures are folded into result rows by the orchestrator; these
//! values only escape when a whole pipeline cannot proceed (for example a
//! failed reference tool in an accuracy run).

use liftbench_accuracy::RecordError;
use liftbench_core::{ExecutionResult, format_seconds};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing or running a tool
#[derive(Debug, Error)]
pub enum BenchError {
    /// The tool cannot process the requested input format
    #[error("{tool} does not support format '{format}'")]
    UnsupportedFormat { tool: String, format: String },

    /// The process exceeded its wall-clock timeout and was killed
    #[error("{tool}: Timeout after {} seconds", seconds(.timeout_sec))]
    ProcessTimeout { tool: String, timeout_sec: f64 },

    /// The process exited with a nonzero code
    #[error("{tool} failed with exit code {exit_code}: {stderr}")]
    ProcessFailure {
        tool: String,
        exit_code: i32,
        stderr: String,
    },

    /// A prerequisite (e.g. an uncompressed chain file) could not be provided
    #[error("required resource {path} unavailable: {reason}")]
    ResourceUnavailable { path: PathBuf, reason: String },

    /// A command template could not be parsed
    #[error("invalid command template for {tool}: {reason}")]
    InvalidTemplate { tool: String, reason: String },

    /// The reference tool produced no mapped records to compare against
    #[error("reference tool {tool} produced no output records")]
    EmptyReference { tool: String },

    /// Reading or writing record files failed
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Other I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Classify a finished run; `None` when it succeeded.
    pub fn from_execution(
        tool: impl Into<String>,
        execution: &ExecutionResult,
        max_error_len: usize,
    ) -> Option<Self> {
        if execution.success() {
            return None;
        }
        let tool = tool.into();
        if execution.timed_out {
            return Some(BenchError::ProcessTimeout {
                tool,
                timeout_sec: execution.elapsed_sec,
            });
        }
        Some(BenchError::ProcessFailure {
            tool,
            exit_code: execution.exit_code,
            stderr: execution.failure_reason(max_error_len).unwrap_or_default(),
        })
    }
}

fn seconds(value: &f64) -> String {
    format_seconds(*value)
}
