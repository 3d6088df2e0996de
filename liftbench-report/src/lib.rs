#![warn(missing_docs)]
//! liftbench Report - Result Export
//!
//! Generates and reloads the persisted forms of a run:
//! - JSON (full report, machine-readable)
//! - CSV (flat benchmark rows, accuracy rows, memory sample series)
//! - Markdown (accuracy discrepancy listing)

mod csv;
mod json;
mod markdown;
mod report;

pub use self::csv::{
    generate_accuracy_csv, generate_benchmark_csv, generate_samples_csv, read_benchmark_csv,
    read_samples_csv,
};
pub use json::{generate_json_report, load_json_report};
pub use markdown::generate_discrepancy_markdown;
pub use report::{
    AccuracyReport, BenchmarkReport, BenchmarkResult, BenchmarkStatus, MemoryReport, ReportMeta,
    ReportSummary, SystemInfo,
};

use thiserror::Error;

/// Current report schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Failure generating or loading a report
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV (de)serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    /// A CSV cell could not be converted back into its typed value
    #[error("invalid CSV value in column {column}: {value}")]
    InvalidValue {
        /// Column name
        column: String,
        /// Offending cell
        value: String,
    },
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable terminal tables
    Human,
    /// JSON with full schema
    Json,
    /// CSV for spreadsheets
    Csv,
    /// Markdown (accuracy discrepancy listing)
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Human));
        assert_eq!("md".parse::<OutputFormat>(), Ok(OutputFormat::Markdown));
        assert!("html".parse::<OutputFormat>().is_err());
    }
}
