//! CSV Output
//!
//! Benchmark results are flattened to one row per tool; list-valued fields are
//! joined into a single cell (`all_times` with `;`, `warnings` with ` | `).

use crate::ReportError;
use crate::report::BenchmarkResult;
use liftbench_accuracy::AccuracyResult;
use liftbench_core::MemorySample;
use serde::{Deserialize, Serialize};

const TIMES_SEPARATOR: &str = ";";
const WARNINGS_SEPARATOR: &str = " | ";

#[derive(Debug, Serialize, Deserialize)]
struct BenchmarkRow {
    tool: String,
    format: String,
    supported: bool,
    success: bool,
    input_records: usize,
    execution_time_sec: f64,
    cold_start_time_sec: f64,
    warm_start_time_sec: f64,
    median_time_sec: f64,
    time_std_dev_sec: f64,
    all_times: String,
    peak_rss_mb: f64,
    throughput_records_per_sec: f64,
    exit_code: i32,
    output_records: usize,
    unmapped_records: usize,
    error_message: String,
    warnings: String,
}

impl From<&BenchmarkResult> for BenchmarkRow {
    fn from(result: &BenchmarkResult) -> Self {
        Self {
            tool: result.tool.clone(),
            format: result.format.clone(),
            supported: result.supported,
            success: result.success,
            input_records: result.input_records,
            execution_time_sec: result.execution_time_sec,
            cold_start_time_sec: result.cold_start_time_sec,
            warm_start_time_sec: result.warm_start_time_sec,
            median_time_sec: result.median_time_sec,
            time_std_dev_sec: result.time_std_dev_sec,
            all_times: result
                .all_times
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(TIMES_SEPARATOR),
            peak_rss_mb: result.peak_rss_mb,
            throughput_records_per_sec: result.throughput_records_per_sec,
            exit_code: result.exit_code,
            output_records: result.output_records,
            unmapped_records: result.unmapped_records,
            error_message: result.error_message.clone(),
            warnings: result.warnings.join(WARNINGS_SEPARATOR),
        }
    }
}

impl TryFrom<BenchmarkRow> for BenchmarkResult {
    type Error = ReportError;

    fn try_from(row: BenchmarkRow) -> Result<Self, Self::Error> {
        let all_times = row
            .all_times
            .split(TIMES_SEPARATOR)
            .filter(|cell| !cell.trim().is_empty())
            .map(|cell| {
                cell.trim().parse::<f64>().map_err(|_| ReportError::InvalidValue {
                    column: "all_times".to_string(),
                    value: cell.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let warnings = if row.warnings.is_empty() {
            Vec::new()
        } else {
            row.warnings
                .split(WARNINGS_SEPARATOR)
                .map(str::to_string)
                .collect()
        };

        Ok(Self {
            tool: row.tool,
            format: row.format,
            input_records: row.input_records,
            execution_time_sec: row.execution_time_sec,
            cold_start_time_sec: row.cold_start_time_sec,
            warm_start_time_sec: row.warm_start_time_sec,
            median_time_sec: row.median_time_sec,
            time_std_dev_sec: row.time_std_dev_sec,
            all_times,
            peak_rss_mb: row.peak_rss_mb,
            throughput_records_per_sec: row.throughput_records_per_sec,
            exit_code: row.exit_code,
            supported: row.supported,
            success: row.success,
            error_message: row.error_message,
            output_records: row.output_records,
            unmapped_records: row.unmapped_records,
            warnings,
        })
    }
}

/// Generate a CSV table with one row per benchmark result.
pub fn generate_benchmark_csv(results: &[BenchmarkResult]) -> Result<String, ReportError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    for result in results {
        writer.serialize(BenchmarkRow::from(result))?;
    }
    into_string(writer)
}

/// Reload benchmark results from [`generate_benchmark_csv`] output.
pub fn read_benchmark_csv(data: &str) -> Result<Vec<BenchmarkResult>, ReportError> {
    let mut reader = ::csv::Reader::from_reader(data.as_bytes());
    reader
        .deserialize::<BenchmarkRow>()
        .map(|row| BenchmarkResult::try_from(row?))
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
struct SampleRow {
    timestamp_sec: f64,
    rss_mb: f64,
    vms_mb: f64,
}

/// Generate the `timestamp_sec,rss_mb,vms_mb` series of one profiled run.
pub fn generate_samples_csv(samples: &[MemorySample]) -> Result<String, ReportError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    if samples.is_empty() {
        writer.write_record(["timestamp_sec", "rss_mb", "vms_mb"])?;
    }
    for sample in samples {
        writer.serialize(SampleRow {
            timestamp_sec: sample.timestamp,
            rss_mb: sample.rss_mb,
            vms_mb: sample.vms_mb,
        })?;
    }
    into_string(writer)
}

/// Reload a memory series from [`generate_samples_csv`] output.
pub fn read_samples_csv(data: &str) -> Result<Vec<MemorySample>, ReportError> {
    let mut reader = ::csv::Reader::from_reader(data.as_bytes());
    reader
        .deserialize::<SampleRow>()
        .map(|row| {
            let row = row?;
            Ok(MemorySample {
                timestamp: row.timestamp_sec,
                rss_mb: row.rss_mb,
                vms_mb: row.vms_mb,
            })
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct AccuracyRow<'a> {
    test_tool: &'a str,
    reference_tool: &'a str,
    total: usize,
    matched: usize,
    identical: usize,
    partial_match: usize,
    coordinate_mismatch: usize,
    missing_in_test: usize,
    identity_rate: f64,
    mapped_records: usize,
    mapping_rate: f64,
    drift_zero: usize,
    drift_one: usize,
    drift_small: usize,
    drift_large: usize,
    unmapped_total: usize,
    unmapped_matched: usize,
    unmapped_identity_rate: f64,
    discrepancies: usize,
    warnings: String,
}

/// Generate a CSV table with one row per compared tool.
pub fn generate_accuracy_csv(results: &[AccuracyResult]) -> Result<String, ReportError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    for result in results {
        writer.serialize(AccuracyRow {
            test_tool: &result.test_tool,
            reference_tool: &result.reference_tool,
            total: result.total,
            matched: result.matched,
            identical: result.identical,
            partial_match: result.partial_match,
            coordinate_mismatch: result.coordinate_mismatch,
            missing_in_test: result.missing_in_test,
            identity_rate: result.identity_rate,
            mapped_records: result.mapped_records,
            mapping_rate: result.mapping_rate,
            drift_zero: result.drift_zero,
            drift_one: result.drift_one,
            drift_small: result.drift_small,
            drift_large: result.drift_large,
            unmapped_total: result.unmapped_total,
            unmapped_matched: result.unmapped_matched,
            unmapped_identity_rate: result.unmapped_identity_rate,
            discrepancies: result.discrepancies.len(),
            warnings: result.warnings.join(WARNINGS_SEPARATOR),
        })?;
    }
    into_string(writer)
}

fn into_string(writer: ::csv::Writer<Vec<u8>>) -> Result<String, ReportError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::Csv(::csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
