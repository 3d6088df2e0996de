//! Report Data Structures

use chrono::{DateTime, Utc};
use liftbench_accuracy::AccuracyResult;
use liftbench_stats::MemoryProfile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Report metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub schema_version: u32,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub git_commit: Option<String>,
    pub system: SystemInfo,
    /// Detected version string per tool name
    #[serde(default)]
    pub tool_versions: BTreeMap<String, String>,
}

/// System information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub os_version: String,
    pub arch: String,
    pub cpu: String,
    pub cpu_cores: u32,
    pub memory_gb: f64,
}

/// Outcome of benchmarking one tool on one format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub tool: String,
    pub format: String,
    pub input_records: usize,
    /// Headline time: the warm-start mean
    pub execution_time_sec: f64,
    pub cold_start_time_sec: f64,
    pub warm_start_time_sec: f64,
    /// Median of the successful warm runs
    #[serde(default)]
    pub median_time_sec: f64,
    /// Sample standard deviation of the successful warm runs
    #[serde(default)]
    pub time_std_dev_sec: f64,
    /// Cold run first, then every successful warm run
    pub all_times: Vec<f64>,
    pub peak_rss_mb: f64,
    pub throughput_records_per_sec: f64,
    pub exit_code: i32,
    pub supported: bool,
    pub success: bool,
    pub error_message: String,
    pub output_records: usize,
    pub unmapped_records: usize,
    pub warnings: Vec<String>,
}

impl BenchmarkResult {
    /// Empty result for `tool` on `format`, marked supported but not yet successful.
    pub fn new(tool: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            format: format.into(),
            input_records: 0,
            execution_time_sec: 0.0,
            cold_start_time_sec: 0.0,
            warm_start_time_sec: 0.0,
            median_time_sec: 0.0,
            time_std_dev_sec: 0.0,
            all_times: Vec::new(),
            peak_rss_mb: 0.0,
            throughput_records_per_sec: 0.0,
            exit_code: 0,
            supported: true,
            success: false,
            error_message: String::new(),
            output_records: 0,
            unmapped_records: 0,
            warnings: Vec::new(),
        }
    }

    /// Result for a tool that cannot process `format`; nothing was run.
    pub fn unsupported(tool: impl Into<String>, format: impl Into<String>) -> Self {
        let mut result = Self::new(tool, format);
        result.supported = false;
        result.error_message = format!("Format {} not supported", result.format);
        result
    }

    /// Result for a tool that failed before or during its cold run.
    pub fn failed(
        tool: impl Into<String>,
        format: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        let mut result = Self::new(tool, format);
        result.error_message = error_message.into();
        result.exit_code = -1;
        result
    }

    /// Pass/fail/skip classification for summaries.
    pub fn status(&self) -> BenchmarkStatus {
        if !self.supported {
            BenchmarkStatus::Skipped
        } else if self.success {
            BenchmarkStatus::Passed
        } else {
            BenchmarkStatus::Failed
        }
    }
}

/// Benchmark execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkStatus {
    Passed,
    Failed,
    Skipped,
}

/// Report summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_tools: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub warnings: usize,
}

impl ReportSummary {
    /// Tally statuses and warnings over `results`.
    pub fn from_results(results: &[BenchmarkResult]) -> Self {
        let mut summary = Self {
            total_tools: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.status() {
                BenchmarkStatus::Passed => summary.passed += 1,
                BenchmarkStatus::Failed => summary.failed += 1,
                BenchmarkStatus::Skipped => summary.skipped += 1,
            }
            summary.warnings += result.warnings.len();
        }
        summary
    }
}

/// Complete speed benchmark report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub meta: ReportMeta,
    pub input_file: String,
    pub input_size_mb: f64,
    pub chain_file: String,
    pub format: String,
    pub threads: usize,
    pub runs: usize,
    pub results: Vec<BenchmarkResult>,
    pub summary: ReportSummary,
}

/// Long-running memory stability report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryReport {
    pub meta: ReportMeta,
    pub input_file: String,
    pub input_size_mb: f64,
    pub format: String,
    pub sample_interval_sec: f64,
    pub profiles: Vec<MemoryProfile>,
}

/// Accuracy comparison report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub meta: ReportMeta,
    pub input_file: String,
    pub format: String,
    pub reference_tool: String,
    pub total_input_records: usize,
    /// Identifiers the reference tool mapped
    pub reference_mapped: usize,
    /// Identifiers the reference tool reported unmapped
    pub reference_unmapped: usize,
    pub results: Vec<AccuracyResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status() {
        let mut result = BenchmarkResult::new("fastcrossmap", "bed");
        assert_eq!(result.status(), BenchmarkStatus::Failed);
        result.success = true;
        assert_eq!(result.status(), BenchmarkStatus::Passed);
        let skipped = BenchmarkResult::unsupported("liftover", "vcf");
        assert_eq!(skipped.status(), BenchmarkStatus::Skipped);
        assert_eq!(skipped.error_message, "Format vcf not supported");
    }

    #[test]
    fn test_summary_from_results() {
        let mut passed = BenchmarkResult::new("a", "bed");
        passed.success = true;
        passed.warnings.push("leak".to_string());
        let failed = BenchmarkResult::failed("b", "bed", "Timeout after 600 seconds");
        let skipped = BenchmarkResult::unsupported("c", "bam");

        let summary = ReportSummary::from_results(&[passed, failed, skipped]);
        assert_eq!(summary.total_tools, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.warnings, 1);
    }
}
