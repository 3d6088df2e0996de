//! Output Formatting
//!
//! Human-readable terminal output for benchmark, memory and accuracy reports.
//!
//! - Per-tool status icons (✓/✗/⊘)
//! - Timing, memory and throughput metrics
//! - Speedup table relative to CrossMap
//! - Stability verdicts and accuracy breakdowns

use crate::tools::Tool;
use liftbench_report::{AccuracyReport, BenchmarkReport, BenchmarkStatus, MemoryReport};

/// Tool whose successful run is the 1.00x speed baseline.
const SPEED_BASELINE: Tool = Tool::CrossMap;

/// Format a benchmark report for terminal display
pub fn format_benchmark_summary(report: &BenchmarkReport) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("Liftover Benchmark Results\n");
    output.push_str(&"=".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "Input: {} ({:.2} MB, {})\n",
        report.input_file, report.input_size_mb, report.format
    ));
    output.push_str(&format!(
        "Chain: {}  threads: {}  runs: {}\n\n",
        report.chain_file, report.threads, report.runs
    ));

    for result in &report.results {
        let icon = match result.status() {
            BenchmarkStatus::Passed => "✓",
            BenchmarkStatus::Failed => "✗",
            BenchmarkStatus::Skipped => "⊘",
        };
        output.push_str(&format!("  {} {}\n", icon, result.tool));

        match result.status() {
            BenchmarkStatus::Passed => {
                output.push_str(&format!(
                    "      time: {:.3} s  cold: {:.3} s  median: {:.3} s  stddev: {:.3} s\n",
                    result.execution_time_sec,
                    result.cold_start_time_sec,
                    result.median_time_sec,
                    result.time_std_dev_sec
                ));
                output.push_str(&format!(
                    "      peak RSS: {:.1} MB  throughput: {:.0} records/s\n",
                    result.peak_rss_mb, result.throughput_records_per_sec
                ));
                output.push_str(&format!(
                    "      records: {} in, {} mapped, {} unmapped\n",
                    result.input_records, result.output_records, result.unmapped_records
                ));
            }
            BenchmarkStatus::Failed | BenchmarkStatus::Skipped => {
                output.push_str(&format!("      error: {}\n", result.error_message));
            }
        }
        for warning in &result.warnings {
            output.push_str(&format!("      warning: {}\n", warning));
        }
        output.push('\n');
    }

    output.push_str(&speedup_table(report));

    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "Summary: {} passed, {} failed, {} skipped ({} warnings)\n",
        report.summary.passed, report.summary.failed, report.summary.skipped, report.summary.warnings
    ));

    output
}

fn speedup_table(report: &BenchmarkReport) -> String {
    let passed: Vec<_> = report.results.iter().filter(|r| r.success).collect();
    let Some(baseline) = passed
        .iter()
        .find(|r| r.tool == SPEED_BASELINE.name())
        .filter(|r| r.execution_time_sec > 0.0)
    else {
        return String::new();
    };

    let width = passed.iter().map(|r| r.tool.len()).max().unwrap_or(12).max(4);
    let mut output = format!("Speedup vs {}\n", SPEED_BASELINE.display_name());
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  {:<width$}  {:>12}  {:>10}\n",
        "Tool",
        "Time (s)",
        "Speedup",
        width = width
    ));
    output.push_str(&format!("  {}\n", "-".repeat(width + 26)));

    let mut sorted = passed.clone();
    sorted.sort_by(|a, b| a.execution_time_sec.total_cmp(&b.execution_time_sec));
    for result in sorted {
        let is_baseline = result.tool == baseline.tool;
        let speedup = if result.execution_time_sec > 0.0 {
            format!("{:.2}x", baseline.execution_time_sec / result.execution_time_sec)
        } else {
            "-".to_string()
        };
        output.push_str(&format!(
            "  {:<width$}  {:>12.3}  {:>10}{}\n",
            result.tool,
            result.execution_time_sec,
            speedup,
            if is_baseline { " (baseline)" } else { "" },
            width = width
        ));
    }
    output.push('\n');
    output
}

/// Format a memory stability report for terminal display
pub fn format_memory_summary(report: &MemoryReport) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("Memory Stability Results\n");
    output.push_str(&"=".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "Input: {} ({:.2} MB, {})  interval: {:.3} s\n\n",
        report.input_file, report.input_size_mb, report.format, report.sample_interval_sec
    ));

    for profile in &report.profiles {
        let icon = if profile.succeeded() { "✓" } else { "✗" };
        output.push_str(&format!("  {} {}\n", icon, profile.tool));
        if !profile.succeeded() {
            output.push_str(&format!("      error: {}\n\n", profile.error_message));
            continue;
        }

        output.push_str(&format!(
            "      peak: {:.1} MB  avg: {:.1} MB  min: {:.1} MB  samples: {}\n",
            profile.peak_rss_mb,
            profile.avg_rss_mb,
            profile.min_rss_mb,
            profile.samples.len()
        ));
        let verdict = if profile.leak_detected {
            format!("LEAK ({:.4} MB/s)", profile.leak_rate_mb_per_sec)
        } else if profile.is_stable {
            "stable".to_string()
        } else {
            format!("unstable ({:.4} MB/s)", profile.leak_rate_mb_per_sec)
        };
        output.push_str(&format!(
            "      time: {:.2} s  memory: {}\n\n",
            profile.execution_time_sec, verdict
        ));
    }

    output
}

/// Format an accuracy report for terminal display
pub fn format_accuracy_summary(report: &AccuracyReport) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("Liftover Accuracy Results\n");
    output.push_str(&"=".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "Input: {} ({} records, {})\n",
        report.input_file, report.total_input_records, report.format
    ));
    output.push_str(&format!(
        "Reference: {} ({} mapped, {} unmapped)\n\n",
        report.reference_tool, report.reference_mapped, report.reference_unmapped
    ));

    for result in &report.results {
        let icon = if result.warnings.is_empty() { "✓" } else { "✗" };
        output.push_str(&format!("  {} {}\n", icon, result.test_tool));
        output.push_str(&format!(
            "      identity: {:.2}%  mapping: {:.2}%  unmapped agreement: {:.2}%\n",
            result.identity_rate * 100.0,
            result.mapping_rate * 100.0,
            result.unmapped_identity_rate * 100.0
        ));
        output.push_str(&format!(
            "      identical: {}  partial: {}  mismatch: {}  missing: {}\n",
            result.identical, result.partial_match, result.coordinate_mismatch, result.missing_in_test
        ));
        output.push_str(&format!(
            "      drift: 0bp {}  1bp {}  2-100bp {}  >100bp {}\n",
            result.drift_zero, result.drift_one, result.drift_small, result.drift_large
        ));
        if !result.discrepancies.is_empty() {
            output.push_str(&format!("      discrepancies: {}\n", result.discrepancies.len()));
        }
        for warning in &result.warnings {
            output.push_str(&format!("      warning: {}\n", warning));
        }
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use liftbench_accuracy::AccuracyResult;
    use liftbench_report::{BenchmarkResult, ReportMeta, ReportSummary, SCHEMA_VERSION, SystemInfo};
    use liftbench_stats::MemoryProfile;
    use std::collections::BTreeMap;

    fn meta() -> ReportMeta {
        ReportMeta {
            schema_version: SCHEMA_VERSION,
            version: "0.1.0".to_string(),
            timestamp: Utc::now(),
            git_commit: None,
            system: SystemInfo {
                os: "linux".to_string(),
                os_version: "6.1".to_string(),
                arch: "x86_64".to_string(),
                cpu: "test".to_string(),
                cpu_cores: 4,
                memory_gb: 16.0,
            },
            tool_versions: BTreeMap::new(),
        }
    }

    fn passed(tool: &str, time: f64) -> BenchmarkResult {
        let mut result = BenchmarkResult::new(tool, "bed");
        result.success = true;
        result.execution_time_sec = time;
        result.all_times = vec![time];
        result
    }

    fn benchmark_report(results: Vec<BenchmarkResult>) -> BenchmarkReport {
        BenchmarkReport {
            meta: meta(),
            input_file: "in.bed".to_string(),
            input_size_mb: 1.5,
            chain_file: "hg19ToHg38.over.chain.gz".to_string(),
            format: "bed".to_string(),
            threads: 4,
            runs: 3,
            summary: ReportSummary::from_results(&results),
            results,
        }
    }

    #[test]
    fn test_benchmark_summary_icons_and_speedup() {
        let report = benchmark_report(vec![
            passed("fastcrossmap", 1.0),
            passed("crossmap", 4.0),
            BenchmarkResult::unsupported("liftover", "vcf"),
            BenchmarkResult::failed("fastremap", "bed", "Timeout after 600 seconds"),
        ]);
        let output = format_benchmark_summary(&report);

        assert!(output.contains("✓ fastcrossmap"));
        assert!(output.contains("⊘ liftover"));
        assert!(output.contains("✗ fastremap"));
        assert!(output.contains("error: Timeout after 600 seconds"));
        assert!(output.contains("Speedup vs CrossMap"));
        assert!(output.contains("4.00x"));
        assert!(output.contains("(baseline)"));
        assert!(output.contains("Summary: 2 passed, 1 failed, 1 skipped"));
    }

    #[test]
    fn test_no_speedup_without_baseline() {
        let report = benchmark_report(vec![passed("fastcrossmap", 1.0)]);
        assert!(!format_benchmark_summary(&report).contains("Speedup vs"));
    }

    #[test]
    fn test_memory_summary_verdicts() {
        let mut leaky = MemoryProfile::not_run("crossmap", "");
        leaky.exit_code = 0;
        leaky.leak_detected = true;
        leaky.is_stable = false;
        leaky.leak_rate_mb_per_sec = 5.0;
        let report = MemoryReport {
            meta: meta(),
            input_file: "reads.bam".to_string(),
            input_size_mb: 100.0,
            format: "bam".to_string(),
            sample_interval_sec: 1.0,
            profiles: vec![leaky, MemoryProfile::not_run("liftover", "Format bam not supported")],
        };
        let output = format_memory_summary(&report);
        assert!(output.contains("LEAK (5.0000 MB/s)"));
        assert!(output.contains("✗ liftover"));
        assert!(output.contains("Format bam not supported"));
    }

    #[test]
    fn test_accuracy_summary() {
        let result = AccuracyResult {
            test_tool: "fastcrossmap".to_string(),
            reference_tool: "liftover".to_string(),
            total: 4,
            identical: 3,
            missing_in_test: 1,
            identity_rate: 0.75,
            mapping_rate: 0.75,
            warnings: vec!["Identity Rate (75.00%) is below 99% threshold".to_string()],
            ..AccuracyResult::default()
        };
        let report = AccuracyReport {
            meta: meta(),
            input_file: "in.bed".to_string(),
            format: "bed".to_string(),
            reference_tool: "liftover".to_string(),
            total_input_records: 4,
            reference_mapped: 4,
            reference_unmapped: 0,
            results: vec![result],
        };
        let output = format_accuracy_summary(&report);
        assert!(output.contains("identity: 75.00%"));
        assert!(output.contains("missing: 1"));
        assert!(output.contains("warning: Identity Rate (75.00%) is below 99% threshold"));
    }
}
