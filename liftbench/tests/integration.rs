//! Integration tests for liftbench
//!
//! These tests exercise the crates together: stability analysis over sample
//! series, accuracy comparison over indexed outputs, process timeouts, report
//! round-trips and the full pipelines driven through command templates.

use liftbench::{
    AccuracyComparator, AccuracyPipeline, AccuracyVerdict, BenchmarkOrchestrator, BenchmarkResult,
    ComparatorConfig, ExecutionContext, GenomicRecord, IndexedRecordSet, LiftbenchConfig,
    MemorySample, ProcessRunner, Tool, analyze_stability, generate_benchmark_csv,
    generate_json_report, load_json_report, read_benchmark_csv,
};
use std::path::Path;
use std::time::Duration;

fn series(rss: impl Fn(f64) -> f64) -> Vec<MemorySample> {
    (0..60)
        .map(|i| {
            let t = i as f64 * 0.5;
            MemorySample {
                timestamp: t,
                rss_mb: rss(t),
                vms_mb: rss(t) * 2.0,
            }
        })
        .collect()
}

fn records(lines: &[&str]) -> IndexedRecordSet {
    IndexedRecordSet::from_records(lines.iter().filter_map(|line| GenomicRecord::parse(line)))
}

/// Constant RSS is stable with no slope
#[test]
fn test_constant_rss_is_stable() {
    let analysis = analyze_stability(&series(|_| 250.0));
    assert!(analysis.is_stable);
    assert!(!analysis.leak_detected);
    assert!(analysis.leak_rate_mb_per_sec.abs() < 1e-9);
}

/// Linear growth at 5 MB/s is flagged as a leak
#[test]
fn test_linear_growth_is_leak() {
    let analysis = analyze_stability(&series(|t| 100.0 + 5.0 * t));
    assert!(analysis.leak_detected);
    assert!(!analysis.is_stable);
    assert!((analysis.leak_rate_mb_per_sec - 5.0).abs() < 0.01);
}

/// Three records mapped identically by both tools
#[test]
fn test_identical_outputs() {
    let lines = [
        "chr1\t1000\t2000\tID_0",
        "chr1\t5000\t5500\tID_1",
        "chr2\t700\t900\tID_2",
    ];
    let result = AccuracyComparator::new(ComparatorConfig::default()).compare(
        &records(&lines),
        &records(&lines),
        3,
    );

    assert_eq!(result.identity_rate, 1.0);
    assert_eq!(result.identical, 3);
    assert_eq!(result.drift_zero, 3);
    assert_eq!(result.drift_one, 0);
    assert_eq!(result.drift_small, 0);
    assert_eq!(result.drift_large, 0);
    assert!(result.warnings.is_empty());
}

/// A record split in two by the test tool is a partial match
#[test]
fn test_split_record_is_partial_match() {
    let reference = records(&["chr1\t1000\t2000\tID_0", "chr1\t5000\t5500\tID_1"]);
    let test = records(&[
        "chr1\t1000\t1400\tID_0",
        "chr1\t1500\t2000\tID_0",
        "chr1\t5000\t5500\tID_1",
    ]);
    let result = AccuracyComparator::new(ComparatorConfig::default()).compare(&test, &reference, 2);

    assert_eq!(result.verdict(0), Some(AccuracyVerdict::PartialMatch));
    assert_eq!(result.verdict(1), Some(AccuracyVerdict::Identical));
    assert_eq!(result.identical, 1);
    assert_eq!(result.identity_rate, 0.5);
    assert!(result.discrepancies.iter().any(|d| d.field == "piece_count"));
}

/// A process that outlives its timeout is killed and reported
#[cfg(unix)]
#[test]
fn test_timeout_kills_process() {
    let runner = ProcessRunner::new().with_term_grace(Duration::from_millis(100));
    let argv = vec!["sleep".to_string(), "30".to_string()];
    let result = runner.run(&argv, Duration::from_millis(400));

    assert!(result.timed_out);
    assert_eq!(result.exit_code, -1);
    assert_eq!(result.elapsed_sec, 0.4);
}

/// Spawning a binary that does not exist is an exit code, not a panic
#[test]
fn test_missing_binary_exit_code() {
    let argv = vec!["liftbench-definitely-missing".to_string()];
    let result = ProcessRunner::new().run(&argv, Duration::from_secs(5));
    assert_eq!(result.exit_code, 127);
    assert!(!result.timed_out);
}

/// JSON and CSV reload to the same tool, time and peak memory
#[test]
fn test_report_round_trip() {
    let mut fast = BenchmarkResult::new("fastcrossmap", "bed");
    fast.success = true;
    fast.execution_time_sec = 0.123456789;
    fast.peak_rss_mb = 48.75;
    fast.all_times = vec![0.2, 0.123456789];
    let slow = BenchmarkResult::failed("crossmap", "bed", "Timeout after 600 seconds");
    let results = vec![fast, slow];

    let json = generate_json_report(&results).expect("json");
    let from_json: Vec<BenchmarkResult> = load_json_report(&json).expect("load json");
    let csv = generate_benchmark_csv(&results).expect("csv");
    let from_csv = read_benchmark_csv(&csv).expect("load csv");

    for reloaded in [&from_json, &from_csv] {
        assert_eq!(reloaded.len(), results.len());
        for (original, copy) in results.iter().zip(reloaded.iter()) {
            assert_eq!(copy.tool, original.tool);
            assert_eq!(copy.execution_time_sec, original.execution_time_sec);
            assert_eq!(copy.peak_rss_mb, original.peak_rss_mb);
        }
    }
}

#[cfg(unix)]
fn context(dir: &Path, templates: &[(Tool, &str)]) -> ExecutionContext {
    let mut settings = LiftbenchConfig::default().resolve().expect("defaults");
    settings.output_dir = dir.join("out");
    settings.sample_interval = Duration::from_millis(5);
    settings.short_timeout = Duration::from_millis(500);
    for (tool, template) in templates {
        settings.templates.insert(*tool, template.to_string());
    }
    ExecutionContext::new(settings, dir.join("hg19ToHg38.over.chain"))
}

#[cfg(unix)]
fn write_bed(dir: &Path) -> std::path::PathBuf {
    let input = dir.join("peaks.bed");
    std::fs::write(
        &input,
        "track name=peaks\nchr1\t1000\t2000\nchr1\t5000\t5500\nchr2\t700\t900\n",
    )
    .expect("write input");
    input
}

/// A hanging tool fails on its own; the rest of the suite still runs
#[cfg(unix)]
#[test]
fn test_orchestrator_isolates_failures() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = write_bed(dir.path());
    let ctx = context(
        dir.path(),
        &[
            (Tool::FastCrossMap, "cp {input} {output}"),
            (Tool::CrossMap, "sleep 30"),
        ],
    );

    let results = BenchmarkOrchestrator::new(ctx).run_all(&Tool::ALL, &input, "bed", 2);
    assert_eq!(results.len(), 4);
    assert_eq!(
        results.iter().map(|r| r.tool.as_str()).collect::<Vec<_>>(),
        vec!["fastcrossmap", "crossmap", "liftover", "fastremap"]
    );

    let fast = &results[0];
    assert!(fast.success, "{}", fast.error_message);
    assert_eq!(fast.input_records, 3);
    assert_eq!(fast.output_records, 3);
    if fast.execution_time_sec > 0.0 {
        let expected = fast.input_records as f64 / fast.execution_time_sec;
        assert!((fast.throughput_records_per_sec - expected).abs() < 1e-6);
    }

    let hung = &results[1];
    assert!(!hung.success);
    assert_eq!(hung.exit_code, -1);
    assert_eq!(hung.error_message, "Timeout after 0.5 seconds");
}

/// Index, run two tools through templates, compare
#[cfg(unix)]
#[test]
fn test_accuracy_pipeline_end_to_end() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = write_bed(dir.path());
    let ctx = context(
        dir.path(),
        &[
            (Tool::LiftOver, "cp {input} {output}"),
            (Tool::FastCrossMap, "cp {input} {output}"),
            (Tool::FastRemap, "touch {output}"),
        ],
    );

    let outcome = AccuracyPipeline::new(ctx)
        .run(
            &input,
            "bed",
            Tool::LiftOver,
            &[Tool::FastCrossMap, Tool::FastRemap],
        )
        .expect("pipeline");

    assert_eq!(outcome.total_input_records, 3);
    assert_eq!(outcome.reference_mapped, 3);
    assert_eq!(outcome.results.len(), 2);

    let identical = &outcome.results[0];
    assert_eq!(identical.test_tool, "fastcrossmap");
    assert_eq!(identical.identity_rate, 1.0);
    assert_eq!(identical.drift_zero, 3);

    let empty = &outcome.results[1];
    assert_eq!(empty.test_tool, "fastremap");
    assert_eq!(empty.missing_in_test, 3);
    assert_eq!(empty.identity_rate, 0.0);
    assert_eq!(empty.mapping_rate, 0.0);
    assert!(!empty.warnings.is_empty());
}
