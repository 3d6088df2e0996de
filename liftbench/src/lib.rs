#![warn(missing_docs)]
//! # liftbench
//!
//! Benchmark and accuracy evaluation for genome coordinate liftover tools
//! (FastCrossMap, CrossMap, UCSC liftOver, FastRemap).
//!
//! - **Speed**: one cold run plus warm runs per tool, with wall-clock timeouts
//!   that kill the whole process group
//! - **Memory**: RSS/VMS of the process tree sampled on a background thread,
//!   plus regression-based leak detection
//! - **Accuracy**: every input record is tagged `ID_<n>`, so each tool's
//!   output can be compared record by record against a reference tool
//! - **Reports**: JSON, CSV and Markdown, with system metadata and tool versions
//!
//! ## Quick Start
//!
//! ```ignore
//! use liftbench::{ExecutionContext, LiftbenchConfig, BenchmarkOrchestrator, Tool};
//!
//! let settings = LiftbenchConfig::default().resolve()?;
//! let ctx = ExecutionContext::new(settings, "hg19ToHg38.over.chain.gz");
//! let results = BenchmarkOrchestrator::new(ctx)
//!     .run_all(&Tool::ALL, "peaks.bed".as_ref(), "bed", 3);
//! ```
//!
//! ## Comparing Outputs Directly
//!
//! ```ignore
//! use liftbench::{AccuracyComparator, ComparatorConfig, load_indexed};
//!
//! let reference = load_indexed("liftover_accuracy.bed".as_ref())?;
//! let test = load_indexed("fastcrossmap_accuracy.bed".as_ref())?;
//! let result = AccuracyComparator::new(ComparatorConfig::default())
//!     .compare(&test, &reference, 1000);
//! println!("identity: {:.2}%", result.identity_rate * 100.0);
//! ```

// Re-export process execution
pub use liftbench_core::{
    ExecutionResult, MemoryProbe, MemoryReading, MemorySample, MemorySampler, ProcessRunner,
    SysinfoProbe,
};

// Re-export stats
pub use liftbench_stats::{
    MemoryProfile, StabilityAnalysis, TimeSummary, analyze_stability, summarize_memory,
    summarize_times,
};

// Re-export accuracy types
pub use liftbench_accuracy::{
    AccuracyComparator, AccuracyResult, AccuracyVerdict, ComparatorConfig, Discrepancy,
    GenomicRecord, IndexedRecordSet, format_record_id, index_file, load_indexed,
    load_unmapped_ids, parse_record_id,
};

// Re-export reports
pub use liftbench_report::{
    AccuracyReport, BenchmarkReport, BenchmarkResult, MemoryReport, OutputFormat,
    generate_benchmark_csv, generate_json_report, load_json_report, read_benchmark_csv,
};

// Re-export the driver
pub use liftbench_cli::{
    AccuracyPipeline, BenchError, BenchmarkOrchestrator, Cli, ExecutionContext, LiftbenchConfig,
    MemoryStabilityProbe, RunSettings, Tool, ToolAdapter, run, run_with_cli,
};
