//! Per-run memory profile

use crate::stability::analyze_stability;
use crate::summary::summarize_memory;
use liftbench_core::{ExecutionResult, MemorySample};
use serde::{Deserialize, Serialize};

/// Memory behaviour of one profiled tool invocation.
///
/// Built once from an [`ExecutionResult`] and its sample series; never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryProfile {
    /// Tool name
    pub tool: String,
    /// Highest RSS observed (MB)
    pub peak_rss_mb: f64,
    /// Mean RSS (MB)
    pub avg_rss_mb: f64,
    /// Lowest RSS observed (MB)
    pub min_rss_mb: f64,
    /// Highest RSS observed (MB)
    pub max_rss_mb: f64,
    /// Full sample series
    pub samples: Vec<MemorySample>,
    /// Stability verdict
    pub is_stable: bool,
    /// Whether RSS grew faster than the leak threshold
    pub leak_detected: bool,
    /// Least-squares RSS growth rate (MB/s)
    pub leak_rate_mb_per_sec: f64,
    /// Wall-clock time of the run (seconds)
    pub execution_time_sec: f64,
    /// Exit code of the run
    pub exit_code: i32,
    /// Failure description, empty on success
    pub error_message: String,
}

impl MemoryProfile {
    /// Derive a profile from a finished run.
    ///
    /// `max_error_len` bounds how much stderr is kept in `error_message`.
    pub fn from_run(
        tool: impl Into<String>,
        execution: &ExecutionResult,
        samples: Vec<MemorySample>,
        max_error_len: usize,
    ) -> Self {
        let summary = summarize_memory(&samples);
        let stability = analyze_stability(&samples);

        Self {
            tool: tool.into(),
            peak_rss_mb: summary.peak_rss_mb,
            avg_rss_mb: summary.avg_rss_mb,
            min_rss_mb: summary.min_rss_mb,
            max_rss_mb: summary.max_rss_mb,
            samples,
            is_stable: stability.is_stable,
            leak_detected: stability.leak_detected,
            leak_rate_mb_per_sec: stability.leak_rate_mb_per_sec,
            execution_time_sec: execution.elapsed_sec,
            exit_code: execution.exit_code,
            error_message: execution.failure_reason(max_error_len).unwrap_or_default(),
        }
    }

    /// Profile for a tool that was never run.
    pub fn not_run(tool: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            peak_rss_mb: 0.0,
            avg_rss_mb: 0.0,
            min_rss_mb: 0.0,
            max_rss_mb: 0.0,
            samples: Vec::new(),
            is_stable: true,
            leak_detected: false,
            leak_rate_mb_per_sec: 0.0,
            execution_time_sec: 0.0,
            exit_code: -1,
            error_message: error_message.into(),
        }
    }

    /// True when the run exited cleanly.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && self.error_message.is_empty()
    }
}
