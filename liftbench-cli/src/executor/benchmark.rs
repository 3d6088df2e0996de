//! Speed benchmarks
//!
//! Each tool gets one cold run followed by `runs - 1` warm runs, all profiled
//! for memory. A failing cold run ends the tool's benchmark; failing warm runs
//! are dropped from the timing statistics and reported as warnings.

use super::{ExecutionContext, count_records, progress_bar};
use crate::config::Workload;
use crate::tools::Tool;
use liftbench_report::BenchmarkResult;
use liftbench_stats::{MemoryProfile, summarize_times};
use std::path::Path;
use tracing::{info, warn};

/// Runs cold/warm speed benchmarks for one tool at a time.
#[derive(Debug)]
pub struct BenchmarkOrchestrator {
    ctx: ExecutionContext,
}

impl BenchmarkOrchestrator {
    /// Orchestrator sharing `ctx`.
    pub fn new(ctx: ExecutionContext) -> Self {
        Self { ctx }
    }

    /// Execution context.
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Benchmark every tool in order, showing progress.
    pub fn run_all(
        &self,
        tools: &[Tool],
        input: &Path,
        format: &str,
        num_runs: usize,
    ) -> Vec<BenchmarkResult> {
        let pb = progress_bar(tools.len());
        let results = tools
            .iter()
            .map(|&tool| {
                pb.set_message(tool.display_name());
                let result = self.run(tool, input, format, num_runs);
                pb.inc(1);
                result
            })
            .collect();
        pb.finish_with_message("Complete");
        results
    }

    /// Benchmark `tool` converting `input` with `num_runs` total runs.
    ///
    /// Never fails: every problem is folded into the returned result.
    pub fn run(&self, tool: Tool, input: &Path, format: &str, num_runs: usize) -> BenchmarkResult {
        if !tool.supports(format) {
            info!("{} does not support {}, skipping", tool.display_name(), format);
            return BenchmarkResult::unsupported(tool.name(), format);
        }

        let settings = self.ctx.settings();
        let output = self.ctx.output_path(tool, "output", format);
        let invocation = match self.ctx.prepare(tool, format, input, output) {
            Ok(invocation) => invocation,
            Err(e) => {
                warn!("{}: {}", tool.display_name(), e);
                return BenchmarkResult::failed(tool.name(), format, e.to_string());
            }
        };

        let timeout = settings.timeout_for(Workload::for_format(format));
        let interval = settings.sample_interval;
        let max_error_len = settings.max_error_len;
        let runner = self.ctx.runner();

        let mut result = BenchmarkResult::new(tool.name(), format);
        result.input_records = count_records(input, format);

        info!("{}: cold run", tool.display_name());
        let (cold, samples) = runner.run_profiled(&invocation.argv, timeout, interval);
        let cold_profile = MemoryProfile::from_run(tool.name(), &cold, samples, max_error_len);
        result.cold_start_time_sec = cold.elapsed_sec;
        result.all_times.push(cold.elapsed_sec);
        result.exit_code = cold.exit_code;

        if let Some(reason) = cold.failure_reason(max_error_len) {
            warn!("{}: cold run failed: {}", tool.display_name(), reason);
            result.execution_time_sec = cold.elapsed_sec;
            result.peak_rss_mb = cold_profile.peak_rss_mb;
            result.error_message = reason;
            return result;
        }
        if cold_profile.leak_detected {
            result.warnings.push(leak_warning("cold run", &cold_profile));
        }

        let mut warm_times = Vec::with_capacity(num_runs.saturating_sub(1));
        let mut warm_peaks = Vec::with_capacity(num_runs.saturating_sub(1));
        for run in 1..num_runs {
            info!("{}: warm run {}/{}", tool.display_name(), run, num_runs - 1);
            let (warm, samples) = runner.run_profiled(&invocation.argv, timeout, interval);
            let profile = MemoryProfile::from_run(tool.name(), &warm, samples, max_error_len);

            if let Some(reason) = warm.failure_reason(max_error_len) {
                warn!("{}: warm run {} failed: {}", tool.display_name(), run, reason);
                result.warnings.push(format!("Warm run {} failed: {}", run, reason));
                continue;
            }
            if profile.leak_detected {
                result.warnings.push(leak_warning(&format!("warm run {run}"), &profile));
            }
            warm_times.push(warm.elapsed_sec);
            warm_peaks.push(profile.peak_rss_mb);
        }
        result.all_times.extend_from_slice(&warm_times);

        if warm_times.is_empty() {
            result.warm_start_time_sec = cold.elapsed_sec;
            result.median_time_sec = cold.elapsed_sec;
            result.peak_rss_mb = cold_profile.peak_rss_mb;
        } else {
            let summary = summarize_times(&warm_times);
            result.warm_start_time_sec = summary.mean;
            result.median_time_sec = summary.median;
            result.time_std_dev_sec = summary.std_dev;
            result.peak_rss_mb = warm_peaks.iter().sum::<f64>() / warm_peaks.len() as f64;
        }
        result.execution_time_sec = result.warm_start_time_sec;
        if result.execution_time_sec > 0.0 {
            result.throughput_records_per_sec =
                result.input_records as f64 / result.execution_time_sec;
        }

        result.output_records = count_records(&invocation.output, format);
        result.unmapped_records = count_records(&invocation.unmapped, format);
        result.exit_code = 0;
        result.success = true;

        info!(
            "{}: {:.3}s, {:.1} MB peak, {} records out",
            tool.display_name(),
            result.execution_time_sec,
            result.peak_rss_mb,
            result.output_records
        );
        result
    }
}

fn leak_warning(label: &str, profile: &MemoryProfile) -> String {
    format!(
        "Memory leak detected during {}: {:.4} MB/s",
        label, profile.leak_rate_mb_per_sec
    )
}
