//! Memory stability probe
//!
//! One long profiled run per tool at a coarse sampling interval, typically on
//! a large alignment file, to check whether RSS settles or keeps growing.

use super::{ExecutionContext, progress_bar};
use crate::config::Workload;
use crate::tools::Tool;
use liftbench_stats::MemoryProfile;
use std::path::Path;
use tracing::{info, warn};

/// Runs each tool once and analyzes its memory trace.
#[derive(Debug)]
pub struct MemoryStabilityProbe {
    ctx: ExecutionContext,
}

impl MemoryStabilityProbe {
    /// Probe sharing `ctx`.
    pub fn new(ctx: ExecutionContext) -> Self {
        Self { ctx }
    }

    /// Execution context.
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Profile every tool in order, showing progress.
    pub fn profile_all(&self, tools: &[Tool], input: &Path, format: &str) -> Vec<MemoryProfile> {
        let pb = progress_bar(tools.len());
        let profiles = tools
            .iter()
            .map(|&tool| {
                pb.set_message(tool.display_name());
                let profile = self.profile(tool, input, format);
                pb.inc(1);
                profile
            })
            .collect();
        pb.finish_with_message("Complete");
        profiles
    }

    /// Profile one tool.
    pub fn profile(&self, tool: Tool, input: &Path, format: &str) -> MemoryProfile {
        if !tool.supports(format) {
            info!("{} does not support {}, skipping", tool.display_name(), format);
            return MemoryProfile::not_run(tool.name(), format!("Format {} not supported", format));
        }

        let settings = self.ctx.settings();
        let output = self.ctx.output_path(tool, "memory", format);
        let invocation = match self.ctx.prepare(tool, format, input, output) {
            Ok(invocation) => invocation,
            Err(e) => {
                warn!("{}: {}", tool.display_name(), e);
                return MemoryProfile::not_run(tool.name(), e.to_string());
            }
        };

        let (execution, samples) = self.ctx.runner().run_profiled(
            &invocation.argv,
            settings.timeout_for(Workload::MemoryProbe),
            settings.probe_interval,
        );
        let profile =
            MemoryProfile::from_run(tool.name(), &execution, samples, settings.max_error_len);

        if !profile.succeeded() {
            warn!("{}: {}", tool.display_name(), profile.error_message);
        } else if profile.leak_detected {
            warn!(
                "{}: memory grows at {:.4} MB/s",
                tool.display_name(),
                profile.leak_rate_mb_per_sec
            );
        } else {
            info!(
                "{}: peak {:.1} MB over {} samples, stable={}",
                tool.display_name(),
                profile.peak_rss_mb,
                profile.samples.len(),
                profile.is_stable
            );
        }
        profile
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::executor::test_support;

    fn probe(dir: &Path, templates: &[(Tool, &str)]) -> MemoryStabilityProbe {
        let settings = test_support::settings(dir, templates);
        MemoryStabilityProbe::new(ExecutionContext::new(settings, dir.join("test.chain")))
    }

    #[test]
    fn test_profile_collects_samples() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("reads.bam");
        std::fs::write(&input, b"BAM\x01").expect("write");
        let probe = probe(dir.path(), &[(Tool::FastRemap, "sleep 0.3")]);

        let profile = probe.profile(Tool::FastRemap, &input, "bam");
        assert!(profile.succeeded(), "{}", profile.error_message);
        assert!(!profile.samples.is_empty());
        assert!(profile.peak_rss_mb >= profile.min_rss_mb);
        assert!(
            profile
                .samples
                .windows(2)
                .all(|w| w[0].timestamp <= w[1].timestamp)
        );
    }

    #[test]
    fn test_unsupported_tool_not_run() {
        let dir = tempfile::tempdir().expect("temp dir");
        let probe = probe(dir.path(), &[]);

        let profile = probe.profile(Tool::LiftOver, &dir.path().join("reads.bam"), "bam");
        assert!(!profile.succeeded());
        assert_eq!(profile.exit_code, -1);
        assert_eq!(profile.error_message, "Format bam not supported");
        assert!(profile.samples.is_empty());
    }

    #[test]
    fn test_failed_run_keeps_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let probe = probe(dir.path(), &[(Tool::CrossMap, "false")]);

        let profiles = probe.profile_all(&[Tool::CrossMap], &dir.path().join("in.bam"), "bam");
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].exit_code, 1);
        assert_eq!(profiles[0].error_message, "Command failed with exit code 1");
    }
}
