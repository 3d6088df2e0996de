//! Tool Executor
//!
//! Drives the external liftover tools and turns their runs into results.
//! Every pipeline shares one [`ExecutionContext`]: resolved settings, a
//! process runner and the chain resolver.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ExecutionContext::prepare (support check, chain, argv)
//!       │
//!       ├──────────────────────┬──────────────────────┐
//!       ▼                      ▼                      ▼
//! ┌─────────────┐      ┌──────────────┐      ┌──────────────┐
//! │  benchmark  │      │    memory    │      │   accuracy   │
//! │ cold + warm │      │ long probe + │      │ index, run,  │
//! │    runs     │      │  stability   │      │   compare    │
//! └──────┬──────┘      └──────┬───────┘      └──────┬───────┘
//!        └────────────────────┼─────────────────────┘
//!                             ▼
//!                     ┌──────────────┐
//!                     │  formatting  │  Human-readable output
//!                     └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`benchmark`] - Cold/warm speed benchmarks
//! - [`memory`] - Long-running memory stability probe
//! - [`accuracy`] - Indexed accuracy comparison against a reference tool
//! - [`formatting`] - Human-readable output formatting
//! - [`metadata`] - System metadata collection

mod accuracy;
mod benchmark;
mod formatting;
mod memory;
mod metadata;

pub use accuracy::{AccuracyOutcome, AccuracyPipeline, ToolOutput};
pub use benchmark::BenchmarkOrchestrator;
pub use formatting::{format_accuracy_summary, format_benchmark_summary, format_memory_summary};
pub use memory::MemoryStabilityProbe;
pub use metadata::build_report_meta;

use crate::chain::ChainResolver;
use crate::config::RunSettings;
use crate::error::BenchError;
use crate::tools::{CommandContext, Invocation, Tool, ToolAdapter};
use indicatif::{ProgressBar, ProgressStyle};
use liftbench_accuracy::count_record_lines;
use liftbench_core::ProcessRunner;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Formats whose files are not line-oriented text.
const BINARY_FORMATS: &[&str] = &["bam", "cram", "bigwig"];

/// Timeout for `--version` probes.
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared state for running tools.
#[derive(Debug)]
pub struct ExecutionContext {
    settings: RunSettings,
    runner: ProcessRunner,
    chains: ChainResolver,
}

impl ExecutionContext {
    /// Context for `settings`, converting with `chain`.
    pub fn new(settings: RunSettings, chain: impl Into<PathBuf>) -> Self {
        let runner = ProcessRunner::new()
            .with_term_grace(settings.term_grace)
            .with_sampler_grace(settings.stop_grace);
        Self {
            settings,
            runner,
            chains: ChainResolver::new(chain),
        }
    }

    /// Resolved settings.
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Process runner configured from the settings.
    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// Configured chain file.
    pub fn chain(&self) -> &Path {
        self.chains.chain()
    }

    /// Adapter for `tool`, honouring template overrides.
    pub fn adapter(&self, tool: Tool) -> ToolAdapter {
        match self.settings.templates.get(&tool) {
            Some(template) => ToolAdapter::with_template(tool, template.clone()),
            None => ToolAdapter::new(tool),
        }
    }

    /// `<output_dir>/<tool>_<label>.<format>`
    pub fn output_path(&self, tool: Tool, label: &str, format: &str) -> PathBuf {
        self.settings
            .output_dir
            .join(format!("{}_{}.{}", tool.name(), label, format.to_ascii_lowercase()))
    }

    /// Check support, resolve the chain, clear stale outputs and render argv.
    pub fn prepare(
        &self,
        tool: Tool,
        format: &str,
        input: &Path,
        output: PathBuf,
    ) -> Result<Invocation, BenchError> {
        if !tool.supports(format) {
            return Err(BenchError::UnsupportedFormat {
                tool: tool.name().to_string(),
                format: format.to_string(),
            });
        }
        std::fs::create_dir_all(&self.settings.output_dir)?;
        let chain = self.chains.resolve(tool)?;

        let ctx = CommandContext {
            format: format.to_ascii_lowercase(),
            chain,
            input: input.to_path_buf(),
            output,
            threads: self.settings.threads,
        };
        let invocation = self.adapter(tool).build_command(&ctx)?;

        for stale in [&invocation.output, &invocation.unmapped] {
            match std::fs::remove_file(stale) {
                Ok(()) => debug!("removed stale {}", stale.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        debug!("{}: {}", tool, invocation.argv.join(" "));
        Ok(invocation)
    }

    /// Detected version of each tool, keyed by tool name.
    pub fn tool_versions(&self, tools: &[Tool]) -> BTreeMap<String, String> {
        tools
            .iter()
            .map(|&tool| {
                let version = self.adapter(tool).probe_version(&self.runner, VERSION_PROBE_TIMEOUT);
                (tool.name().to_string(), version)
            })
            .collect()
    }
}

/// Whether files of `format` can be counted line by line.
pub fn is_text_format(format: &str) -> bool {
    !BINARY_FORMATS.contains(&format.to_ascii_lowercase().as_str())
}

/// Data records in `path`; 0 for binary formats, missing or unreadable files.
pub fn count_records(path: &Path, format: &str) -> usize {
    if !is_text_format(format) || !path.exists() {
        return 0;
    }
    match count_record_lines(path) {
        Ok(count) => count,
        Err(e) => {
            warn!("could not count records: {}", e);
            0
        }
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_text_format() {
        assert!(is_text_format("bed"));
        assert!(is_text_format("VCF"));
        assert!(!is_text_format("bam"));
        assert!(!is_text_format("bigwig"));
    }

    #[test]
    fn test_prepare_rejects_unsupported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ctx = ExecutionContext::new(test_support::settings(dir.path(), &[]), "x.chain");
        let err = ctx
            .prepare(Tool::LiftOver, "vcf", Path::new("in.vcf"), dir.path().join("o.vcf"))
            .expect_err("unsupported");
        assert!(matches!(err, BenchError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_prepare_clears_stale_outputs() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ctx = ExecutionContext::new(test_support::settings(dir.path(), &[]), "x.chain");
        let output = ctx.output_path(Tool::LiftOver, "output", "bed");
        std::fs::write(&output, "stale").expect("write");
        std::fs::write(crate::tools::unmapped_path(&output), "stale").expect("write");

        let invocation = ctx
            .prepare(Tool::LiftOver, "bed", Path::new("in.bed"), output.clone())
            .expect("prepare");
        assert_eq!(invocation.output, output);
        assert!(!output.exists());
        assert!(!invocation.unmapped.exists());
        assert_eq!(invocation.argv[0], "liftOver");
    }

    #[test]
    fn test_count_records_binary_is_zero() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("reads.bam");
        std::fs::write(&path, "chr1\t1\t2\n").expect("write");
        assert_eq!(count_records(&path, "bam"), 0);
        assert_eq!(count_records(&path, "bed"), 1);
        assert_eq!(count_records(&dir.path().join("missing.bed"), "bed"), 0);
    }
}
