//! Accuracy pipeline
//!
//! ```text
//! input.bed ──index_file──▶ indexed_input.bed (names ID_0..ID_{n-1})
//!                                 │
//!            ┌────────────────────┼────────────────────┐
//!            ▼                    ▼                    ▼
//!       reference tool       test tool A          test tool B     (sequential)
//!            │                    │                    │
//!            ▼                    ▼                    ▼
//!    output + .unmap       output + .unmap      output + .unmap
//!            │                    └─────────┬──────────┘
//!            └──────────────▶ compare (rayon, one task per test tool)
//! ```
//!
//! Tools run one after another so they never compete for CPU or disk. Only
//! the comparison of finished outputs is parallel.

use super::{ExecutionContext, progress_bar};
use crate::config::Workload;
use crate::error::BenchError;
use crate::tools::Tool;
use fxhash::FxHashSet;
use liftbench_accuracy::{
    AccuracyComparator, AccuracyResult, IndexedRecordSet, index_file, load_indexed,
    load_unmapped_ids,
};
use rayon::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Name of the indexed copy of the input inside the output directory.
pub const INDEXED_INPUT_NAME: &str = "indexed_input.bed";

/// Loaded output of one tool run on the indexed input.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Tool that produced the output
    pub tool: Tool,
    /// Mapped records keyed by identifier
    pub mapped: IndexedRecordSet,
    /// Identifiers the tool reported as unmapped
    pub unmapped: FxHashSet<usize>,
    /// Why the run failed, if it did
    pub failure: Option<String>,
}

impl ToolOutput {
    fn failed(tool: Tool, reason: String) -> Self {
        Self {
            tool,
            mapped: IndexedRecordSet::default(),
            unmapped: FxHashSet::default(),
            failure: Some(reason),
        }
    }
}

/// Everything an accuracy report is built from.
#[derive(Debug, Clone)]
pub struct AccuracyOutcome {
    /// Records in the indexed input
    pub total_input_records: usize,
    /// Reference tool
    pub reference: Tool,
    /// Distinct identifiers the reference mapped
    pub reference_mapped: usize,
    /// Identifiers the reference reported as unmapped
    pub reference_unmapped: usize,
    /// One result per test tool, in the order given
    pub results: Vec<AccuracyResult>,
}

/// Runs tools on an indexed input and compares them to a reference.
#[derive(Debug)]
pub struct AccuracyPipeline {
    ctx: ExecutionContext,
    comparator: AccuracyComparator,
}

impl AccuracyPipeline {
    /// Pipeline sharing `ctx`, comparing with the configured thresholds.
    pub fn new(ctx: ExecutionContext) -> Self {
        let comparator = AccuracyComparator::new(ctx.settings().comparator);
        Self { ctx, comparator }
    }

    /// Execution context.
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Compare each of `tools` against `reference` on `input`.
    ///
    /// Fails when the input cannot be indexed or the reference produces
    /// nothing usable; test tool failures become warnings on their result.
    pub fn run(
        &self,
        input: &Path,
        format: &str,
        reference: Tool,
        tools: &[Tool],
    ) -> Result<AccuracyOutcome, BenchError> {
        if !format.eq_ignore_ascii_case("bed") {
            return Err(BenchError::UnsupportedFormat {
                tool: "accuracy comparison".to_string(),
                format: format.to_string(),
            });
        }

        std::fs::create_dir_all(&self.ctx.settings().output_dir)?;
        let indexed = self.ctx.settings().output_dir.join(INDEXED_INPUT_NAME);
        let total = index_file(input, &indexed)?;
        info!("indexed {} records into {}", total, indexed.display());

        let test_tools: Vec<Tool> = tools.iter().copied().filter(|&t| t != reference).collect();
        let pb = progress_bar(test_tools.len() + 1);

        pb.set_message(reference.display_name());
        let reference_output = match self.execute(reference, &indexed, format) {
            Ok(output) => output,
            Err(e) => {
                pb.abandon_with_message("Reference failed");
                return Err(e);
            }
        };
        pb.inc(1);
        if reference_output.mapped.is_empty() {
            pb.abandon_with_message("Reference produced no output");
            return Err(BenchError::EmptyReference {
                tool: reference.name().to_string(),
            });
        }

        let mut outputs = Vec::with_capacity(test_tools.len());
        for &tool in &test_tools {
            pb.set_message(tool.display_name());
            let output = match self.execute(tool, &indexed, format) {
                Ok(output) => output,
                Err(e) => {
                    warn!("{}: {}", tool.display_name(), e);
                    ToolOutput::failed(tool, e.to_string())
                }
            };
            outputs.push(output);
            pb.inc(1);
        }
        pb.finish_with_message("Complete");

        let results = outputs
            .par_iter()
            .map(|output| self.compare(output, &reference_output, total))
            .collect();

        Ok(AccuracyOutcome {
            total_input_records: total,
            reference,
            reference_mapped: reference_output.mapped.len(),
            reference_unmapped: reference_output.unmapped.len(),
            results,
        })
    }

    /// Score one tool's output against the reference.
    pub fn compare(&self, output: &ToolOutput, reference: &ToolOutput, total: usize) -> AccuracyResult {
        let mut result = self
            .comparator
            .compare(&output.mapped, &reference.mapped, total)
            .labelled(output.tool.name(), reference.tool.name());
        result.record_unmapped(&output.unmapped, &reference.unmapped);
        if let Some(reason) = &output.failure {
            result.warnings.insert(0, format!("Tool run failed: {}", reason));
        }
        result
    }

    /// Run `tool` on the indexed input and load what it wrote.
    fn execute(&self, tool: Tool, indexed: &Path, format: &str) -> Result<ToolOutput, BenchError> {
        let settings = self.ctx.settings();
        let output = self.ctx.output_path(tool, "accuracy", format);
        let invocation = self.ctx.prepare(tool, format, indexed, output)?;

        let execution = self
            .ctx
            .runner()
            .run(&invocation.argv, settings.timeout_for(Workload::for_format(format)));
        if let Some(err) = BenchError::from_execution(tool.name(), &execution, settings.max_error_len)
        {
            return Err(err);
        }

        let mapped = load_indexed(&invocation.output)?;
        let unmapped = load_unmapped_ids(&invocation.unmapped)?;
        info!(
            "{}: {} mapped, {} unmapped",
            tool.display_name(),
            mapped.len(),
            unmapped.len()
        );
        Ok(ToolOutput {
            tool,
            mapped,
            unmapped,
            failure: None,
        })
    }
}
