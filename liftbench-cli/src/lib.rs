#![warn(missing_docs)]
//! liftbench CLI Library
//!
//! Command-line driver for benchmarking genome liftover tools. Call
//! [`run()`] from a binary's `main` to get the full `liftbench` interface:
//!
//! ```text
//! liftbench bench    --chain hg19ToHg38.over.chain.gz --input peaks.bed
//! liftbench memory   --chain hg19ToHg38.over.chain.gz --input reads.bam
//! liftbench accuracy --chain hg19ToHg38.over.chain.gz --input peaks.bed
//! liftbench init
//! ```

mod chain;
mod config;
mod error;
mod executor;
mod tools;

pub use chain::{ChainResolver, ensure_uncompressed};
pub use config::*;
pub use error::BenchError;
pub use executor::{
    AccuracyOutcome, AccuracyPipeline, BenchmarkOrchestrator, ExecutionContext,
    MemoryStabilityProbe, ToolOutput, build_report_meta, count_records, format_accuracy_summary,
    format_benchmark_summary, format_memory_summary, is_text_format,
};
pub use tools::{CommandContext, Invocation, Tool, ToolAdapter, extract_version, unmapped_path};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use liftbench_core::BYTES_PER_MB;
use liftbench_report::{
    AccuracyReport, BenchmarkReport, MemoryReport, OutputFormat, ReportSummary,
    generate_accuracy_csv, generate_benchmark_csv, generate_discrepancy_markdown,
    generate_json_report, generate_samples_csv,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// liftbench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "liftbench")]
#[command(author, version, about = "liftbench - speed, memory and accuracy benchmarks for liftover tools")]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: discover liftbench.toml upwards)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Time each tool over cold and warm runs
    Bench {
        /// Shared run options
        #[command(flatten)]
        run: RunArgs,

        /// Total runs per tool (first is the cold run)
        #[arg(long)]
        runs: Option<usize>,

        /// Threads passed to tools that accept a thread count
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Profile each tool's memory over one long run
    Memory {
        /// Shared run options
        #[command(flatten)]
        run: RunArgs,

        /// Sampling interval (e.g. "1s", "250ms")
        #[arg(long)]
        interval: Option<String>,
    },
    /// Compare each tool's output record by record against a reference tool
    Accuracy {
        /// Shared run options
        #[command(flatten)]
        run: RunArgs,

        /// Reference tool (default: liftover for BED, crossmap otherwise)
        #[arg(long)]
        reference: Option<Tool>,

        /// Discrepancies listed in the Markdown report
        #[arg(long)]
        max_listed: Option<usize>,
    },
    /// Write a default liftbench.toml
    Init {
        /// Destination
        #[arg(default_value = CONFIG_FILE_NAME)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Options shared by every run subcommand
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Chain file (may be gzip-compressed)
    #[arg(long)]
    pub chain: PathBuf,

    /// Input file to convert
    #[arg(short, long)]
    pub input: PathBuf,

    /// Input data format (default: inferred from the input file extension)
    #[arg(long)]
    pub input_format: Option<String>,

    /// Tools to run, comma-separated (default: all)
    #[arg(long, value_delimiter = ',')]
    pub tools: Vec<Tool>,

    /// Directory for tool outputs and saved reports
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Report format: human, json, csv, markdown
    #[arg(long, default_value = "human")]
    pub format: String,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    fn tools(&self) -> Vec<Tool> {
        if self.tools.is_empty() {
            Tool::ALL.to_vec()
        } else {
            self.tools.clone()
        }
    }

    fn data_format(&self, fallback: &str) -> String {
        self.input_format
            .as_deref()
            .map(str::to_ascii_lowercase)
            .or_else(|| infer_format(&self.input))
            .unwrap_or_else(|| fallback.to_string())
    }

    fn report_format(&self) -> anyhow::Result<OutputFormat> {
        self.format.parse().map_err(|e: String| anyhow::anyhow!(e))
    }
}

/// Run the liftbench CLI with process arguments.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the liftbench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let filter = if cli.verbose {
        "liftbench=debug"
    } else {
        "liftbench=info"
    };
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = match &cli.config {
        Some(path) => LiftbenchConfig::load(path)?,
        None => LiftbenchConfig::discover().unwrap_or_default(),
    };

    match cli.command {
        Commands::Bench { run, runs, threads } => run_bench(&config, &run, runs, threads),
        Commands::Memory { run, interval } => run_memory(&config, &run, interval.as_deref()),
        Commands::Accuracy {
            run,
            reference,
            max_listed,
        } => run_accuracy(&config, &run, reference, max_listed),
        Commands::Init { path, force } => init_config(&path, force),
    }
}

fn settings_for(config: &LiftbenchConfig, args: &RunArgs) -> anyhow::Result<RunSettings> {
    let mut settings = config.resolve()?;
    if let Some(dir) = &args.output_dir {
        settings.output_dir = dir.clone();
    }
    if !args.input.exists() {
        anyhow::bail!("input file {} does not exist", args.input.display());
    }
    Ok(settings)
}

fn run_bench(
    config: &LiftbenchConfig,
    args: &RunArgs,
    runs: Option<usize>,
    threads: Option<usize>,
) -> anyhow::Result<()> {
    let report_format = args.report_format()?;
    let mut settings = settings_for(config, args)?;
    if let Some(runs) = runs {
        anyhow::ensure!(runs > 0, "--runs must be at least 1");
        settings.runs = runs;
    }
    if let Some(threads) = threads {
        settings.threads = threads;
    }

    let format = args.data_format("bed");
    let tools = args.tools();
    let ctx = ExecutionContext::new(settings, &args.chain);
    let meta = build_report_meta(ctx.tool_versions(&tools));
    let (runs, threads) = (ctx.settings().runs, ctx.settings().threads);

    info!(
        "benchmarking {} tool(s) on {} ({}), {} run(s) each",
        tools.len(),
        args.input.display(),
        format,
        runs
    );
    let orchestrator = BenchmarkOrchestrator::new(ctx);
    let results = orchestrator.run_all(&tools, &args.input, &format, runs);

    let report = BenchmarkReport {
        meta,
        input_file: args.input.display().to_string(),
        input_size_mb: file_size_mb(&args.input),
        chain_file: args.chain.display().to_string(),
        format,
        threads,
        runs,
        summary: ReportSummary::from_results(&results),
        results,
    };

    if config.output.save_reports {
        let dir = &orchestrator.context().settings().output_dir;
        let stamp = timestamp(&report.meta.timestamp);
        save(dir, &format!("benchmark_{stamp}.json"), &generate_json_report(&report)?)?;
        save(dir, &format!("benchmark_{stamp}.csv"), &generate_benchmark_csv(&report.results)?)?;
    }

    let rendered = match report_format {
        OutputFormat::Human => format_benchmark_summary(&report),
        OutputFormat::Json => generate_json_report(&report)?,
        OutputFormat::Csv => generate_benchmark_csv(&report.results)?,
        OutputFormat::Markdown => anyhow::bail!("markdown output is only available for accuracy reports"),
    };
    emit(&rendered, args.output.as_deref())
}

fn run_memory(
    config: &LiftbenchConfig,
    args: &RunArgs,
    interval: Option<&str>,
) -> anyhow::Result<()> {
    let report_format = args.report_format()?;
    let mut settings = settings_for(config, args)?;
    if let Some(interval) = interval {
        settings.probe_interval = LiftbenchConfig::parse_duration(interval)
            .with_context(|| format!("invalid --interval {interval:?}"))?;
    }

    let format = args.data_format("bam");
    let tools = args.tools();
    let ctx = ExecutionContext::new(settings, &args.chain);
    let meta = build_report_meta(ctx.tool_versions(&tools));
    let sample_interval_sec = ctx.settings().probe_interval.as_secs_f64();

    info!(
        "profiling memory of {} tool(s) on {} every {:.3}s",
        tools.len(),
        args.input.display(),
        sample_interval_sec
    );
    let probe = MemoryStabilityProbe::new(ctx);
    let profiles = probe.profile_all(&tools, &args.input, &format);

    let report = MemoryReport {
        meta,
        input_file: args.input.display().to_string(),
        input_size_mb: file_size_mb(&args.input),
        format,
        sample_interval_sec,
        profiles,
    };

    if config.output.save_reports {
        let dir = &probe.context().settings().output_dir;
        let stamp = timestamp(&report.meta.timestamp);
        save(dir, &format!("memory_{stamp}.json"), &generate_json_report(&report)?)?;
        for profile in report.profiles.iter().filter(|p| !p.samples.is_empty()) {
            save(
                dir,
                &format!("{}_memory_samples_{stamp}.csv", profile.tool),
                &generate_samples_csv(&profile.samples)?,
            )?;
        }
    }

    let rendered = match report_format {
        OutputFormat::Human => format_memory_summary(&report),
        OutputFormat::Json => generate_json_report(&report)?,
        OutputFormat::Csv | OutputFormat::Markdown => anyhow::bail!(
            "memory reports support human and json output; sample CSVs are saved per tool"
        ),
    };
    emit(&rendered, args.output.as_deref())
}

fn run_accuracy(
    config: &LiftbenchConfig,
    args: &RunArgs,
    reference: Option<Tool>,
    max_listed: Option<usize>,
) -> anyhow::Result<()> {
    let report_format = args.report_format()?;
    let settings = settings_for(config, args)?;
    let format = args.data_format("bed");
    let reference = reference.unwrap_or_else(|| Tool::default_reference(&format));
    let tools = args.tools();
    let max_listed = max_listed.unwrap_or(config.accuracy.max_discrepancies_listed);

    let ctx = ExecutionContext::new(settings, &args.chain);
    let mut versioned = tools.clone();
    if !versioned.contains(&reference) {
        versioned.push(reference);
    }
    let meta = build_report_meta(ctx.tool_versions(&versioned));

    info!(
        "comparing {} tool(s) against {} on {}",
        tools.iter().filter(|&&t| t != reference).count(),
        reference.display_name(),
        args.input.display()
    );
    let pipeline = AccuracyPipeline::new(ctx);
    let outcome = pipeline
        .run(&args.input, &format, reference, &tools)
        .context("accuracy comparison aborted")?;
    for result in outcome.results.iter().filter(|r| !r.warnings.is_empty()) {
        for warning in &result.warnings {
            warn!("{}: {}", result.test_tool, warning);
        }
    }

    let report = AccuracyReport {
        meta,
        input_file: args.input.display().to_string(),
        format,
        reference_tool: outcome.reference.name().to_string(),
        total_input_records: outcome.total_input_records,
        reference_mapped: outcome.reference_mapped,
        reference_unmapped: outcome.reference_unmapped,
        results: outcome.results,
    };

    if config.output.save_reports {
        let dir = &pipeline.context().settings().output_dir;
        let stamp = timestamp(&report.meta.timestamp);
        save(dir, &format!("accuracy_{stamp}.json"), &generate_json_report(&report)?)?;
        save(dir, &format!("accuracy_{stamp}.csv"), &generate_accuracy_csv(&report.results)?)?;
        save(
            dir,
            &format!("accuracy_discrepancies_{stamp}.md"),
            &generate_discrepancy_markdown(&report, max_listed),
        )?;
    }

    let rendered = match report_format {
        OutputFormat::Human => format_accuracy_summary(&report),
        OutputFormat::Json => generate_json_report(&report)?,
        OutputFormat::Csv => generate_accuracy_csv(&report.results)?,
        OutputFormat::Markdown => generate_discrepancy_markdown(&report, max_listed),
    };
    emit(&rendered, args.output.as_deref())
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::write(path, LiftbenchConfig::default_toml())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Data format named by a file extension, looking through `.gz`.
pub fn infer_format(path: &Path) -> Option<String> {
    let stem_path;
    let path = match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("gz") => {
            stem_path = path.with_extension("");
            stem_path.as_path()
        }
        _ => path,
    };
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "bw" => "bigwig".to_string(),
        "gtf" | "gff3" => "gff".to_string(),
        _ => ext,
    })
}

fn file_size_mb(path: &Path) -> f64 {
    std::fs::metadata(path)
        .map(|m| m.len() as f64 / BYTES_PER_MB)
        .unwrap_or(0.0)
}

fn timestamp(at: &chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

fn save(dir: &Path, name: &str, contents: &str) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    info!("saved {}", path.display());
    Ok(path)
}

fn emit(rendered: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to: {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
