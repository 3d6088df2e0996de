//! Configuration loading from liftbench.toml
//!
//! liftbench configuration can be specified in a `liftbench.toml` file in the
//! project root. The configuration is discovered by walking up from the current
//! directory. Durations are written as strings ("500ms", "3s", "2m", "1h") and
//! resolved once into [`RunSettings`] before any tool runs.

use crate::tools::Tool;
use anyhow::Context;
use liftbench_accuracy::ComparatorConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file looked up by [`LiftbenchConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "liftbench.toml";

/// liftbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LiftbenchConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Per-workload timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Accuracy comparison configuration
    #[serde(default)]
    pub accuracy: AccuracyConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// Per-tool overrides, keyed by tool name (`fastcrossmap`, `crossmap`, ...)
    #[serde(default)]
    pub tools: BTreeMap<String, ToolConfig>,
}

/// Runner configuration for tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Total runs per tool: one cold start plus `runs - 1` warm starts
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Value substituted for `{threads}` in command templates
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Memory sampling interval during speed benchmarks
    #[serde(default = "default_sample_interval")]
    pub sample_interval: String,
    /// Memory sampling interval during long stability probes
    #[serde(default = "default_probe_interval")]
    pub probe_interval: String,
    /// Bound on waiting for the sampler thread to stop
    #[serde(default = "default_stop_grace")]
    pub stop_grace: String,
    /// Time between SIGTERM and SIGKILL on timeout
    #[serde(default = "default_term_grace")]
    pub term_grace: String,
    /// Characters of stderr kept in failure messages
    #[serde(default = "default_max_error_len")]
    pub max_error_len: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            threads: default_threads(),
            sample_interval: default_sample_interval(),
            probe_interval: default_probe_interval(),
            stop_grace: default_stop_grace(),
            term_grace: default_term_grace(),
            max_error_len: default_max_error_len(),
        }
    }
}

fn default_runs() -> usize {
    3
}
fn default_threads() -> usize {
    4
}
fn default_sample_interval() -> String {
    "10ms".to_string()
}
fn default_probe_interval() -> String {
    "1s".to_string()
}
fn default_stop_grace() -> String {
    "5s".to_string()
}
fn default_term_grace() -> String {
    "500ms".to_string()
}
fn default_max_error_len() -> usize {
    500
}

/// Wall-clock timeouts by workload size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Small text inputs (BED, VCF, GFF, ...)
    #[serde(default = "default_short_timeout")]
    pub short: String,
    /// Large alignment inputs (BAM, SAM)
    #[serde(default = "default_large_timeout")]
    pub large: String,
    /// Long-running memory stability probes
    #[serde(default = "default_memory_probe_timeout")]
    pub memory_probe: String,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            short: default_short_timeout(),
            large: default_large_timeout(),
            memory_probe: default_memory_probe_timeout(),
        }
    }
}

fn default_short_timeout() -> String {
    "600s".to_string()
}
fn default_large_timeout() -> String {
    "3600s".to_string()
}
fn default_memory_probe_timeout() -> String {
    "7200s".to_string()
}

/// Accuracy comparison configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyConfig {
    /// Identity rate below which a warning is emitted
    #[serde(default = "default_identity_threshold")]
    pub identity_warning_threshold: f64,
    /// Ignore a leading `chr` when comparing chromosome names
    #[serde(default)]
    pub normalize_chrom: bool,
    /// Discrepancies listed per tool in the Markdown report
    #[serde(default = "default_max_discrepancies")]
    pub max_discrepancies_listed: usize,
}

impl Default for AccuracyConfig {
    fn default() -> Self {
        Self {
            identity_warning_threshold: default_identity_threshold(),
            normalize_chrom: false,
            max_discrepancies_listed: default_max_discrepancies(),
        }
    }
}

fn default_identity_threshold() -> f64 {
    0.99
}
fn default_max_discrepancies() -> usize {
    50
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for tool outputs and reports
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Write JSON and CSV reports alongside terminal output
    #[serde(default = "default_save_reports")]
    pub save_reports: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_reports: default_save_reports(),
        }
    }
}

fn default_output_dir() -> String {
    "results".to_string()
}
fn default_save_reports() -> bool {
    true
}

/// Per-tool override
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Command template replacing the built-in one
    #[serde(default)]
    pub command: Option<String>,
}

/// Workload class selecting a timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    /// Small text inputs
    Short,
    /// Large alignment inputs
    Large,
    /// Long-running stability probe
    MemoryProbe,
}

impl Workload {
    /// Workload class of a benchmark on `format`.
    pub fn for_format(format: &str) -> Self {
        match format.to_ascii_lowercase().as_str() {
            "bam" | "sam" | "cram" => Workload::Large,
            _ => Workload::Short,
        }
    }
}

/// Configuration with every duration parsed; built once per run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Total runs per tool
    pub runs: usize,
    /// `{threads}` substitution
    pub threads: usize,
    /// Sampling interval for speed benchmarks
    pub sample_interval: Duration,
    /// Sampling interval for stability probes
    pub probe_interval: Duration,
    /// Sampler stop bound
    pub stop_grace: Duration,
    /// SIGTERM to SIGKILL delay
    pub term_grace: Duration,
    /// Characters of stderr kept in failure messages
    pub max_error_len: usize,
    /// Timeout for short workloads
    pub short_timeout: Duration,
    /// Timeout for large workloads
    pub large_timeout: Duration,
    /// Timeout for stability probes
    pub memory_probe_timeout: Duration,
    /// Directory for tool outputs and reports
    pub output_dir: PathBuf,
    /// Comparator settings
    pub comparator: ComparatorConfig,
    /// Command template overrides
    pub templates: BTreeMap<Tool, String>,
}

impl RunSettings {
    /// Timeout for `workload`.
    pub fn timeout_for(&self, workload: Workload) -> Duration {
        match workload {
            Workload::Short => self.short_timeout,
            Workload::Large => self.large_timeout,
            Workload::MemoryProbe => self.memory_probe_timeout,
        }
    }
}

impl LiftbenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!("ignoring {}: {:#}", config_path.display(), e);
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Parse every duration and tool name into [`RunSettings`].
    pub fn resolve(&self) -> anyhow::Result<RunSettings> {
        if self.runner.runs == 0 {
            anyhow::bail!("runner.runs must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.accuracy.identity_warning_threshold) {
            anyhow::bail!(
                "accuracy.identity_warning_threshold must be within 0.0..=1.0, got {}",
                self.accuracy.identity_warning_threshold
            );
        }

        let mut templates = BTreeMap::new();
        for (name, tool_config) in &self.tools {
            let tool: Tool = name
                .parse()
                .map_err(|e: String| anyhow::anyhow!("[tools.{}]: {}", name, e))?;
            if let Some(command) = &tool_config.command {
                templates.insert(tool, command.clone());
            }
        }

        let duration = |field: &str, value: &str| {
            Self::parse_duration(value).with_context(|| format!("invalid {field} = {value:?}"))
        };

        Ok(RunSettings {
            runs: self.runner.runs,
            threads: self.runner.threads,
            sample_interval: duration("runner.sample_interval", &self.runner.sample_interval)?,
            probe_interval: duration("runner.probe_interval", &self.runner.probe_interval)?,
            stop_grace: duration("runner.stop_grace", &self.runner.stop_grace)?,
            term_grace: duration("runner.term_grace", &self.runner.term_grace)?,
            max_error_len: self.runner.max_error_len,
            short_timeout: duration("timeouts.short", &self.timeouts.short)?,
            large_timeout: duration("timeouts.large", &self.timeouts.large)?,
            memory_probe_timeout: duration("timeouts.memory_probe", &self.timeouts.memory_probe)?,
            output_dir: PathBuf::from(&self.output.directory),
            comparator: ComparatorConfig {
                identity_warning_threshold: self.accuracy.identity_warning_threshold,
                normalize_chrom: self.accuracy.normalize_chrom,
            },
            templates,
        })
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# liftbench Configuration

[runner]
# Runs per tool: one cold start, the rest warm starts
runs = 3
# Value substituted for {threads} in command templates
threads = 4
# Memory sampling interval during speed benchmarks
sample_interval = "10ms"
# Memory sampling interval during stability probes
probe_interval = "1s"
# How long to wait for the sampler thread to stop
stop_grace = "5s"
# Delay between SIGTERM and SIGKILL when a tool times out
term_grace = "500ms"
# Characters of stderr kept in failure messages
max_error_len = 500

[timeouts]
# Small text inputs (bed, vcf, gff, ...)
short = "600s"
# Large alignment inputs (bam, sam)
large = "3600s"
# Long-running memory stability probes
memory_probe = "7200s"

[accuracy]
# Warn when the identity rate falls below this fraction
identity_warning_threshold = 0.99
# Treat "chr1" and "1" as the same chromosome
normalize_chrom = false
# Discrepancies listed per tool in the Markdown report
max_discrepancies_listed = 50

[output]
# Directory for tool outputs and reports
directory = "results"
# Write JSON and CSV reports after each run
save_reports = true

# Command template overrides. Placeholders:
# {format} {chain} {input} {output} {unmapped} {threads}
# [tools.fastcrossmap]
# command = "./target/release/fast-crossmap {format} {chain} {input} {output} -t {threads}"
# [tools.crossmap]
# command = "CrossMap {format} {chain} {input} {output}"
# [tools.liftover]
# command = "liftOver {input} {chain} {output} {unmapped}"
# [tools.fastremap]
# command = "FastRemap -f {format} -c {chain} -i {input} -u {unmapped} -o {output}"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m", "1h")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Duration must be non-negative: {}", s));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_nanos((value * multiplier as f64).round() as u64))
    }
}
