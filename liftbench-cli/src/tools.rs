//! Liftover tool adapters
//!
//! Each supported tool is a closed enum variant carrying its supported
//! formats, default command template and quirks. Templates use named
//! placeholders that are substituted per token after shell-word splitting, so
//! paths containing spaces survive intact:
//!
//! ```text
//! "liftOver {input} {chain} {output} {unmapped}"
//!     │ shell_words::split
//!     ▼
//! ["liftOver", "{input}", "{chain}", "{output}", "{unmapped}"]
//!     │ substitute
//!     ▼
//! ["liftOver", "in.bed", "hg19ToHg38.over.chain.gz", "out.bed", "out.bed.unmap"]
//! ```

use crate::error::BenchError;
use liftbench_core::ProcessRunner;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

/// Supported liftover tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tool {
    /// Rust reimplementation of CrossMap
    FastCrossMap,
    /// CrossMap (Python)
    CrossMap,
    /// UCSC liftOver
    LiftOver,
    /// FastRemap (C++)
    FastRemap,
}

const CROSSMAP_FORMATS: &[&str] = &[
    "bed", "vcf", "gff", "bam", "sam", "wig", "bigwig", "maf", "gvcf", "region",
];

impl Tool {
    /// Every tool, in canonical report order.
    pub const ALL: [Tool; 4] = [Tool::FastCrossMap, Tool::CrossMap, Tool::LiftOver, Tool::FastRemap];

    /// Lowercase identifier used in config keys, file names and reports.
    pub fn name(self) -> &'static str {
        match self {
            Tool::FastCrossMap => "fastcrossmap",
            Tool::CrossMap => "crossmap",
            Tool::LiftOver => "liftover",
            Tool::FastRemap => "fastremap",
        }
    }

    /// Name as the tool's authors spell it.
    pub fn display_name(self) -> &'static str {
        match self {
            Tool::FastCrossMap => "FastCrossMap",
            Tool::CrossMap => "CrossMap",
            Tool::LiftOver => "liftOver",
            Tool::FastRemap => "FastRemap",
        }
    }

    /// Input formats the tool accepts.
    pub fn supported_formats(self) -> &'static [&'static str] {
        match self {
            Tool::FastCrossMap | Tool::CrossMap => CROSSMAP_FORMATS,
            Tool::LiftOver => &["bed"],
            Tool::FastRemap => &["bed", "bam"],
        }
    }

    /// Whether the tool accepts `format` (case-insensitive).
    pub fn supports(self, format: &str) -> bool {
        let format = format.to_ascii_lowercase();
        self.supported_formats().contains(&format.as_str())
    }

    /// Built-in command template.
    pub fn default_template(self) -> &'static str {
        match self {
            Tool::FastCrossMap => "fast-crossmap {format} {chain} {input} {output} -t {threads}",
            Tool::CrossMap => "CrossMap {format} {chain} {input} {output}",
            Tool::LiftOver => "liftOver {input} {chain} {output} {unmapped}",
            Tool::FastRemap => "FastRemap -f {format} -c {chain} -i {input} -u {unmapped} -o {output}",
        }
    }

    /// FastRemap cannot read gzip-compressed chain files.
    pub fn requires_uncompressed_chain(self) -> bool {
        matches!(self, Tool::FastRemap)
    }

    /// Extension the tool appends to the output path it is given.
    ///
    /// FastRemap writes `<output>.<format>`, so it must be handed the path
    /// with that extension removed.
    pub fn implicit_output_suffix(self, format: &str) -> Option<String> {
        match self {
            Tool::FastRemap => Some(format.to_ascii_lowercase()),
            _ => None,
        }
    }

    /// Arguments that make the tool print its version.
    ///
    /// liftOver has no version flag; it prints a usage banner naming its
    /// version when run without arguments.
    pub fn version_args(self) -> &'static [&'static str] {
        match self {
            Tool::LiftOver => &[],
            _ => &["--version"],
        }
    }

    /// Gold standard for accuracy comparisons on `format`.
    pub fn default_reference(format: &str) -> Tool {
        if format.eq_ignore_ascii_case("bed") {
            Tool::LiftOver
        } else {
            Tool::CrossMap
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "fastcrossmap" => Ok(Tool::FastCrossMap),
            "crossmap" => Ok(Tool::CrossMap),
            "liftover" => Ok(Tool::LiftOver),
            "fastremap" => Ok(Tool::FastRemap),
            other => Err(format!("Unknown tool: {}", other)),
        }
    }
}

/// Paths and settings substituted into a template.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Input format name
    pub format: String,
    /// Chain file, already resolved for the tool's chain requirements
    pub chain: PathBuf,
    /// Input file
    pub input: PathBuf,
    /// Where the harness expects the converted output
    pub output: PathBuf,
    /// `{threads}` value
    pub threads: usize,
}

/// A fully rendered tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program and arguments
    pub argv: Vec<String>,
    /// Path where the output will actually appear
    pub output: PathBuf,
    /// Unmapped companion path (`<output>.unmap`)
    pub unmapped: PathBuf,
}

/// A tool bound to its effective command template.
#[derive(Debug, Clone)]
pub struct ToolAdapter {
    tool: Tool,
    template: String,
}

impl ToolAdapter {
    /// Adapter using the tool's built-in template.
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            template: tool.default_template().to_string(),
        }
    }

    /// Adapter using a custom template.
    pub fn with_template(tool: Tool, template: impl Into<String>) -> Self {
        Self {
            tool,
            template: template.into(),
        }
    }

    /// Adapted tool.
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Effective template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Executable named by the template (its first word).
    pub fn program(&self) -> Option<String> {
        shell_words::split(&self.template)
            .ok()
            .and_then(|words| words.into_iter().next())
    }

    /// Render the template into an argv vector.
    ///
    /// `ctx.output` is the path the harness will read; tools with an implicit
    /// output suffix are handed the path with that suffix stripped.
    pub fn build_command(&self, ctx: &CommandContext) -> Result<Invocation, BenchError> {
        let unmapped = unmapped_path(&ctx.output);
        let tool_output = match self.tool.implicit_output_suffix(&ctx.format) {
            Some(suffix) => strip_suffix(&ctx.output, &suffix),
            None => ctx.output.clone(),
        };

        let words = shell_words::split(&self.template).map_err(|e| BenchError::InvalidTemplate {
            tool: self.tool.name().to_string(),
            reason: e.to_string(),
        })?;
        if words.is_empty() {
            return Err(BenchError::InvalidTemplate {
                tool: self.tool.name().to_string(),
                reason: "template is empty".to_string(),
            });
        }

        let chain = ctx.chain.display().to_string();
        let input = ctx.input.display().to_string();
        let output = tool_output.display().to_string();
        let unmapped_str = unmapped.display().to_string();
        let threads = ctx.threads.to_string();
        let argv = words
            .into_iter()
            .map(|word| {
                word.replace("{format}", &ctx.format)
                    .replace("{chain}", &chain)
                    .replace("{input}", &input)
                    .replace("{output}", &output)
                    .replace("{unmapped}", &unmapped_str)
                    .replace("{threads}", &threads)
            })
            .collect();

        Ok(Invocation {
            argv,
            output: ctx.output.clone(),
            unmapped,
        })
    }

    /// Ask the installed tool for its version; `"unknown"` when undetectable.
    pub fn probe_version(&self, runner: &ProcessRunner, timeout: Duration) -> String {
        let Some(program) = self.program() else {
            return "unknown".to_string();
        };
        let mut argv = vec![program];
        argv.extend(self.tool.version_args().iter().map(|s| s.to_string()));

        let result = runner.run(&argv, timeout);
        if result.exit_code == liftbench_core::EXIT_NOT_FOUND {
            return "not installed".to_string();
        }
        extract_version(&result.stdout)
            .or_else(|| extract_version(&result.stderr))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// `<output>.unmap`
pub fn unmapped_path(output: &Path) -> PathBuf {
    let mut path = output.as_os_str().to_owned();
    path.push(".unmap");
    PathBuf::from(path)
}

fn strip_suffix(path: &Path, suffix: &str) -> PathBuf {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case(suffix) => path.with_extension(""),
        _ => path.to_path_buf(),
    }
}

static VERSION_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)v(?:ersion)?\s*[:=]?\s*(\d+(?:\.\d+)+)|(\d+\.\d+(?:\.\d+)*)").ok());

/// Pull a dotted version number out of tool output.
pub fn extract_version(text: &str) -> Option<String> {
    let re = VERSION_RE.as_ref()?;
    let caps = re.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(format: &str, output: &str) -> CommandContext {
        CommandContext {
            format: format.to_string(),
            chain: PathBuf::from("/data/hg19ToHg38.over.chain.gz"),
            input: PathBuf::from("/data/my input.bed"),
            output: PathBuf::from(output),
            threads: 8,
        }
    }

    #[test]
    fn test_tool_parse_and_display() {
        assert_eq!("FastCrossMap".parse::<Tool>(), Ok(Tool::FastCrossMap));
        assert_eq!("fast-crossmap".parse::<Tool>(), Ok(Tool::FastCrossMap));
        assert_eq!("liftOver".parse::<Tool>(), Ok(Tool::LiftOver));
        assert!("bedtools".parse::<Tool>().is_err());
        for tool in Tool::ALL {
            assert_eq!(tool.to_string().parse::<Tool>(), Ok(tool));
        }
    }

    #[test]
    fn test_supported_formats() {
        assert!(Tool::FastCrossMap.supports("BAM"));
        assert!(Tool::CrossMap.supports("region"));
        assert!(Tool::LiftOver.supports("bed"));
        assert!(!Tool::LiftOver.supports("vcf"));
        assert!(Tool::FastRemap.supports("bam"));
        assert!(!Tool::FastRemap.supports("vcf"));
    }

    #[test]
    fn test_build_liftover_command() {
        let invocation = ToolAdapter::new(Tool::LiftOver)
            .build_command(&ctx("bed", "/out/liftover_output.bed"))
            .expect("render");
        assert_eq!(
            invocation.argv,
            vec![
                "liftOver",
                "/data/my input.bed",
                "/data/hg19ToHg38.over.chain.gz",
                "/out/liftover_output.bed",
                "/out/liftover_output.bed.unmap",
            ]
        );
        assert_eq!(invocation.unmapped, PathBuf::from("/out/liftover_output.bed.unmap"));
    }

    #[test]
    fn test_build_fastcrossmap_command_substitutes_threads() {
        let invocation = ToolAdapter::new(Tool::FastCrossMap)
            .build_command(&ctx("vcf", "/out/x.vcf"))
            .expect("render");
        assert_eq!(invocation.argv[0], "fast-crossmap");
        assert_eq!(invocation.argv[1], "vcf");
        assert_eq!(invocation.argv.last().map(String::as_str), Some("8"));
    }

    #[test]
    fn test_fastremap_output_suffix_quirk() {
        let invocation = ToolAdapter::new(Tool::FastRemap)
            .build_command(&ctx("bed", "/out/fastremap_output.bed"))
            .expect("render");
        let o = invocation.argv.iter().position(|a| a == "-o").expect("-o flag");
        assert_eq!(invocation.argv[o + 1], "/out/fastremap_output");
        assert_eq!(invocation.output, PathBuf::from("/out/fastremap_output.bed"));
        assert_eq!(invocation.unmapped, PathBuf::from("/out/fastremap_output.bed.unmap"));
        assert!(Tool::FastRemap.requires_uncompressed_chain());
        assert!(!Tool::CrossMap.requires_uncompressed_chain());
    }

    #[test]
    fn test_custom_template() {
        let adapter = ToolAdapter::with_template(Tool::CrossMap, "'/opt/my tools/CrossMap' {format} {chain} {input} {output}");
        assert_eq!(adapter.program().as_deref(), Some("/opt/my tools/CrossMap"));
        let invocation = adapter.build_command(&ctx("bed", "/out/o.bed")).expect("render");
        assert_eq!(invocation.argv.len(), 5);
    }

    #[test]
    fn test_invalid_template() {
        let adapter = ToolAdapter::with_template(Tool::CrossMap, "CrossMap 'unterminated");
        assert!(matches!(
            adapter.build_command(&ctx("bed", "/out/o.bed")),
            Err(BenchError::InvalidTemplate { .. })
        ));
        let empty = ToolAdapter::with_template(Tool::CrossMap, "   ");
        assert!(empty.build_command(&ctx("bed", "/out/o.bed")).is_err());
    }

    #[test]
    fn test_extract_version() {
        assert_eq!(extract_version("CrossMap version 0.7.0\n").as_deref(), Some("0.7.0"));
        assert_eq!(extract_version("fast-crossmap 1.2.3").as_deref(), Some("1.2.3"));
        assert_eq!(
            extract_version("liftOver - Move annotations from one assembly to another\nv469").as_deref(),
            None
        );
        assert_eq!(extract_version("FastRemap v1.0").as_deref(), Some("1.0"));
        assert_eq!(extract_version("no digits here"), None);
    }

    #[test]
    fn test_default_reference() {
        assert_eq!(Tool::default_reference("bed"), Tool::LiftOver);
        assert_eq!(Tool::default_reference("vcf"), Tool::CrossMap);
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_version_missing_binary() {
        let adapter = ToolAdapter::with_template(Tool::CrossMap, "liftbench-no-such-tool {input}");
        let version = adapter.probe_version(&ProcessRunner::new(), Duration::from_secs(2));
        assert_eq!(version, "not installed");
    }
}
