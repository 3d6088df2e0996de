//! Minimal tab-separated genomic record extraction

use crate::error::RecordError;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One interval line from a BED-like file.
///
/// Only `chrom`, `start` and `end` take part in comparisons; the remaining
/// columns are carried along so an indexed file keeps the input's shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenomicRecord {
    /// Chromosome / contig name
    pub chrom: String,
    /// Start coordinate (0-based, as written in the file)
    pub start: i64,
    /// End coordinate
    pub end: i64,
    /// Name column; holds the `ID_<n>` tracking identifier after indexing
    pub name: String,
    /// Score column, if present
    pub score: Option<String>,
    /// Strand column, if present
    pub strand: Option<String>,
    /// Any further columns, verbatim
    pub extra: Vec<String>,
}

impl GenomicRecord {
    /// Parse one line. Returns `None` for blank, comment (`#`), `track` and
    /// `browser` lines, and for lines that lack three columns or numeric
    /// coordinates.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() || is_header(line) {
            return None;
        }

        let mut fields = line.split('\t');
        let chrom = fields.next()?.trim();
        let start = fields.next()?.trim().parse::<i64>().ok()?;
        let end = fields.next()?.trim().parse::<i64>().ok()?;
        if chrom.is_empty() {
            return None;
        }

        let name = fields.next().unwrap_or_default().to_string();
        let score = fields.next().map(str::to_string);
        let strand = fields.next().map(str::to_string);
        let extra = fields.map(str::to_string).collect();

        Some(Self {
            chrom: chrom.to_string(),
            start,
            end,
            name,
            score,
            strand,
            extra,
        })
    }

    /// Parse one raw line. Invalid UTF-8 is replaced rather than rejected, so
    /// a stray byte in a free-text column does not cost the record.
    pub fn parse_bytes(line: &[u8]) -> Option<Self> {
        Self::parse(&String::from_utf8_lossy(line))
    }

    /// Comparison identity.
    pub fn coords(&self) -> (&str, i64, i64) {
        (&self.chrom, self.start, self.end)
    }

    /// Render as a tab-separated line without trailing newline.
    pub fn to_line(&self) -> String {
        let mut line = format!("{}\t{}\t{}", self.chrom, self.start, self.end);
        let has_tail = self.score.is_some() || self.strand.is_some() || !self.extra.is_empty();
        if !self.name.is_empty() || has_tail {
            line.push('\t');
            line.push_str(&self.name);
        }
        for column in self.score.iter().chain(self.strand.iter()).chain(self.extra.iter()) {
            line.push('\t');
            line.push_str(column);
        }
        line
    }

    /// `chrom:start-end`, used in discrepancy listings.
    pub fn locus(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.start, self.end)
    }
}

fn is_header(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("track") || line.starts_with("browser")
}

/// Open a text file for buffered reading, transparently decompressing `.gz`.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>, RecordError> {
    let file = File::open(path).map_err(|e| RecordError::read(path, e))?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

const HEADER_PREFIXES: &[&[u8]] = &[b"#", b"@", b"track", b"browser"];

/// Count data lines: non-blank lines that are not `#`, `@`, `track` or
/// `browser` headers.
///
/// Works on raw bytes so stray non-UTF-8 content does not abort the count.
pub fn count_record_lines(path: &Path) -> Result<usize, RecordError> {
    let reader = open_text(path)?;
    let mut count = 0;
    for line in reader.split(b'\n') {
        let line = line.map_err(|e| RecordError::read(path, e))?;
        let trimmed = line.trim_ascii();
        let header = HEADER_PREFIXES.iter().any(|prefix| trimmed.starts_with(prefix));
        if !trimmed.is_empty() && !header {
            count += 1;
        }
    }
    Ok(count)
}
