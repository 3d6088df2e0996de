//! Record indexing
//!
//! Stamps every input record with a dense, zero-based tracking identifier
//! `ID_<n>` in the BED name column, and loads tool output back into
//! identifier-keyed sets.
//!
//! The name-column convention is an external contract with the liftover
//! tools: it only works because they copy column 4 through unchanged.

use crate::error::RecordError;
use crate::record::{GenomicRecord, open_text};
use fxhash::{FxHashMap, FxHashSet};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Prefix of every tracking identifier.
pub const ID_PREFIX: &str = "ID_";

/// Render the tracking identifier for record `id`.
pub fn format_record_id(id: usize) -> String {
    format!("{ID_PREFIX}{id}")
}

/// Parse a tracking identifier. Anything other than `ID_<digits>` is `None`.
pub fn parse_record_id(name: &str) -> Option<usize> {
    let digits = name.strip_prefix(ID_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Input records after identifier assignment, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedInput {
    /// Record `n` carries name `ID_<n>`
    pub records: Vec<GenomicRecord>,
}

impl IndexedInput {
    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records were indexed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Assign `ID_<n>` names in input order.
///
/// Score and strand default to `0` and `.` so the identifier always lands in
/// column 4 of a BED6 line.
pub fn index(records: impl IntoIterator<Item = GenomicRecord>) -> IndexedInput {
    let records = records
        .into_iter()
        .enumerate()
        .map(|(id, record)| stamp(id, record))
        .collect();
    IndexedInput { records }
}

fn stamp(id: usize, mut record: GenomicRecord) -> GenomicRecord {
    record.name = format_record_id(id);
    record.score.get_or_insert_with(|| "0".to_string());
    record.strand.get_or_insert_with(|| ".".to_string());
    record
}

/// Stream `input` (optionally gzip-compressed) into an indexed BED file.
///
/// Returns the number of records written.
pub fn index_file(input: &Path, output: &Path) -> Result<usize, RecordError> {
    let reader = open_text(input)?;
    let file = File::create(output).map_err(|e| RecordError::write(output, e))?;
    let mut writer = BufWriter::new(file);

    let mut count = 0usize;
    for line in reader.split(b'\n') {
        let line = line.map_err(|e| RecordError::read(input, e))?;
        let Some(record) = GenomicRecord::parse_bytes(&line) else {
            continue;
        };
        let record = stamp(count, record);
        writeln!(writer, "{}", record.to_line()).map_err(|e| RecordError::write(output, e))?;
        count += 1;
    }
    writer.flush().map_err(|e| RecordError::write(output, e))?;

    debug!(
        "indexed {} records from {} into {}",
        count,
        input.display(),
        output.display()
    );
    Ok(count)
}

/// Tool output grouped by tracking identifier.
///
/// A record split by a tool appears as several entries under one identifier.
#[derive(Debug, Clone, Default)]
pub struct IndexedRecordSet {
    by_id: FxHashMap<usize, Vec<GenomicRecord>>,
    dropped: usize,
}

impl IndexedRecordSet {
    /// Group records by their parsed identifier, dropping unparseable names.
    pub fn from_records(records: impl IntoIterator<Item = GenomicRecord>) -> Self {
        let mut set = Self::default();
        for record in records {
            set.insert(record);
        }
        set
    }

    fn insert(&mut self, record: GenomicRecord) {
        match parse_record_id(&record.name) {
            Some(id) => self.by_id.entry(id).or_default().push(record),
            None => self.dropped += 1,
        }
    }

    /// Pieces recorded for `id`; empty when the tool produced none.
    pub fn get(&self, id: usize) -> &[GenomicRecord] {
        self.by_id.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct identifiers present.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True when no identifier is present.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Total number of output lines kept, counting every split piece.
    pub fn record_count(&self) -> usize {
        self.by_id.values().map(Vec::len).sum()
    }

    /// Lines dropped because their name was not a tracking identifier.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Identifiers present, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_id.keys().copied()
    }

    /// True when `id` has at least one piece.
    pub fn contains(&self, id: usize) -> bool {
        self.by_id.contains_key(&id)
    }
}

/// Load a tool's output file. A missing file is an empty set.
pub fn load_indexed(path: &Path) -> Result<IndexedRecordSet, RecordError> {
    if !path.exists() {
        debug!("{} does not exist, treating as empty output", path.display());
        return Ok(IndexedRecordSet::default());
    }

    let reader = open_text(path)?;
    let mut set = IndexedRecordSet::default();
    for line in reader.split(b'\n') {
        let line = line.map_err(|e| RecordError::read(path, e))?;
        if let Some(record) = GenomicRecord::parse_bytes(&line) {
            set.insert(record);
        }
    }

    if set.dropped() > 0 {
        warn!(
            "{}: dropped {} records without a valid {}<n> identifier",
            path.display(),
            set.dropped(),
            ID_PREFIX
        );
    }
    Ok(set)
}

/// Identifiers listed in an unmapped companion file. A missing file is empty.
pub fn load_unmapped_ids(path: &Path) -> Result<FxHashSet<usize>, RecordError> {
    Ok(load_indexed(path)?.ids().collect())
}
