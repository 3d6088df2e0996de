#![warn(missing_docs)]
//! liftbench Accuracy
//!
//! Per-record reconciliation between a liftover tool under test and a
//! gold-standard tool.
//!
//! ```text
//! input.bed ──► index_file ──► indexed.bed (name = ID_<n>)
//!                                  │
//!                   ┌──────────────┴──────────────┐
//!                   ▼                             ▼
//!              test tool                    reference tool
//!                   │                             │
//!              load_indexed                  load_indexed
//!                   └──────► AccuracyComparator ◄─┘
//!                                  │
//!                            AccuracyResult
//! ```
//!
//! The tracking identifier rides in the BED name column (column 4). Every
//! supported liftover tool copies that column verbatim, which is what lets
//! output records be traced back to their input record, including records a
//! tool splits into several pieces.

mod comparator;
mod error;
mod indexer;
mod record;

pub use comparator::{
    AccuracyComparator, AccuracyResult, AccuracyVerdict, ComparatorConfig, Discrepancy,
    DriftBucket, IDENTITY_WARNING_THRESHOLD,
};
pub use error::RecordError;
pub use indexer::{
    ID_PREFIX, IndexedInput, IndexedRecordSet, format_record_id, index, index_file, load_indexed,
    load_unmapped_ids, parse_record_id,
};
pub use record::{GenomicRecord, count_record_lines, open_text};
