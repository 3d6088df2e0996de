//! Per-record accuracy comparison
//!
//! Every tracked identifier in `[0, total)` receives at most one verdict:
//!
//! | reference | test        | verdict                                   |
//! |-----------|-------------|-------------------------------------------|
//! | n pieces  | n pieces    | `Identical` or `CoordinateMismatch`       |
//! | n pieces  | m != n      | `PartialMatch`                            |
//! | n pieces  | none        | `MissingInTest`                           |
//! | none      | any         | no verdict (the reference is ground truth) |
//!
//! Same-length comparisons also bucket the largest per-piece coordinate drift,
//! where a drift of 1 is treated as an off-by-one coordinate convention and
//! still counts as matched.

use crate::indexer::{IndexedRecordSet, format_record_id};
use crate::record::GenomicRecord;
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Identity rate below which a result carries a warning.
pub const IDENTITY_WARNING_THRESHOLD: f64 = 0.99;

/// Classification of one tracked record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyVerdict {
    /// Same number of pieces with exactly equal coordinates
    Identical,
    /// The tools split the record into a different number of pieces
    PartialMatch,
    /// Same number of pieces, at least one coordinate differs
    CoordinateMismatch,
    /// The reference mapped the record, the tool under test did not
    MissingInTest,
}

/// Coordinate drift bucket of a same-length comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftBucket {
    /// Exact agreement
    Zero,
    /// Off by one base, counted as matched
    One,
    /// 2 to 100 bases
    Small,
    /// More than 100 bases
    Large,
}

impl DriftBucket {
    /// Bucket a drift distance in bases.
    pub fn classify(drift: u64) -> Self {
        match drift {
            0 => DriftBucket::Zero,
            1 => DriftBucket::One,
            2..=100 => DriftBucket::Small,
            _ => DriftBucket::Large,
        }
    }
}

/// A single field-level disagreement kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Tracking identifier of the record (`ID_<n>`)
    pub record_key: String,
    /// What disagrees: `coordinates`, `chrom`, `piece_count`, `mapping_status`
    /// or `unmapped_status`
    pub field: String,
    /// Value produced by the reference tool
    pub reference_value: String,
    /// Value produced by the tool under test
    pub test_value: String,
    /// Largest coordinate drift, for coordinate discrepancies
    pub drift_distance: Option<u64>,
}

/// Comparator settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparatorConfig {
    /// Identity rate below which a warning is attached
    pub identity_warning_threshold: f64,
    /// Compare chromosome names with any leading `chr` removed
    pub normalize_chrom: bool,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            identity_warning_threshold: IDENTITY_WARNING_THRESHOLD,
            normalize_chrom: false,
        }
    }
}

/// Aggregate accuracy of one tool against the reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyResult {
    /// Tool under test
    pub test_tool: String,
    /// Gold-standard tool
    pub reference_tool: String,
    /// Number of tracked input records
    pub total: usize,
    /// Records with drift 0 or 1
    pub matched: usize,
    /// Records with the `Identical` verdict
    pub identical: usize,
    /// Records with the `PartialMatch` verdict
    pub partial_match: usize,
    /// Records with the `CoordinateMismatch` verdict
    pub coordinate_mismatch: usize,
    /// Records with the `MissingInTest` verdict
    pub missing_in_test: usize,
    /// `identical / total`, 0 when `total` is 0
    pub identity_rate: f64,
    /// Tracked identifiers the tool under test produced
    pub mapped_records: usize,
    /// `mapped_records / total`, 0 when `total` is 0
    pub mapping_rate: f64,
    /// Records whose largest drift was 0
    pub drift_zero: usize,
    /// Records whose largest drift was 1
    pub drift_one: usize,
    /// Records whose largest drift was 2-100
    pub drift_small: usize,
    /// Records whose largest drift exceeded 100
    pub drift_large: usize,
    /// Records either tool reported unmapped
    pub unmapped_total: usize,
    /// Records both tools reported unmapped
    pub unmapped_matched: usize,
    /// `unmapped_matched / unmapped_total`, 0 when nothing was unmapped
    pub unmapped_identity_rate: f64,
    /// Field-level disagreements, untruncated
    pub discrepancies: Vec<Discrepancy>,
    /// Non-fatal warnings
    pub warnings: Vec<String>,
    /// Verdict per identifier, index = identifier
    #[serde(skip)]
    pub verdicts: Vec<Option<AccuracyVerdict>>,
}

impl AccuracyResult {
    /// Attach tool names.
    pub fn labelled(mut self, test_tool: impl Into<String>, reference_tool: impl Into<String>) -> Self {
        self.test_tool = test_tool.into();
        self.reference_tool = reference_tool.into();
        self
    }

    /// Verdict for one identifier.
    pub fn verdict(&self, id: usize) -> Option<AccuracyVerdict> {
        self.verdicts.get(id).copied().flatten()
    }

    /// Fold in agreement between the two tools' unmapped identifier sets.
    pub fn record_unmapped(&mut self, test: &FxHashSet<usize>, reference: &FxHashSet<usize>) {
        self.unmapped_matched = test.intersection(reference).count();
        self.unmapped_total = test.union(reference).count();
        self.unmapped_identity_rate = ratio(self.unmapped_matched, self.unmapped_total);

        let mut only_test: Vec<usize> = test.difference(reference).copied().collect();
        let mut only_reference: Vec<usize> = reference.difference(test).copied().collect();
        only_test.sort_unstable();
        only_reference.sort_unstable();

        for id in only_test {
            self.discrepancies.push(Discrepancy {
                record_key: format_record_id(id),
                field: "unmapped_status".to_string(),
                reference_value: "mapped".to_string(),
                test_value: "unmapped".to_string(),
                drift_distance: None,
            });
        }
        for id in only_reference {
            self.discrepancies.push(Discrepancy {
                record_key: format_record_id(id),
                field: "unmapped_status".to_string(),
                reference_value: "unmapped".to_string(),
                test_value: "mapped".to_string(),
                drift_distance: None,
            });
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Outcome for one identifier before aggregation.
struct RecordOutcome {
    verdict: Option<AccuracyVerdict>,
    bucket: Option<DriftBucket>,
    discrepancy: Option<Discrepancy>,
}

/// Compares a tool's indexed output against the reference output.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccuracyComparator {
    config: ComparatorConfig,
}

impl AccuracyComparator {
    /// Comparator with explicit settings.
    pub fn new(config: ComparatorConfig) -> Self {
        Self { config }
    }

    /// Active settings.
    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    /// Verdict for one identifier's pieces.
    pub fn classify(
        &self,
        test: &[GenomicRecord],
        reference: &[GenomicRecord],
    ) -> Option<AccuracyVerdict> {
        self.compare_record(0, test, reference).verdict
    }

    /// Compare every identifier in `[0, total)`.
    pub fn compare(
        &self,
        test: &IndexedRecordSet,
        reference: &IndexedRecordSet,
        total: usize,
    ) -> AccuracyResult {
        let mut result = AccuracyResult {
            total,
            verdicts: Vec::with_capacity(total),
            ..AccuracyResult::default()
        };

        for id in 0..total {
            let outcome = self.compare_record(id, test.get(id), reference.get(id));
            match outcome.verdict {
                Some(AccuracyVerdict::Identical) => result.identical += 1,
                Some(AccuracyVerdict::PartialMatch) => result.partial_match += 1,
                Some(AccuracyVerdict::CoordinateMismatch) => result.coordinate_mismatch += 1,
                Some(AccuracyVerdict::MissingInTest) => result.missing_in_test += 1,
                None => {}
            }
            match outcome.bucket {
                Some(DriftBucket::Zero) => result.drift_zero += 1,
                Some(DriftBucket::One) => result.drift_one += 1,
                Some(DriftBucket::Small) => result.drift_small += 1,
                Some(DriftBucket::Large) => result.drift_large += 1,
                None => {}
            }
            if let Some(discrepancy) = outcome.discrepancy {
                result.discrepancies.push(discrepancy);
            }
            result.verdicts.push(outcome.verdict);
        }

        result.matched = result.drift_zero + result.drift_one;
        result.mapped_records = test.ids().filter(|&id| id < total).count();
        result.identity_rate = ratio(result.identical, total);
        result.mapping_rate = ratio(result.mapped_records, total);

        if total == 0 {
            result.warnings.push("No input records to compare".to_string());
        } else if result.identity_rate < self.config.identity_warning_threshold {
            result.warnings.push(format!(
                "Identity Rate ({:.2}%) is below {:.0}% threshold",
                result.identity_rate * 100.0,
                self.config.identity_warning_threshold * 100.0
            ));
        }
        result
    }

    fn chrom<'a>(&self, chrom: &'a str) -> &'a str {
        if self.config.normalize_chrom {
            chrom.strip_prefix("chr").unwrap_or(chrom)
        } else {
            chrom
        }
    }

    fn sorted<'a>(&self, records: &'a [GenomicRecord]) -> Vec<(&'a str, i64, i64)> {
        let mut keys: Vec<_> = records
            .iter()
            .map(|r| (self.chrom(&r.chrom), r.start, r.end))
            .collect();
        keys.sort_unstable();
        keys
    }

    fn compare_record(
        &self,
        id: usize,
        test: &[GenomicRecord],
        reference: &[GenomicRecord],
    ) -> RecordOutcome {
        let none = RecordOutcome {
            verdict: None,
            bucket: None,
            discrepancy: None,
        };

        match (test.is_empty(), reference.is_empty()) {
            (_, true) => none,
            (true, false) => RecordOutcome {
                verdict: Some(AccuracyVerdict::MissingInTest),
                discrepancy: Some(Discrepancy {
                    record_key: format_record_id(id),
                    field: "mapping_status".to_string(),
                    reference_value: join_loci(reference),
                    test_value: "missing".to_string(),
                    drift_distance: None,
                }),
                ..none
            },
            (false, false) if test.len() != reference.len() => RecordOutcome {
                verdict: Some(AccuracyVerdict::PartialMatch),
                discrepancy: Some(Discrepancy {
                    record_key: format_record_id(id),
                    field: "piece_count".to_string(),
                    reference_value: reference.len().to_string(),
                    test_value: test.len().to_string(),
                    drift_distance: None,
                }),
                ..none
            },
            (false, false) => self.compare_pieces(id, test, reference),
        }
    }

    fn compare_pieces(
        &self,
        id: usize,
        test: &[GenomicRecord],
        reference: &[GenomicRecord],
    ) -> RecordOutcome {
        let test_keys = self.sorted(test);
        let reference_keys = self.sorted(reference);

        let identical = test_keys == reference_keys;
        let verdict = Some(if identical {
            AccuracyVerdict::Identical
        } else {
            AccuracyVerdict::CoordinateMismatch
        });

        let mut chrom_mismatch = None;
        let mut worst: Option<(u64, usize)> = None;
        for (i, (t, r)) in test_keys.iter().zip(&reference_keys).enumerate() {
            if t.0 != r.0 {
                chrom_mismatch.get_or_insert(i);
                continue;
            }
            let drift = t.1.abs_diff(r.1).max(t.2.abs_diff(r.2));
            if worst.is_none_or(|(max, _)| drift > max) {
                worst = Some((drift, i));
            }
        }

        let record_key = format_record_id(id);
        if let Some(i) = chrom_mismatch {
            return RecordOutcome {
                verdict,
                bucket: None,
                discrepancy: Some(Discrepancy {
                    record_key,
                    field: "chrom".to_string(),
                    reference_value: reference_keys[i].0.to_string(),
                    test_value: test_keys[i].0.to_string(),
                    drift_distance: None,
                }),
            };
        }

        let Some((drift, i)) = worst else {
            return RecordOutcome {
                verdict,
                bucket: None,
                discrepancy: None,
            };
        };
        let discrepancy = (drift > 1).then(|| Discrepancy {
            record_key,
            field: "coordinates".to_string(),
            reference_value: format!("{}-{}", reference_keys[i].1, reference_keys[i].2),
            test_value: format!("{}-{}", test_keys[i].1, test_keys[i].2),
            drift_distance: Some(drift),
        });

        RecordOutcome {
            verdict,
            bucket: Some(DriftBucket::classify(drift)),
            discrepancy,
        }
    }
}

fn join_loci(records: &[GenomicRecord]) -> String {
    records
        .iter()
        .map(GenomicRecord::locus)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(id: usize, chrom: &str, start: i64, end: i64) -> GenomicRecord {
        GenomicRecord {
            chrom: chrom.to_string(),
            start,
            end,
            name: format_record_id(id),
            score: Some("0".to_string()),
            strand: Some("+".to_string()),
            extra: Vec::new(),
        }
    }

    fn set(pieces: Vec<GenomicRecord>) -> IndexedRecordSet {
        IndexedRecordSet::from_records(pieces)
    }

    #[test]
    fn test_drift_buckets() {
        assert_eq!(DriftBucket::classify(0), DriftBucket::Zero);
        assert_eq!(DriftBucket::classify(1), DriftBucket::One);
        assert_eq!(DriftBucket::classify(2), DriftBucket::Small);
        assert_eq!(DriftBucket::classify(100), DriftBucket::Small);
        assert_eq!(DriftBucket::classify(101), DriftBucket::Large);
    }

    #[test]
    fn test_all_identical() {
        let pieces = vec![
            piece(0, "chr1", 100, 200),
            piece(1, "chr1", 300, 400),
            piece(2, "chr2", 500, 600),
        ];
        let result = AccuracyComparator::default().compare(&set(pieces.clone()), &set(pieces), 3);

        assert_eq!(result.identical, 3);
        assert!((result.identity_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.drift_zero, 3);
        assert_eq!(result.drift_one + result.drift_small + result.drift_large, 0);
        assert_eq!(result.matched, 3);
        assert!(result.warnings.is_empty());
        assert!(result.discrepancies.is_empty());
        assert!((result.mapping_rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_split_record_is_partial_match() {
        let reference = set(vec![piece(0, "chr1", 100, 200), piece(0, "chr1", 300, 400)]);
        let test = set(vec![piece(0, "chr1", 100, 400)]);
        let result = AccuracyComparator::default().compare(&test, &reference, 1);

        assert_eq!(result.verdict(0), Some(AccuracyVerdict::PartialMatch));
        assert_eq!(result.partial_match, 1);
        assert_eq!(result.identical, 0);
        assert_eq!(result.discrepancies[0].field, "piece_count");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("below 99% threshold"));
    }

    #[test]
    fn test_piece_order_does_not_matter() {
        let reference = set(vec![piece(0, "chr1", 300, 400), piece(0, "chr1", 100, 200)]);
        let test = set(vec![piece(0, "chr1", 100, 200), piece(0, "chr1", 300, 400)]);
        let result = AccuracyComparator::default().compare(&test, &reference, 1);
        assert_eq!(result.verdict(0), Some(AccuracyVerdict::Identical));
    }

    #[test]
    fn test_off_by_one_counts_as_matched() {
        let reference = set(vec![piece(0, "chr1", 100, 200)]);
        let test = set(vec![piece(0, "chr1", 101, 200)]);
        let result = AccuracyComparator::default().compare(&test, &reference, 1);

        assert_eq!(result.verdict(0), Some(AccuracyVerdict::CoordinateMismatch));
        assert_eq!(result.drift_one, 1);
        assert_eq!(result.matched, 1);
        assert_eq!(result.identical, 0);
        assert!(result.discrepancies.is_empty());
    }

    #[test]
    fn test_large_drift_discrepancy() {
        let reference = set(vec![piece(0, "chr1", 100, 200)]);
        let test = set(vec![piece(0, "chr1", 5100, 5200)]);
        let result = AccuracyComparator::default().compare(&test, &reference, 1);

        assert_eq!(result.drift_large, 1);
        assert_eq!(result.matched, 0);
        let discrepancy = &result.discrepancies[0];
        assert_eq!(discrepancy.record_key, "ID_0");
        assert_eq!(discrepancy.field, "coordinates");
        assert_eq!(discrepancy.reference_value, "100-200");
        assert_eq!(discrepancy.test_value, "5100-5200");
        assert_eq!(discrepancy.drift_distance, Some(5000));
    }

    #[test]
    fn test_missing_in_test_and_test_only_asymmetry() {
        let reference = set(vec![piece(0, "chr1", 100, 200)]);
        let test = set(vec![piece(1, "chr1", 100, 200)]);
        let result = AccuracyComparator::default().compare(&test, &reference, 2);

        assert_eq!(result.verdict(0), Some(AccuracyVerdict::MissingInTest));
        assert_eq!(result.verdict(1), None);
        assert_eq!(result.missing_in_test, 1);
        assert_eq!(result.mapped_records, 1);
        assert!((result.identity_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_chrom_mismatch_not_bucketed() {
        let reference = set(vec![piece(0, "chr1", 100, 200)]);
        let test = set(vec![piece(0, "1", 100, 200)]);

        let strict = AccuracyComparator::default().compare(&test, &reference, 1);
        assert_eq!(strict.verdict(0), Some(AccuracyVerdict::CoordinateMismatch));
        assert_eq!(strict.drift_zero + strict.drift_one + strict.drift_small + strict.drift_large, 0);
        assert_eq!(strict.discrepancies[0].field, "chrom");

        let normalizing = AccuracyComparator::new(ComparatorConfig {
            normalize_chrom: true,
            ..ComparatorConfig::default()
        })
        .compare(&test, &reference, 1);
        assert_eq!(normalizing.verdict(0), Some(AccuracyVerdict::Identical));
        assert_eq!(normalizing.drift_zero, 1);
    }

    #[test]
    fn test_zero_total() {
        let result =
            AccuracyComparator::default().compare(&IndexedRecordSet::default(), &IndexedRecordSet::default(), 0);
        assert_eq!(result.identity_rate, 0.0);
        assert_eq!(result.mapping_rate, 0.0);
        assert!(result.verdicts.is_empty());
    }

    #[test]
    fn test_unmapped_agreement() {
        let test: FxHashSet<usize> = [1, 2, 3].into_iter().collect();
        let reference: FxHashSet<usize> = [2, 3, 4].into_iter().collect();
        let mut result = AccuracyResult::default();
        result.record_unmapped(&test, &reference);

        assert_eq!(result.unmapped_total, 4);
        assert_eq!(result.unmapped_matched, 2);
        assert!((result.unmapped_identity_rate - 0.5).abs() < 1e-12);
        assert_eq!(result.discrepancies.len(), 2);
        assert_eq!(result.discrepancies[0].record_key, "ID_1");
        assert_eq!(result.discrepancies[1].record_key, "ID_4");
    }

    #[test]
    fn test_custom_warning_threshold() {
        let reference = set(vec![piece(0, "chr1", 1, 2), piece(1, "chr1", 3, 4)]);
        let test = set(vec![piece(0, "chr1", 1, 2)]);
        let comparator = AccuracyComparator::new(ComparatorConfig {
            identity_warning_threshold: 0.5,
            normalize_chrom: false,
        });
        let result = comparator.compare(&test, &reference, 2);
        assert!((result.identity_rate - 0.5).abs() < 1e-12);
        assert!(result.warnings.is_empty());
    }
}
