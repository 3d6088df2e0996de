//! Markdown discrepancy listing

use crate::report::AccuracyReport;
use std::fmt::Write;

/// Render an accuracy report as Markdown, listing at most `max_listed`
/// discrepancies per tool.
pub fn generate_discrepancy_markdown(report: &AccuracyReport, max_listed: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Liftover Accuracy Discrepancies\n");
    let _ = writeln!(
        out,
        "- Generated: {}",
        report.meta.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "- Input: `{}` ({})", report.input_file, report.format);
    let _ = writeln!(out, "- Reference tool: {}", report.reference_tool);
    let _ = writeln!(out, "- Tracked records: {}\n", report.total_input_records);

    for result in &report.results {
        let _ = writeln!(out, "## {} vs {}\n", result.test_tool, result.reference_tool);
        let _ = writeln!(
            out,
            "- Identity rate: {:.2}% ({}/{})",
            result.identity_rate * 100.0,
            result.identical,
            result.total
        );
        let _ = writeln!(
            out,
            "- Matched (drift <= 1): {}, drift 0/1/2-100/>100: {}/{}/{}/{}",
            result.matched,
            result.drift_zero,
            result.drift_one,
            result.drift_small,
            result.drift_large
        );
        let _ = writeln!(
            out,
            "- Partial matches: {}, coordinate mismatches: {}, missing: {}",
            result.partial_match, result.coordinate_mismatch, result.missing_in_test
        );
        let _ = writeln!(
            out,
            "- Unmapped agreement: {}/{} ({:.2}%)",
            result.unmapped_matched,
            result.unmapped_total,
            result.unmapped_identity_rate * 100.0
        );
        for warning in &result.warnings {
            let _ = writeln!(out, "- ⚠ {}", warning);
        }
        out.push('\n');

        if result.discrepancies.is_empty() {
            let _ = writeln!(out, "No discrepancies.\n");
            continue;
        }

        let _ = writeln!(out, "| Record | Field | Reference | Test | Drift |");
        let _ = writeln!(out, "|--------|-------|-----------|------|-------|");
        for d in result.discrepancies.iter().take(max_listed) {
            let drift = d
                .drift_distance
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                d.record_key, d.field, d.reference_value, d.test_value, drift
            );
        }
        if result.discrepancies.len() > max_listed {
            let _ = writeln!(
                out,
                "\n... and {} more",
                result.discrepancies.len() - max_listed
            );
        }
        out.push('\n');
    }

    out
}
