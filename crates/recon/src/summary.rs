use std::fmt::Write as _;

use crate::model::{ComparisonResult, ComparisonResults, SummaryRow};

/// Summary sheet header, in column order.
pub const SUMMARY_HEADERS: [&str; 8] = [
    "File Name",
    "Match Columns",
    "Base Records",
    "Comparison Records",
    "Matched",
    "Missing in Comparison",
    "Extra in Comparison",
    "Match Rate %",
];

impl From<&ComparisonResult> for SummaryRow {
    fn from(r: &ComparisonResult) -> Self {
        SummaryRow {
            file_name: r.file_name.clone(),
            match_columns: r.match_columns.join(", "),
            base_records: r.total_base_records,
            comparison_records: r.total_comp_records,
            matched: r.matched_count(),
            missing: r.missing_count(),
            extra: r.extra_count(),
            match_rate: r.match_rate(),
        }
    }
}

/// One summary row per result, in collection order.
pub fn compute_summary(results: &ComparisonResults) -> Vec<SummaryRow> {
    results.values().map(SummaryRow::from).collect()
}

/// Human-readable per-file breakdown.
pub fn render_detailed_summary(results: &ComparisonResults) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "DETAILED COMPARISON SUMMARY");
    let _ = writeln!(out, "{}", "=".repeat(60));

    for result in results.values() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", result.file_name);
        let _ = writeln!(out, "{}", "-".repeat(40));
        let _ = writeln!(out, "Match Columns: {}", result.match_columns.join(", "));
        let _ = writeln!(out, "Base Records: {}", result.total_base_records);
        let _ = writeln!(out, "Comparison Records: {}", result.total_comp_records);
        let _ = writeln!(out, "Matched: {}", result.matched_count());
        let _ = writeln!(out, "Missing: {}", result.missing_count());
        let _ = writeln!(out, "Extra: {}", result.extra_count());
        if result.total_base_records > 0 {
            let _ = writeln!(out, "Match Rate: {:.2}%", result.match_rate());
        }
    }
    out
}
