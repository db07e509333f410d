// Comparison report export (xlsx)
//
// One Summary sheet plus up to three detail sheets per compared file.
// The workbook is serialized unformatted first; the formatted variant
// replaces it only if the formatting pass succeeds.

use std::path::Path;

use indexmap::IndexMap;
use rust_xlsxwriter::{Color, Format, Workbook as XlsxWorkbook, Worksheet, XlsxError};
use thiserror::Error;

use recordmatch_recon::config::{parse_hex_color, INVALID_SHEET_CHARS};
use recordmatch_recon::model::format_number;
use recordmatch_recon::summary::{compute_summary, SUMMARY_HEADERS};
use recordmatch_recon::{CellValue, ComparisonResults, Dataset, ReportStyle, SummaryRow};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no comparison results to export")]
    NoResults,
    #[error("failed to build workbook: {0}")]
    Workbook(String),
    #[error("failed to write report: {0}")]
    Io(String),
}

impl From<XlsxError> for ExportError {
    fn from(e: XlsxError) -> Self {
        Self::Workbook(e.to_string())
    }
}

/// The serialized workbook plus what happened while building it.
#[derive(Debug)]
pub struct ReportOutput {
    pub bytes: Vec<u8>,
    /// Sheet names in workbook order.
    pub sheet_names: Vec<String>,
    /// False when the formatting pass failed and the plain workbook was kept.
    pub formatted: bool,
    pub warnings: Vec<String>,
}

enum SheetBody<'a> {
    Summary(&'a [SummaryRow]),
    Rows(&'a Dataset),
}

struct PlannedSheet<'a> {
    name: String,
    body: SheetBody<'a>,
}

/// Header format and column widths applied to the Summary sheet.
struct SummaryFormatting {
    header: Format,
    widths: Vec<f64>,
}

/// Build the report workbook in memory.
pub fn export_report(
    results: &ComparisonResults,
    style: &ReportStyle,
) -> Result<ReportOutput, ExportError> {
    if results.is_empty() {
        return Err(ExportError::NoResults);
    }

    let summary = compute_summary(results);
    let mut warnings = Vec::new();
    let plan = plan_sheets(results, &summary, style, &mut warnings);

    let mut bytes = build_workbook(&plan, None)?;

    let formatted = match format_summary(&plan, &summary, style) {
        Ok(formatted_bytes) => {
            bytes = formatted_bytes;
            true
        }
        Err(e) => {
            log::warn!("could not apply report formatting: {e}");
            warnings.push(format!("could not apply formatting: {e}"));
            false
        }
    };

    Ok(ReportOutput {
        bytes,
        sheet_names: plan.into_iter().map(|s| s.name).collect(),
        formatted,
        warnings,
    })
}

/// Build the report and write it to `path`.
pub fn export_report_to_path(
    results: &ComparisonResults,
    style: &ReportStyle,
    path: &Path,
) -> Result<ReportOutput, ExportError> {
    let output = export_report(results, style)?;
    std::fs::write(path, &output.bytes)
        .map_err(|e| ExportError::Io(format!("{}: {e}", path.display())))?;
    log::info!("results exported to {}", path.display());
    Ok(output)
}

/// File name minus `.xlsx`/`.xls`, made safe for a sheet name and cut to `limit` chars.
pub fn safe_sheet_stem(file_name: &str, limit: usize) -> String {
    let stem = file_name
        .strip_suffix(".xlsx")
        .or_else(|| file_name.strip_suffix(".xls"))
        .unwrap_or(file_name);
    let cleaned: String = stem
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    cleaned.trim_matches('\'').chars().take(limit).collect()
}

/// `<stem>_<suffix>`, shortening the stem so the whole name fits in `limit`.
/// A limit too small for the suffix cuts the name itself.
pub fn detail_sheet_name(stem: &str, suffix: &str, limit: usize) -> String {
    let room = limit.saturating_sub(suffix.chars().count() + 1);
    let head: String = stem.chars().take(room).collect();
    format!("{head}_{suffix}").chars().take(limit).collect()
}

/// Decide sheet names and contents. Excel compares names case-insensitively,
/// so a later detail sheet whose name collides replaces the earlier one.
fn plan_sheets<'a>(
    results: &'a ComparisonResults,
    summary: &'a [SummaryRow],
    style: &ReportStyle,
    warnings: &mut Vec<String>,
) -> Vec<PlannedSheet<'a>> {
    let mut sheets: IndexMap<String, PlannedSheet<'a>> = IndexMap::new();
    let summary_key = style.summary_sheet.to_lowercase();
    sheets.insert(
        summary_key.clone(),
        PlannedSheet {
            name: style.summary_sheet.clone(),
            body: SheetBody::Summary(summary),
        },
    );

    for result in results.values() {
        let stem = safe_sheet_stem(&result.file_name, style.sheet_name_limit);
        let details = [
            ("Matched", &result.outcome.matched_base),
            ("Missing", &result.outcome.missing_records),
            ("Extra", &result.outcome.extra_records),
        ];

        for (suffix, rows) in details {
            if rows.is_empty() {
                continue;
            }
            let name = detail_sheet_name(&stem, suffix, style.sheet_name_limit);
            let key = name.to_lowercase();
            if key == summary_key {
                let msg = format!("sheet '{name}' would replace the summary sheet; skipped");
                log::warn!("{msg}");
                warnings.push(msg);
                continue;
            }
            let planned = PlannedSheet {
                name: name.clone(),
                body: SheetBody::Rows(rows),
            };
            if sheets.insert(key, planned).is_some() {
                let msg = format!("sheet '{name}' overwritten by a later file with the same name");
                log::warn!("{msg}");
                warnings.push(msg);
            }
        }
    }

    sheets.into_values().collect()
}

fn build_workbook(
    plan: &[PlannedSheet<'_>],
    formatting: Option<&SummaryFormatting>,
) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = XlsxWorkbook::new();

    for sheet in plan {
        let worksheet = workbook.add_worksheet().set_name(&sheet.name)?;
        match sheet.body {
            SheetBody::Summary(rows) => write_summary(worksheet, rows, formatting)?,
            SheetBody::Rows(dataset) => write_dataset(worksheet, dataset)?,
        }
    }

    workbook.save_to_buffer()
}

fn write_summary(
    worksheet: &mut Worksheet,
    rows: &[SummaryRow],
    formatting: Option<&SummaryFormatting>,
) -> Result<(), XlsxError> {
    for (col, header) in SUMMARY_HEADERS.iter().enumerate() {
        match formatting {
            Some(f) => worksheet.write_string_with_format(0, col as u16, *header, &f.header)?,
            None => worksheet.write_string(0, col as u16, *header)?,
        };
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &row.file_name)?;
        worksheet.write_string(r, 1, &row.match_columns)?;
        worksheet.write_number(r, 2, row.base_records as f64)?;
        worksheet.write_number(r, 3, row.comparison_records as f64)?;
        worksheet.write_number(r, 4, row.matched as f64)?;
        worksheet.write_number(r, 5, row.missing as f64)?;
        worksheet.write_number(r, 6, row.extra as f64)?;
        worksheet.write_number(r, 7, row.match_rate)?;
    }

    if let Some(f) = formatting {
        for (col, width) in f.widths.iter().enumerate() {
            worksheet.set_column_width(col as u16, *width)?;
        }
    }

    Ok(())
}

fn write_dataset(worksheet: &mut Worksheet, dataset: &Dataset) -> Result<(), XlsxError> {
    for (col, name) in dataset.columns().iter().enumerate() {
        worksheet.write_string(0, col as u16, name)?;
    }

    for (i, row) in dataset.rows().iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                CellValue::Text(s) if !s.is_empty() => {
                    worksheet.write_string(r, c, s)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(r, c, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
                _ => {}
            }
        }
    }

    Ok(())
}

/// Rebuild the workbook with the Summary header styled and columns sized.
fn format_summary(
    plan: &[PlannedSheet<'_>],
    summary: &[SummaryRow],
    style: &ReportStyle,
) -> Result<Vec<u8>, String> {
    let fill = parse_hex_color(&style.header_fill)?;
    let font = parse_hex_color(&style.header_font_color)?;

    let mut header = Format::new()
        .set_background_color(Color::RGB(fill))
        .set_font_color(Color::RGB(font));
    if style.header_bold {
        header = header.set_bold();
    }

    let formatting = SummaryFormatting {
        header,
        widths: summary_column_widths(summary, style),
    };

    build_workbook(plan, Some(&formatting)).map_err(|e| e.to_string())
}

/// `min(longest cell text + padding, max width)` per Summary column, header included.
fn summary_column_widths(rows: &[SummaryRow], style: &ReportStyle) -> Vec<f64> {
    let mut longest: Vec<usize> = SUMMARY_HEADERS.iter().map(|h| h.chars().count()).collect();

    for row in rows {
        let cells = [
            row.file_name.clone(),
            row.match_columns.clone(),
            row.base_records.to_string(),
            row.comparison_records.to_string(),
            row.matched.to_string(),
            row.missing.to_string(),
            row.extra.to_string(),
            format_number(row.match_rate),
        ];
        for (col, text) in cells.iter().enumerate() {
            longest[col] = longest[col].max(text.chars().count());
        }
    }

    longest
        .into_iter()
        .map(|len| (len + style.width_padding).min(style.max_column_width) as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordmatch_recon::model::{ComparisonResult, MatchKey, Reconciliation};

    fn result(name: &str, matched_rows: usize, missing_rows: usize, extra_rows: usize) -> ComparisonResult {
        let ids = |n: usize, offset: usize| {
            Dataset::from_rows(
                &["ID"],
                (0..n).map(|i| vec![CellValue::Number((offset + i) as f64)]).collect(),
            )
        };
        let mut outcome = Reconciliation {
            matched_base: ids(matched_rows, 0),
            matched_comp: ids(matched_rows, 0),
            missing_records: ids(missing_rows, 100),
            extra_records: ids(extra_rows, 200),
            ..Reconciliation::default()
        };
        outcome.matched = (0..matched_rows).map(|i| MatchKey::Text(i.to_string())).collect();
        outcome.missing = (0..missing_rows).map(|i| MatchKey::Text(format!("m{i}"))).collect();
        outcome.extra = (0..extra_rows).map(|i| MatchKey::Text(format!("e{i}"))).collect();
        ComparisonResult {
            file_name: name.into(),
            match_columns: vec!["ID".into()],
            total_base_records: matched_rows + missing_rows,
            total_comp_records: matched_rows + extra_rows,
            outcome,
        }
    }

    fn collection(items: Vec<ComparisonResult>) -> ComparisonResults {
        items.into_iter().map(|r| (r.file_name.clone(), r)).collect()
    }

    #[test]
    fn empty_collection_is_an_error() {
        let err = export_report(&ComparisonResults::new(), &ReportStyle::default()).unwrap_err();
        assert!(matches!(err, ExportError::NoResults));
    }

    #[test]
    fn only_non_empty_detail_sheets() {
        let results = collection(vec![result("jan.xlsx", 2, 0, 1), result("feb.xls", 0, 3, 0)]);
        let out = export_report(&results, &ReportStyle::default()).unwrap();
        assert_eq!(
            out.sheet_names,
            vec!["Summary", "jan_Matched", "jan_Extra", "feb_Missing"]
        );
        assert!(out.formatted);
        assert!(out.warnings.is_empty());
        assert!(out.bytes.starts_with(b"PK"));
    }

    #[test]
    fn stem_strips_extension_and_truncates() {
        assert_eq!(safe_sheet_stem("staff.xlsx", 31), "staff");
        assert_eq!(safe_sheet_stem("staff.xls", 31), "staff");
        assert_eq!(safe_sheet_stem("staff.csv", 31), "staff.csv");
        assert_eq!(safe_sheet_stem("a/b[1]?.xlsx", 31), "a_b_1__");
        let long = format!("{}.xlsx", "x".repeat(40));
        assert_eq!(safe_sheet_stem(&long, 31).len(), 31);
    }

    #[test]
    fn detail_names_fit_the_limit() {
        let stem = "y".repeat(31);
        let name = detail_sheet_name(&stem, "Missing", 31);
        assert_eq!(name.chars().count(), 31);
        assert!(name.ends_with("_Missing"));
        assert_eq!(detail_sheet_name("jan", "Extra", 31), "jan_Extra");
    }

    #[test]
    fn detail_names_never_exceed_a_short_limit() {
        for limit in 1..=10 {
            let name = detail_sheet_name("payroll", "Missing", limit);
            assert!(name.chars().count() <= limit, "{name} over {limit}");
        }
        assert_eq!(detail_sheet_name("payroll", "Missing", 9), "p_Missing");
        assert_eq!(detail_sheet_name("payroll", "Missing", 5), "_Miss");
    }

    #[test]
    fn truncation_collision_last_write_wins() {
        let prefix = "quarterly_headcount_reconciliation";
        let a = result(&format!("{prefix}_north.xlsx"), 1, 0, 0);
        let b = result(&format!("{prefix}_south.xlsx"), 2, 0, 0);
        let results = collection(vec![a, b]);

        let out = export_report(&results, &ReportStyle::default()).unwrap();
        assert_eq!(out.sheet_names.len(), 2);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("overwritten"));
    }

    #[test]
    fn formatting_failure_keeps_plain_workbook() {
        let results = collection(vec![result("jan.xlsx", 1, 1, 0)]);
        let style = ReportStyle {
            header_fill: "not-a-color".into(),
            ..ReportStyle::default()
        };
        let out = export_report(&results, &style).unwrap();
        assert!(!out.formatted);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("formatting"));
        assert!(out.bytes.starts_with(b"PK"));
    }

    #[test]
    fn widths_are_capped() {
        let mut long = result(&format!("{}.xlsx", "n".repeat(80)), 1, 0, 0);
        long.match_columns = vec!["ID".into(), "Name".into()];
        let rows = compute_summary(&collection(vec![long]));
        let widths = summary_column_widths(&rows, &ReportStyle::default());
        assert_eq!(widths[0], 50.0);
        assert_eq!(widths[1], ("Match Columns".len() + 2) as f64);
        assert_eq!(widths[7], ("Match Rate %".len() + 2) as f64);
    }
}
