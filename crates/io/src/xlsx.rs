// Excel file import (xlsx, xlsm, xlsb, xls, ods)
//
// Reads the first worksheet into a Dataset: the first row of the used range
// is the header, every following non-blank row is a record.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use recordmatch_recon::{CellValue, Dataset};

/// Maximum number of data rows to import (prevents DoS from huge files)
const MAX_ROWS: usize = 1_048_576;

/// Import the first worksheet of an Excel file.
pub fn import(path: &Path) -> Result<Dataset, String> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .ok_or_else(|| "Excel file contains no sheets".to_string())?;

    import_sheet(&mut workbook, first)
}

/// Import a named worksheet.
pub fn import_sheet<R>(workbook: &mut Sheets<R>, sheet_name: &str) -> Result<Dataset, String>
where
    R: std::io::Read + std::io::Seek,
{
    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(cells) => cells.iter().map(header_text).collect(),
        // Empty sheet: no columns, no rows
        None => return Ok(Dataset::default()),
    };
    let mut dataset = Dataset::with_raw_headers(header);

    for cells in rows.take(MAX_ROWS) {
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        dataset.push_row(cells.iter().map(cell_value).collect());
    }

    Ok(dataset)
}

fn header_text(cell: &Data) -> String {
    match cell_value(cell) {
        CellValue::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        // Dates stay as Excel serials so equal dates compare equal
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
    }
}
