// CSV/TSV import

use std::io::Read;
use std::path::Path;

use recordmatch_recon::{CellValue, Dataset};

pub fn import(path: &Path) -> Result<Dataset, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<Dataset, String> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, b'\t')
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (number of lines with same field count as line 1) * field_count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(match s.strip_prefix('\u{feff}') {
            Some(rest) => rest.to_string(),
            None => s,
        }),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// A finite number. `parse::<f64>` alone also takes `nan`, `inf` and `infinity`.
fn parse_number(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// First record is the header. A column whose non-empty fields all parse as
/// numbers is read as numbers; any other column is read as text.
fn import_from_string(content: &str, delimiter: u8) -> Result<Dataset, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(|e| e.to_string())?,
        None => return Err("CSV file is empty".to_string()),
    };
    let mut dataset = Dataset::with_raw_headers(header.iter().map(str::to_string).collect());
    let width = dataset.columns().len();

    let mut fields: Vec<Vec<String>> = Vec::new();
    for result in records {
        let record = result.map_err(|e| e.to_string())?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        fields.push(record.iter().take(width).map(str::to_string).collect());
    }

    let numeric: Vec<bool> = (0..width)
        .map(|col| {
            fields
                .iter()
                .filter_map(|r| r.get(col))
                .filter(|f| !f.is_empty())
                .all(|f| parse_number(f).is_some())
        })
        .collect();

    for row in fields {
        let cells = row
            .into_iter()
            .enumerate()
            .map(|(col, f)| {
                if f.is_empty() {
                    CellValue::Empty
                } else if numeric[col] {
                    match parse_number(&f) {
                        Some(n) => CellValue::Number(n),
                        None => CellValue::Text(f),
                    }
                } else {
                    CellValue::Text(f)
                }
            })
            .collect();
        dataset.push_row(cells);
    }

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Name;Age;City\nAlice;30;Paris\nBob;25;London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "Name,Age,City\nAlice,30,Paris\nBob,25,London\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "Name\tAge\tCity\nAlice\t30\tParis\nBob\t25\tLondon\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "Name;Address;City\n\"Doe, Jane\";\"123 Main St, Apt 4\";Paris\nBob;\"456 Elm\";London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_semicolon_csv_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.csv");
        fs::write(&path, "Name;Age;City\nAlice;30;Paris\nBob;25;London\n").unwrap();

        let ds = import(&path).unwrap();
        assert_eq!(ds.columns(), &["Name", "Age", "City"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.cell(0, "Name"), Some(&CellValue::from("Alice")));
        assert_eq!(ds.cell(1, "Age"), Some(&CellValue::Number(25.0)));
    }

    #[test]
    fn test_mixed_column_stays_text() {
        let ds = import_from_string("ID,Code\n1,10\n2,A7\n3,\n", b',').unwrap();
        assert_eq!(ds.cell(0, "ID"), Some(&CellValue::Number(1.0)));
        assert_eq!(ds.cell(0, "Code"), Some(&CellValue::from("10")));
        assert_eq!(ds.cell(2, "Code"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_nan_and_inf_words_stay_text() {
        let ds = import_from_string("ID,Name\nA,Nan\nB,Inf\nC,infinity\n", b',').unwrap();
        assert_eq!(ds.cell(0, "Name"), Some(&CellValue::from("Nan")));
        assert_eq!(ds.cell(1, "Name"), Some(&CellValue::from("Inf")));
        assert_eq!(ds.cell(2, "Name"), Some(&CellValue::from("infinity")));

        // one non-finite word turns the whole column to text
        let ds = import_from_string("Score\n1.5\nNaN\n", b',').unwrap();
        assert_eq!(ds.cell(0, "Score"), Some(&CellValue::from("1.5")));
        assert_eq!(ds.cell(1, "Score"), Some(&CellValue::from("NaN")));
    }

    #[test]
    fn test_blank_rows_skipped_and_short_rows_padded() {
        let ds = import_from_string("A,B\n1,2\n,\n3\n", b',').unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows()[1], vec![CellValue::Number(3.0), CellValue::Empty]);
    }

    #[test]
    fn test_empty_file_is_an_error() {
        assert!(import_from_string("", b',').is_err());
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "José" with é as 0xE9
        fs::write(&path, b"Name\nJos\xe9\n").unwrap();
        let ds = import(&path).unwrap();
        assert_eq!(ds.cell(0, "Name"), Some(&CellValue::from("José")));
    }

    #[test]
    fn test_tsv_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.tsv");
        fs::write(&path, "Name\tValue\nAlice\t42\n").unwrap();
        let ds = import_tsv(&path).unwrap();
        assert_eq!(ds.cell(0, "Value"), Some(&CellValue::Number(42.0)));
    }
}
