// Dataset loading by file extension

use std::path::Path;

use recordmatch_recon::{Dataset, DatasetSource};

/// Extensions read through calamine
const EXCEL_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Extensions read through the CSV importer
const DELIMITED_EXTENSIONS: [&str; 2] = ["csv", "tsv"];

fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// True for file types `FileSource` can read.
pub fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|ext| {
        EXCEL_EXTENSIONS.contains(&ext.as_str()) || DELIMITED_EXTENSIONS.contains(&ext.as_str())
    })
}

/// Reads spreadsheets and delimited text files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl FileSource {
    pub fn read(path: &Path) -> Result<Dataset, String> {
        match extension(path).as_deref() {
            Some("csv") => crate::csv::import(path),
            Some("tsv") => crate::csv::import_tsv(path),
            Some(ext) if EXCEL_EXTENSIONS.contains(&ext) => crate::xlsx::import(path),
            Some(ext) => Err(format!("unsupported file type '.{ext}'")),
            None => Err("file has no extension".to_string()),
        }
    }
}

impl DatasetSource for FileSource {
    fn load(&self, path: &Path) -> Result<Dataset, String> {
        Self::read(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordmatch_recon::CellValue;
    use tempfile::tempdir;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported(Path::new("staff.xlsx")));
        assert!(is_supported(Path::new("STAFF.XLS")));
        assert!(is_supported(Path::new("dir/staff.csv")));
        assert!(!is_supported(Path::new("staff.pdf")));
        assert!(!is_supported(Path::new("staff")));
    }

    #[test]
    fn test_dispatch_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("people.CSV");
        std::fs::write(&path, "ID,Name\n1,Ann\n").unwrap();
        let ds = FileSource.load(&path).unwrap();
        assert_eq!(ds.cell(0, "ID"), Some(&CellValue::Number(1.0)));
    }

    #[test]
    fn test_unsupported_and_missing() {
        let err = FileSource.load(Path::new("notes.txt")).unwrap_err();
        assert!(err.contains("unsupported"));
        assert!(FileSource.load(Path::new("/nonexistent/dir/a.csv")).is_err());
    }
}
