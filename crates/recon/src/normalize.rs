use crate::model::{CellValue, Dataset};

/// Trim and upper-case every value in text columns, returning a new dataset.
///
/// A column counts as text when any of its cells is text; its numbers and
/// booleans are converted to their display strings first so the whole column
/// compares as text. Empty cells stay empty. Columns without text pass through.
pub fn normalize(dataset: &Dataset) -> Dataset {
    let mut out = dataset.clone();
    let text_columns: Vec<usize> = (0..dataset.columns().len())
        .filter(|&col| dataset.is_text_column(col))
        .collect();

    for row in out.rows_mut() {
        for &col in &text_columns {
            row[col] = normalize_cell(&row[col]);
        }
    }
    out
}

fn normalize_cell(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Empty => CellValue::Empty,
        other => CellValue::Text(other.to_string().trim().to_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_rows(
            &["ID", "Name", "Active"],
            vec![
                vec![1i64.into(), "  alice ".into(), true.into()],
                vec![2i64.into(), "Bob".into(), CellValue::Empty],
                vec![3i64.into(), CellValue::Empty, false.into()],
            ],
        )
    }

    #[test]
    fn text_columns_trimmed_and_uppercased() {
        let out = normalize(&sample());
        assert_eq!(out.cell(0, "Name"), Some(&CellValue::from("ALICE")));
        assert_eq!(out.cell(1, "Name"), Some(&CellValue::from("BOB")));
        assert_eq!(out.cell(2, "Name"), Some(&CellValue::Empty));
    }

    #[test]
    fn non_text_columns_untouched() {
        let out = normalize(&sample());
        assert_eq!(out.cell(0, "ID"), Some(&CellValue::Number(1.0)));
        assert_eq!(out.cell(0, "Active"), Some(&CellValue::Bool(true)));
    }

    #[test]
    fn mixed_column_becomes_text() {
        let ds = Dataset::from_rows(&["Code"], vec![vec![7i64.into()], vec![" x7 ".into()]]);
        let out = normalize(&ds);
        assert_eq!(out.rows()[0][0], CellValue::from("7"));
        assert_eq!(out.rows()[1][0], CellValue::from("X7"));
    }

    #[test]
    fn input_is_not_mutated() {
        let ds = sample();
        let before = ds.clone();
        let _ = normalize(&ds);
        assert_eq!(ds, before);
    }

    #[test]
    fn shape_is_preserved() {
        let ds = sample();
        let out = normalize(&ds);
        assert_eq!(out.len(), ds.len());
        assert_eq!(out.columns(), ds.columns());
    }

    #[test]
    fn empty_dataset_is_valid() {
        let no_rows = Dataset::from_rows(&["A", "B"], vec![]);
        assert_eq!(normalize(&no_rows), no_rows);
        let nothing = Dataset::default();
        assert_eq!(normalize(&nothing), nothing);
    }

    #[test]
    fn idempotent() {
        let once = normalize(&sample());
        assert_eq!(normalize(&once), once);
    }
}
