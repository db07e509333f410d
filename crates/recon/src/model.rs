use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::error::CandidateFailure;

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// A single cell as read from a spreadsheet or CSV file.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Self::Empty => Ok(()),
        }
    }
}

/// Integers without decimals, everything else in shortest form.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Header row plus data rows. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Build from raw header cells, renaming blanks and repeats the way
    /// spreadsheet readers do (`Unnamed: 3`, `Name.1`).
    pub fn with_raw_headers(raw: Vec<String>) -> Self {
        Self::new(dedupe_headers(raw))
    }

    pub fn from_rows<S: AsRef<str>>(columns: &[S], rows: Vec<Vec<CellValue>>) -> Self {
        let mut dataset = Self::new(columns.iter().map(|c| c.as_ref().to_string()).collect());
        for row in rows {
            dataset.push_row(row);
        }
        dataset
    }

    /// Append a row, padding with `Empty` or dropping overflow cells.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<CellValue>] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// True when at least one cell in the column holds text.
    pub fn is_text_column(&self, col: usize) -> bool {
        self.rows.iter().any(|r| r[col].is_text())
    }

    /// Same columns, only the rows whose index passes `keep`, order preserved.
    pub fn filter_rows(&self, mut keep: impl FnMut(usize) -> bool) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .enumerate()
                .filter(|(i, _)| keep(*i))
                .map(|(_, r)| r.clone())
                .collect(),
        }
    }
}

fn dedupe_headers(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for (i, header) in raw.into_iter().enumerate() {
        let header = header.trim_end_matches(['\r', '\n']).to_string();
        let base = if header.is_empty() {
            format!("Unnamed: {i}")
        } else {
            header
        };
        let mut name = base.clone();
        let mut n = 1;
        while out.contains(&name) {
            name = format!("{base}.{n}");
            n += 1;
        }
        out.push(name);
    }
    out
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Per-row matching key. A single match column keeps the cell's own type;
/// several columns produce a joined `Text` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchKey {
    Number(OrderedFloat<f64>),
    Bool(bool),
    Text(String),
}

impl MatchKey {
    /// `None` for empty cells, which never take part in matching.
    pub fn from_cell(cell: &CellValue) -> Option<Self> {
        match cell {
            CellValue::Text(s) => Some(Self::Text(s.clone())),
            CellValue::Number(n) => Some(Self::Number(OrderedFloat(*n))),
            CellValue::Bool(b) => Some(Self::Bool(*b)),
            CellValue::Empty => None,
        }
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&format_number(n.0)),
            Self::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Three-way partition of distinct keys plus the rows behind each part.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub matched: BTreeSet<MatchKey>,
    pub missing: BTreeSet<MatchKey>,
    pub extra: BTreeSet<MatchKey>,
    /// Base rows whose key appears in the candidate.
    pub matched_base: Dataset,
    /// Candidate rows whose key appears in the base.
    pub matched_comp: Dataset,
    /// Base rows whose key is absent from the candidate.
    pub missing_records: Dataset,
    /// Candidate rows whose key is absent from the base.
    pub extra_records: Dataset,
}

/// Outcome of comparing the base against one candidate file.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub file_name: String,
    pub match_columns: Vec<String>,
    pub total_base_records: usize,
    pub total_comp_records: usize,
    pub outcome: Reconciliation,
}

impl ComparisonResult {
    pub fn matched_count(&self) -> usize {
        self.outcome.matched.len()
    }

    pub fn missing_count(&self) -> usize {
        self.outcome.missing.len()
    }

    pub fn extra_count(&self) -> usize {
        self.outcome.extra.len()
    }

    /// Distinct matched keys over base row count, as a percentage rounded to
    /// two decimals. Zero when the base is empty.
    pub fn match_rate(&self) -> f64 {
        if self.total_base_records == 0 {
            return 0.0;
        }
        let pct = self.matched_count() as f64 / self.total_base_records as f64 * 100.0;
        round_percent(pct)
    }

    pub fn has_differences(&self) -> bool {
        self.missing_count() > 0 || self.extra_count() > 0
    }
}

/// Round a percentage in `[0, 100]` to two decimals. The decision is made on
/// the exact binary value of `pct`, and exact ties go to the even hundredth,
/// so `3.125` becomes `3.12` and `9.375` becomes `9.38`.
fn round_percent(pct: f64) -> f64 {
    // Far below the first midpoint (0.005); keeps the shift below in range.
    if !pct.is_finite() || pct < 0.001 {
        return 0.0;
    }

    let bits = pct.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32 - 1075;
    let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);
    if exponent >= 0 {
        return pct;
    }

    // pct * 100 = mantissa * 100 / 2^-exponent, exactly
    let num = mantissa as u128 * 100;
    let den = 1u128 << (-exponent) as u32;
    let (mut hundredths, rem) = (num / den, num % den);
    let twice_rem = rem * 2;
    if twice_rem > den || (twice_rem == den && hundredths % 2 == 1) {
        hundredths += 1;
    }
    hundredths as f64 / 100.0
}

/// Results keyed by candidate display name, in first-insertion order.
pub type ComparisonResults = IndexMap<String, ComparisonResult>;

/// What one `compare_files` call did.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Display names that produced a result, in processing order.
    pub compared: Vec<String>,
    /// Display names that replaced an earlier result with the same name.
    pub overwritten: Vec<String>,
    pub failures: Vec<CandidateFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One line of the summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub file_name: String,
    pub match_columns: String,
    pub base_records: usize,
    pub comparison_records: usize,
    pub matched: usize,
    pub missing: usize,
    pub extra: usize,
    pub match_rate: f64,
}
