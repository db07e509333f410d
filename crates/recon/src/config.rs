use serde::Deserialize;

use crate::error::ReconError;
use crate::keys::KeyEncoding;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub compare: CompareConfig,
    #[serde(default)]
    pub report: ReportStyle,
}

// ---------------------------------------------------------------------------
// Compare
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompareConfig {
    /// Columns to match on. Absent or empty means every common column.
    #[serde(default)]
    pub match_columns: Option<Vec<String>>,
    #[serde(default)]
    pub key_encoding: KeyEncoding,
}

// ---------------------------------------------------------------------------
// Report style
// ---------------------------------------------------------------------------

/// Styling and naming knobs for the exported workbook.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportStyle {
    pub summary_sheet: String,
    /// Summary header background, `RRGGBB`.
    pub header_fill: String,
    /// Summary header font color, `RRGGBB`.
    pub header_font_color: String,
    pub header_bold: bool,
    /// Added to the longest cell text when sizing Summary columns.
    pub width_padding: usize,
    pub max_column_width: usize,
    /// Excel refuses sheet names longer than 31 chars.
    pub sheet_name_limit: usize,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            summary_sheet: "Summary".into(),
            header_fill: "366092".into(),
            header_font_color: "FFFFFF".into(),
            header_bold: true,
            width_padding: 2,
            max_column_width: 50,
            sheet_name_limit: 31,
        }
    }
}

/// Characters Excel does not allow in sheet names.
pub const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Shortest limit that leaves room for `<stem>_Matched` with a one-char stem.
pub const MIN_SHEET_NAME_LIMIT: usize = 9;

/// Parse `RRGGBB` (optionally `#RRGGBB`) into a packed RGB value.
pub fn parse_hex_color(s: &str) -> Result<u32, String> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("invalid color '{s}' (expected RRGGBB)"));
    }
    u32::from_str_radix(hex, 16).map_err(|e| format!("invalid color '{s}': {e}"))
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let report = &self.report;

        parse_hex_color(&report.header_fill)
            .map_err(|e| ReconError::ConfigValidation(format!("report.header_fill: {e}")))?;
        parse_hex_color(&report.header_font_color)
            .map_err(|e| ReconError::ConfigValidation(format!("report.header_font_color: {e}")))?;

        if !(MIN_SHEET_NAME_LIMIT..=31).contains(&report.sheet_name_limit) {
            return Err(ReconError::ConfigValidation(format!(
                "report.sheet_name_limit must be between {MIN_SHEET_NAME_LIMIT} and 31, got {}",
                report.sheet_name_limit
            )));
        }

        if report.max_column_width == 0 {
            return Err(ReconError::ConfigValidation(
                "report.max_column_width must be positive".into(),
            ));
        }

        let summary_len = report.summary_sheet.chars().count();
        if summary_len == 0 || summary_len > 31 {
            return Err(ReconError::ConfigValidation(format!(
                "report.summary_sheet must be 1-31 characters, got {summary_len}"
            )));
        }
        let summary = &report.summary_sheet;
        if let Some(c) = summary.chars().find(|c| INVALID_SHEET_CHARS.contains(c)) {
            return Err(ReconError::ConfigValidation(format!(
                "report.summary_sheet '{summary}' contains '{c}', which Excel does not allow"
            )));
        }
        if summary.starts_with('\'') || summary.ends_with('\'') {
            return Err(ReconError::ConfigValidation(format!(
                "report.summary_sheet '{summary}' must not start or end with an apostrophe"
            )));
        }

        if let Some(cols) = &self.compare.match_columns {
            if cols.iter().any(|c| c.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(
                    "compare.match_columns must not contain blank names".into(),
                ));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
