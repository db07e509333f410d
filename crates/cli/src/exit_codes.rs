//! CLI Exit Code Registry
//!
//! Single source of truth for `recordmatch` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad args, bad config file)              |
//! | 3    | Base file could not be loaded                        |
//! | 4    | Report could not be written                          |
//! | 5    | No candidate produced a result                       |
//! | 6    | Differences found (only with `--strict`)             |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable or invalid config file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Compare (3-9)
// =============================================================================

/// Base file missing, unreadable, or not tabular.
pub const EXIT_BASE_LOAD: u8 = 3;

/// Report workbook could not be built or written.
pub const EXIT_EXPORT: u8 = 4;

/// Every candidate was skipped; there is nothing to report.
pub const EXIT_NO_RESULTS: u8 = 5;

/// At least one result has missing or extra keys and `--strict` was given.
/// Like `diff(1)`, the report is still written.
pub const EXIT_DIFFERENCES: u8 = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_BASE_LOAD,
            EXIT_EXPORT,
            EXIT_NO_RESULTS,
            EXIT_DIFFERENCES,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
