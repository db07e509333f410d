use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// Base or candidate file could not be read as tabular data.
    #[error("cannot load '{path}': {reason}")]
    Load { path: String, reason: String },
    /// `compare_files` called before a successful `load_base`.
    #[error("base file has not been loaded")]
    BaseNotLoaded,
    /// Base and candidate share no column names.
    #[error("no common columns with base file")]
    NoCommonColumns,
    /// None of the requested match columns are common to both files.
    #[error("none of the specified match columns found: {}", .requested.join(", "))]
    NoMatchColumns { requested: Vec<String> },
    /// A match column is absent from a dataset.
    #[error("missing column '{column}'")]
    MissingColumn { column: String },
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad color, out-of-range limit, ...).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
}

/// A candidate that was skipped during a batch. The batch keeps going.
#[derive(Debug)]
pub struct CandidateFailure {
    pub name: String,
    pub path: PathBuf,
    pub error: ReconError,
}

impl fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.error)
    }
}
