//! `recordmatch-recon` - base-vs-candidate record reconciliation engine.
//!
//! Pure engine crate: datasets come in through [`DatasetSource`], results
//! go out as [`ComparisonResults`]. No file formats live here.

pub mod config;
pub mod engine;
pub mod error;
pub mod keys;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod summary;

pub use config::{ReportStyle, RunConfig};
pub use engine::{Comparator, ComparatorState, DatasetSource};
pub use error::{CandidateFailure, ReconError};
pub use keys::KeyEncoding;
pub use model::{BatchReport, CellValue, ComparisonResult, ComparisonResults, Dataset, MatchKey, SummaryRow};
