use std::path::{Path, PathBuf};

use crate::error::{CandidateFailure, ReconError};
use crate::keys::KeyEncoding;
use crate::matcher::{reconcile, resolve_match_columns};
use crate::model::{BatchReport, ComparisonResult, ComparisonResults, Dataset};
use crate::normalize::normalize;
use crate::summary::render_detailed_summary;

/// Anything that can turn a file locator into a dataset.
pub trait DatasetSource {
    fn load(&self, path: &Path) -> Result<Dataset, String>;
}

impl<S: DatasetSource + ?Sized> DatasetSource for &S {
    fn load(&self, path: &Path) -> Result<Dataset, String> {
        (**self).load(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparatorState {
    /// Constructed; base file not read yet.
    Unloaded,
    /// Base read and normalized.
    Loaded,
    /// At least one `compare_files` batch has run.
    Compared,
}

/// Compares one base file against any number of candidate files.
pub struct Comparator<S> {
    base_path: PathBuf,
    source: S,
    key_encoding: KeyEncoding,
    base: Option<Dataset>,
    results: ComparisonResults,
    state: ComparatorState,
}

impl<S: DatasetSource> Comparator<S> {
    pub fn new(base_path: impl Into<PathBuf>, source: S) -> Self {
        Self {
            base_path: base_path.into(),
            source,
            key_encoding: KeyEncoding::default(),
            base: None,
            results: ComparisonResults::new(),
            state: ComparatorState::Unloaded,
        }
    }

    pub fn with_key_encoding(mut self, encoding: KeyEncoding) -> Self {
        self.key_encoding = encoding;
        self
    }

    pub fn state(&self) -> ComparatorState {
        self.state
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// The normalized base, once loaded.
    pub fn base(&self) -> Option<&Dataset> {
        self.base.as_ref()
    }

    pub fn results(&self) -> &ComparisonResults {
        &self.results
    }

    pub fn into_results(self) -> ComparisonResults {
        self.results
    }

    /// Per-file breakdown of everything compared so far.
    pub fn detailed_summary(&self) -> String {
        render_detailed_summary(&self.results)
    }

    /// Read and normalize the base file. Leaves the comparator unloaded on failure.
    pub fn load_base(&mut self) -> Result<&Dataset, ReconError> {
        let raw = self.source.load(&self.base_path).map_err(|reason| {
            log::error!("cannot load base file {}: {reason}", self.base_path.display());
            ReconError::Load {
                path: self.base_path.display().to_string(),
                reason,
            }
        })?;

        log::info!(
            "base file loaded: {} records, columns {:?}",
            raw.len(),
            raw.columns()
        );

        let base = self.base.insert(normalize(&raw));
        if self.state == ComparatorState::Unloaded {
            self.state = ComparatorState::Loaded;
        }
        Ok(base)
    }

    /// Compare every candidate against the base, in order.
    ///
    /// A candidate that cannot be read or has no usable match columns is
    /// recorded in the returned report and skipped; the rest still run.
    /// Results are keyed by file name, so a later file with the same name
    /// replaces the earlier result.
    pub fn compare_files<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        match_columns: Option<&[String]>,
    ) -> Result<BatchReport, ReconError> {
        let base = self.base.as_ref().ok_or(ReconError::BaseNotLoaded)?;
        let mut report = BatchReport::default();

        for path in paths {
            let path = path.as_ref();
            let name = display_name(path);
            log::info!("processing {}", path.display());

            match compare_one(&self.source, base, path, &name, match_columns, self.key_encoding) {
                Ok(result) => {
                    log::info!(
                        "{name}: {} base, {} candidate, {} matched, {} missing, {} extra",
                        result.total_base_records,
                        result.total_comp_records,
                        result.matched_count(),
                        result.missing_count(),
                        result.extra_count(),
                    );
                    if self.results.insert(name.clone(), result).is_some() {
                        log::warn!("{name}: replaces an earlier result with the same file name");
                        report.overwritten.push(name.clone());
                    }
                    report.compared.push(name);
                }
                Err(error) => {
                    log::warn!("skipping {}: {error}", path.display());
                    report.failures.push(CandidateFailure {
                        name,
                        path: path.to_path_buf(),
                        error,
                    });
                }
            }
        }

        self.state = ComparatorState::Compared;
        Ok(report)
    }
}

fn compare_one<S: DatasetSource>(
    source: &S,
    base: &Dataset,
    path: &Path,
    name: &str,
    match_columns: Option<&[String]>,
    encoding: KeyEncoding,
) -> Result<ComparisonResult, ReconError> {
    let raw = source.load(path).map_err(|reason| ReconError::Load {
        path: path.display().to_string(),
        reason,
    })?;
    let candidate = normalize(&raw);

    let cols = resolve_match_columns(base, &candidate, match_columns)?;
    log::debug!("{name}: matching on {cols:?}");

    let outcome = reconcile(base, &candidate, &cols, encoding)?;

    Ok(ComparisonResult {
        file_name: name.to_string(),
        match_columns: cols,
        total_base_records: base.len(),
        total_comp_records: candidate.len(),
        outcome,
    })
}

/// File name without directories; falls back to the whole path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
