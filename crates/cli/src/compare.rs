//! `recordmatch compare` - reconcile candidate files against a base file.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use serde::Serialize;

use recordmatch_io::{export_report_to_path, ExportError, FileSource};
use recordmatch_recon::summary::compute_summary;
use recordmatch_recon::{Comparator, KeyEncoding, ReconError, RunConfig, SummaryRow};

use crate::exit_codes::{
    EXIT_BASE_LOAD, EXIT_DIFFERENCES, EXIT_ERROR, EXIT_EXPORT, EXIT_NO_RESULTS, EXIT_USAGE,
};
use crate::CliError;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum KeyEncodingArg {
    /// Join column values with `|` (default)
    Pipe,
    /// Prefix each value with its length, e.g. `3:abc|1:d`
    LengthPrefixed,
}

impl From<KeyEncodingArg> for KeyEncoding {
    fn from(arg: KeyEncodingArg) -> Self {
        match arg {
            KeyEncodingArg::Pipe => KeyEncoding::Pipe,
            KeyEncodingArg::LengthPrefixed => KeyEncoding::LengthPrefixed,
        }
    }
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Base (reference) file
    pub base: PathBuf,

    /// Files to compare against the base
    #[arg(required = true)]
    pub candidates: Vec<PathBuf>,

    /// Columns to match on, one argument each (default: every column both files share)
    #[arg(long, short = 'm', num_args = 1..)]
    pub match_columns: Vec<String>,

    /// Report workbook to write
    #[arg(long, short = 'o', default_value = "comparison_results.xlsx")]
    pub output: PathBuf,

    /// TOML config file ([compare] and [report] sections)
    #[arg(long, env = "RECORDMATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// How multi-column keys are joined
    #[arg(long, value_enum)]
    pub key_encoding: Option<KeyEncodingArg>,

    /// Print summary rows as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Exit 6 when any file has missing or extra records
    #[arg(long)]
    pub strict: bool,
}

#[derive(Serialize)]
struct JsonSkipped {
    file: String,
    path: String,
    error: String,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    base: String,
    output: String,
    formatted: bool,
    results: &'a [SummaryRow],
    skipped: Vec<JsonSkipped>,
    warnings: &'a [String],
}

fn compare_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn load_config(path: Option<&Path>) -> Result<RunConfig, CliError> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| {
        compare_err(EXIT_USAGE, format!("cannot read config {}: {e}", path.display()))
    })?;
    RunConfig::from_toml(&text).map_err(|e| {
        compare_err(exit_code_for(&e), format!("{}: {e}", path.display()))
            .with_hint("see `recordmatch compare --help` for the config layout")
    })
}

/// Flags win over the config file; an empty flag list means "not given".
fn effective_match_columns(args: &CompareArgs, config: &RunConfig) -> Option<Vec<String>> {
    if !args.match_columns.is_empty() {
        return Some(args.match_columns.clone());
    }
    config.compare.match_columns.clone().filter(|cols| !cols.is_empty())
}

pub fn cmd_compare(args: CompareArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let match_columns = effective_match_columns(&args, &config);
    let encoding = args
        .key_encoding
        .map(KeyEncoding::from)
        .unwrap_or(config.compare.key_encoding);

    let mut comparator = Comparator::new(&args.base, FileSource).with_key_encoding(encoding);
    let base = comparator.load_base().map_err(|e| {
        let err = compare_err(exit_code_for(&e), e.to_string());
        if args.base.exists() {
            err
        } else {
            err.with_hint("check the base file path")
        }
    })?;
    eprintln!(
        "base: {} ({} records, columns: {})",
        args.base.display(),
        base.len(),
        base.columns().join(", ")
    );

    let batch = comparator
        .compare_files(args.candidates.as_slice(), match_columns.as_deref())
        .map_err(|e| compare_err(EXIT_ERROR, e.to_string()))?;

    for failure in &batch.failures {
        eprintln!("skipped {}", failure);
    }
    for name in &batch.overwritten {
        eprintln!("warning: {name} appeared more than once; keeping the last result");
    }

    let results = comparator.results();
    if results.is_empty() {
        return Err(compare_err(EXIT_NO_RESULTS, "no comparison results generated"));
    }

    let output = export_report_to_path(results, &config.report, &args.output).map_err(|e| {
        let code = match e {
            ExportError::NoResults => EXIT_NO_RESULTS,
            _ => EXIT_EXPORT,
        };
        compare_err(code, e.to_string())
    })?;
    for warning in &output.warnings {
        eprintln!("warning: {warning}");
    }

    eprint!("{}", comparator.detailed_summary());
    eprintln!("wrote {}", args.output.display());

    let rows = compute_summary(results);
    if args.json {
        let report = JsonReport {
            base: args.base.display().to_string(),
            output: args.output.display().to_string(),
            formatted: output.formatted,
            results: &rows,
            skipped: batch
                .failures
                .iter()
                .map(|f| JsonSkipped {
                    file: f.name.clone(),
                    path: f.path.display().to_string(),
                    error: f.error.to_string(),
                })
                .collect(),
            warnings: &output.warnings,
        };
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| compare_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    if args.strict {
        let differing = results.values().filter(|r| r.has_differences()).count();
        if differing > 0 {
            return Err(compare_err(
                EXIT_DIFFERENCES,
                format!("differences found in {differing} file(s)"),
            ));
        }
    }

    Ok(())
}

/// Exit code for a library error that stops the whole run.
pub fn exit_code_for(err: &ReconError) -> u8 {
    match err {
        ReconError::Load { .. } | ReconError::BaseNotLoaded => EXIT_BASE_LOAD,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_USAGE,
        _ => EXIT_ERROR,
    }
}
