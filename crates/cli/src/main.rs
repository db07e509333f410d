// recordmatch CLI - compare spreadsheet/CSV files against a base file

mod compare;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use serde::Serialize;

use recordmatch_io::{is_supported, FileSource};

use compare::CompareArgs;
use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "recordmatch")]
#[command(about = "Reconcile tabular files against a base file by key columns")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare candidate files against a base file and write an xlsx report
    #[command(after_help = "\
Examples:
  recordmatch compare staff.xlsx jan.xlsx feb.xlsx
  recordmatch compare staff.xlsx jan.csv --match-columns EmployeeID Name
  recordmatch compare staff.xlsx exports/*.xlsx -o report.xlsx --json
  recordmatch compare staff.xlsx jan.xlsx --config recordmatch.toml --strict

Config file (all keys optional):
  [compare]
  match_columns = [\"EmployeeID\"]
  key_encoding = \"pipe\"            # or \"length_prefixed\"

  [report]
  summary_sheet = \"Summary\"
  header_fill = \"366092\"
  header_font_color = \"FFFFFF\"
  header_bold = true
  width_padding = 2
  max_column_width = 50
  sheet_name_limit = 31")]
    Compare(CompareArgs),

    /// List a file's columns and record count
    #[command(after_help = "\
Examples:
  recordmatch columns staff.xlsx
  recordmatch columns jan.csv --json")]
    Columns {
        /// File to inspect (xlsx, xlsm, xlsb, xls, ods, csv, tsv)
        file: PathBuf,

        /// Print as JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compare(args) => compare::cmd_compare(args),
        Commands::Columns { file, json } => cmd_columns(file, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[derive(Serialize)]
struct ColumnsReport {
    file: String,
    records: usize,
    columns: Vec<String>,
}

fn cmd_columns(file: PathBuf, json: bool) -> Result<(), CliError> {
    if !is_supported(&file) {
        return Err(CliError::args(format!("unsupported file type: {}", file.display()))
            .with_hint("expected xlsx, xlsm, xlsb, xls, ods, csv or tsv"));
    }
    let dataset = FileSource::read(&file)
        .map_err(|e| CliError::args(format!("cannot read {}: {e}", file.display())))?;

    if json {
        let report = ColumnsReport {
            file: file.display().to_string(),
            records: dataset.len(),
            columns: dataset.columns().to_vec(),
        };
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::other(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for column in dataset.columns() {
            println!("{column}");
        }
        eprintln!("{} records", dataset.len());
    }
    Ok(())
}
