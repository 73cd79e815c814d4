//! CLI argument parsing and execution.
//!
//! Loupe is a single-command tool: point it at a directory of JSON-line
//! log files, optionally give it a query, and it prints the matching
//! records as a table (or as JSON lines with `--json`).
//!
//! # Example
//!
//! ```bash
//! loupe /var/log/app -q "[time,level,msg]:level='error'|status>='500'"
//! loupe . -e jsonl -q "user.name~'an'" --json
//! ```

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use loupe_query::CompiledQuery;
use serde_json::Value;

use crate::loader;
use crate::output::{self, OutputConfig, OutputMode};

const QUERY_GUIDE: &str = "\
Query syntax:
  [COLUMNS]:CONDITIONS     select columns and filter records
  [COLUMNS]                select columns only
  CONDITIONS               filter records only

Columns:
  [name,age]               show these columns, in this order
  [user[name,role]]        nested fields, shown as user.name and user.role
  [level,...]              level first, then every other column
  []                       no columns at all

Conditions (no spaces around operators):
  age>='18'                compare; numeric when both sides are numbers
  name~'an'                substring; !~ for does-not-contain
  level=/warn|err/         regex literal, =/!= only
  when>=date('2024-03')    dates: YYYY[-MM[-DD]][ hh[:mm[:ss]]]
  tags=array('[a,b,...]')  arrays; ... allows extra elements
  meta=object('{k:v,...}') objects; ... allows extra keys
  a='1'&b='2'|c='3'        & binds tighter than |

Fields that are missing, null, empty, zero, or false match only the
negated operators (!= and !~).";

/// Query JSON-line log files with a compact textual query language.
///
/// Loads every matching log file in the directory, discovers the
/// columns shared by all records, and prints the records matching the
/// query.
#[derive(Parser, Debug)]
#[command(name = "loupe")]
#[command(author, version, about, long_about = None)]
#[command(after_long_help = QUERY_GUIDE)]
pub struct Cli {
    /// Directory to scan for log files (not recursive)
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// File extension of the log files to load
    #[arg(short, long, default_value = "log", value_parser = validate_extension)]
    pub extension: String,

    /// Query to run against the records; omit to show everything
    #[arg(short, long, value_parser = validate_query)]
    pub query: Option<String>,

    /// Output matching records as JSON lines instead of a table
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing).
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Load, filter, and print.
    pub async fn execute(&self) -> Result<()> {
        let query_text = self.query.as_deref().unwrap_or("");
        let query = CompiledQuery::compile(query_text)
            .with_context(|| format!("invalid query `{query_text}`"))?;

        let logs = loader::load_directory(&self.directory, &self.extension)
            .await
            .context("failed to load log files")?;
        for warning in &logs.warnings {
            tracing::warn!("{}", warning.description());
        }
        tracing::debug!(
            files = logs.file_count,
            records = logs.records.len(),
            warnings = logs.warnings.len(),
            "loaded log records"
        );

        let original = loader::common_columns(&logs.records);
        let columns = query.columns(&original);
        let matched: Vec<&Value> = logs
            .records
            .iter()
            .filter(|record| query.matches(record))
            .collect();

        let mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Table
        };
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        match mode {
            OutputMode::Table => {
                let config = OutputConfig::from_env();
                output::print_table(&mut handle, &columns, &matched, &config)?;
            }
            OutputMode::Json => output::print_json_lines(&mut handle, &columns, &matched)?,
        }
        Ok(())
    }
}

/// Validate the log file extension.
///
/// Letters and digits only, matching what log rotation schemes produce.
/// The leading dot is implied and must not be given.
fn validate_extension(s: &str) -> std::result::Result<String, String> {
    if s.is_empty() {
        return Err("Extension cannot be empty".to_string());
    }
    if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!(
            "Invalid extension '{s}': expected letters and digits only (e.g. log, jsonl, txt)"
        ));
    }
    Ok(s.to_string())
}

/// Reject explicitly empty queries. Whether the query parses is checked
/// later, where the compile error can be reported in full.
fn validate_query(s: &str) -> std::result::Result<String, String> {
    if s.trim().is_empty() {
        return Err("Query cannot be empty".to_string());
    }
    Ok(s.to_string())
}
