//! Log file discovery and record loading.
//!
//! Loading is resilient in the way log tooling has to be: one corrupted
//! line must never hide the rest of the file. Malformed lines are skipped
//! and reported as [`LoadWarning`]s for the caller to log.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;

use crate::error::{Error, Result};

/// Warnings that can occur while loading log files.
///
/// These are non-fatal: the offending line is skipped and loading
/// continues with the rest of the file.
#[derive(Debug, Clone)]
pub enum LoadWarning {
    /// A line that is not valid JSON.
    MalformedJson {
        /// The file containing the line.
        file: PathBuf,
        /// 1-based line number within the file.
        line_number: usize,
        /// The parse error text.
        error: String,
    },
    /// A line that parses as JSON but is not an object.
    NotAnObject {
        /// The file containing the line.
        file: PathBuf,
        /// 1-based line number within the file.
        line_number: usize,
    },
}

impl LoadWarning {
    /// A human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            LoadWarning::MalformedJson {
                file,
                line_number,
                error,
            } => format!(
                "skipped malformed JSON at {}:{line_number}: {error}",
                file.display()
            ),
            LoadWarning::NotAnObject { file, line_number } => format!(
                "skipped non-object record at {}:{line_number}",
                file.display()
            ),
        }
    }
}

/// The result of loading a directory of log files.
#[derive(Debug, Default)]
pub struct LoadedLogs {
    /// All successfully parsed records, in file-then-line order.
    pub records: Vec<Value>,
    /// Non-fatal problems encountered along the way.
    pub warnings: Vec<LoadWarning>,
    /// Number of files that were loaded.
    pub file_count: usize,
}

/// Load every `.{extension}` file directly inside `directory`.
///
/// The scan is not recursive and only considers regular files. Files are
/// visited in name order so output is stable across runs. Within a file,
/// blank lines are ignored and each remaining line must hold one JSON
/// object.
pub async fn load_directory(directory: &Path, extension: &str) -> Result<LoadedLogs> {
    let suffix = format!(".{extension}");
    let mut paths = Vec::new();

    let mut entries = fs::read_dir(directory).await.map_err(|source| Error::ReadDir {
        path: directory.to_path_buf(),
        source,
    })?;
    while let Some(entry) = entries.next_entry().await.map_err(|source| Error::ReadDir {
        path: directory.to_path_buf(),
        source,
    })? {
        let path = entry.path();
        let is_file = entry
            .file_type()
            .await
            .map_err(|source| Error::ReadFile {
                path: path.clone(),
                source,
            })?
            .is_file();
        if is_file && path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.ends_with(&suffix))
        {
            paths.push(path);
        }
    }
    paths.sort();

    let mut logs = LoadedLogs::default();
    for path in paths {
        load_file(&path, &mut logs).await?;
        logs.file_count += 1;
    }
    Ok(logs)
}

async fn load_file(path: &Path, logs: &mut LoadedLogs) -> Result<()> {
    let contents = fs::read_to_string(path).await.map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value @ Value::Object(_)) => logs.records.push(value),
            Ok(_) => logs.warnings.push(LoadWarning::NotAnObject {
                file: path.to_path_buf(),
                line_number: index + 1,
            }),
            Err(error) => logs.warnings.push(LoadWarning::MalformedJson {
                file: path.to_path_buf(),
                line_number: index + 1,
                error: error.to_string(),
            }),
        }
    }
    Ok(())
}

/// The columns shared by every record, ordered as in the first record.
///
/// Only top-level keys participate; a key counts when every record has
/// it, whatever its value.
pub fn common_columns(records: &[Value]) -> Vec<String> {
    let Some(first) = records.first().and_then(Value::as_object) else {
        return Vec::new();
    };
    first
        .keys()
        .filter(|key| {
            records
                .iter()
                .all(|record| record.as_object().is_some_and(|o| o.contains_key(key.as_str())))
        })
        .cloned()
        .collect()
}
