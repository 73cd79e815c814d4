//! Integration tests for the loupe CLI.
//!
//! These tests verify directory loading, column discovery, and the
//! end-to-end load-filter-print pipeline against real files on disk.
//!
//! # Test Categories
//!
//! ## Directory Loading Tests
//! - Records collected from every matching file, in file-name order
//! - Malformed and non-object lines skipped with warnings
//! - Extension filter and non-recursive scanning
//! - Missing directory reported as an error
//!
//! ## Common Columns Tests
//! - Intersection of record keys in first-record order
//!
//! ## Query Pipeline Tests
//! - Compile, filter, and render against loaded records
//! - Match counts for representative queries
//!
//! ## Output Tests
//! - Table and JSON-line rendering of filtered records

use std::path::Path;

use loupe::error::Error;
use loupe::loader::{self, LoadWarning};
use loupe::output::{self, OutputConfig};
use loupe_query::CompiledQuery;
use rstest::rstest;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Test Fixtures
// =============================================================================

fn write_file(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("Failed to write fixture file");
}

/// A directory with two log files (one containing broken lines), a file
/// with a different extension, and a subdirectory that must be ignored.
fn sample_log_dir() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");

    write_file(
        temp.path(),
        "app.log",
        concat!(
            "{\"time\":\"2024-03-05 10:00:00\",\"level\":\"info\",\"msg\":\"service started\",\"status\":200}\n",
            "{\"time\":\"2024-03-05 10:00:01\",\"level\":\"error\",\"msg\":\"upstream timeout\",\"status\":504}\n",
            "not json at all\n",
            "\n",
            "[1,2,3]\n",
            "{\"time\":\"2024-03-05 10:00:02\",\"level\":\"info\",\"msg\":\"request served\",\"status\":200}\n",
        ),
    );
    write_file(
        temp.path(),
        "worker.log",
        "{\"time\":\"2024-03-05 10:01:00\",\"level\":\"warn\",\"msg\":\"queue backlog\",\"status\":0,\"worker\":\"w1\"}\n",
    );
    write_file(temp.path(), "notes.txt", "{\"note\":\"remember\"}\n");

    let archive = temp.path().join("archive");
    std::fs::create_dir(&archive).expect("Failed to create subdirectory");
    write_file(
        &archive,
        "old.log",
        "{\"time\":\"2023-01-01 00:00:00\",\"level\":\"info\",\"msg\":\"archived\"}\n",
    );

    temp
}

/// The records that loading `sample_log_dir` with extension `log` yields.
fn sample_records() -> Vec<Value> {
    vec![
        json!({"time": "2024-03-05 10:00:00", "level": "info", "msg": "service started", "status": 200}),
        json!({"time": "2024-03-05 10:00:01", "level": "error", "msg": "upstream timeout", "status": 504}),
        json!({"time": "2024-03-05 10:00:02", "level": "info", "msg": "request served", "status": 200}),
        json!({"time": "2024-03-05 10:01:00", "level": "warn", "msg": "queue backlog", "status": 0, "worker": "w1"}),
    ]
}

// =============================================================================
// Directory Loading Tests
// =============================================================================

mod loading_tests {
    use super::*;

    #[tokio::test]
    async fn loads_records_from_all_log_files() {
        let dir = sample_log_dir();
        let logs = loader::load_directory(dir.path(), "log")
            .await
            .expect("loading should succeed");

        assert_eq!(logs.file_count, 2);
        assert_eq!(logs.records.len(), 4);
    }

    #[tokio::test]
    async fn records_come_in_file_name_then_line_order() {
        let dir = sample_log_dir();
        let logs = loader::load_directory(dir.path(), "log")
            .await
            .expect("loading should succeed");

        // app.log sorts before worker.log
        assert_eq!(logs.records[0]["msg"], "service started");
        assert_eq!(logs.records[1]["msg"], "upstream timeout");
        assert_eq!(logs.records[2]["msg"], "request served");
        assert_eq!(logs.records[3]["msg"], "queue backlog");
    }

    #[tokio::test]
    async fn broken_lines_become_warnings_with_line_numbers() {
        let dir = sample_log_dir();
        let logs = loader::load_directory(dir.path(), "log")
            .await
            .expect("loading should succeed");

        assert_eq!(logs.warnings.len(), 2);
        match &logs.warnings[0] {
            LoadWarning::MalformedJson {
                file, line_number, ..
            } => {
                assert!(file.ends_with("app.log"));
                assert_eq!(*line_number, 3);
            }
            other => panic!("Expected MalformedJson warning, got {other:?}"),
        }
        match &logs.warnings[1] {
            LoadWarning::NotAnObject { file, line_number } => {
                assert!(file.ends_with("app.log"));
                assert_eq!(*line_number, 5);
            }
            other => panic!("Expected NotAnObject warning, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn warning_descriptions_are_human_readable() {
        let dir = sample_log_dir();
        let logs = loader::load_directory(dir.path(), "log")
            .await
            .expect("loading should succeed");

        let descriptions: Vec<String> = logs
            .warnings
            .iter()
            .map(LoadWarning::description)
            .collect();
        assert!(descriptions[0].contains("app.log"));
        assert!(descriptions[0].contains(":3"));
        assert!(descriptions[1].contains("non-object"));
    }

    #[tokio::test]
    async fn extension_filter_selects_other_files() {
        let dir = sample_log_dir();
        let logs = loader::load_directory(dir.path(), "txt")
            .await
            .expect("loading should succeed");

        assert_eq!(logs.file_count, 1);
        assert_eq!(logs.records.len(), 1);
        assert_eq!(logs.records[0]["note"], "remember");
    }

    #[tokio::test]
    async fn subdirectories_are_not_scanned() {
        let dir = sample_log_dir();
        let logs = loader::load_directory(dir.path(), "log")
            .await
            .expect("loading should succeed");

        assert!(
            logs.records.iter().all(|r| r["msg"] != "archived"),
            "records from archive/ should not be loaded"
        );
    }

    #[tokio::test]
    async fn empty_directory_yields_no_records() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let logs = loader::load_directory(dir.path(), "log")
            .await
            .expect("loading should succeed");

        assert_eq!(logs.file_count, 0);
        assert!(logs.records.is_empty());
        assert!(logs.warnings.is_empty());
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let result = loader::load_directory(Path::new("/nonexistent/loupe/logs"), "log").await;
        assert!(matches!(result, Err(Error::ReadDir { .. })));
    }

    #[tokio::test]
    async fn unrelated_extensions_are_ignored() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        write_file(dir.path(), "data.log.bak", "{\"a\":1}\n");
        write_file(dir.path(), "log", "{\"a\":1}\n");

        let logs = loader::load_directory(dir.path(), "log")
            .await
            .expect("loading should succeed");

        // "log" itself has no ".log" suffix and ".log.bak" does not either
        assert_eq!(logs.file_count, 0);
        assert!(logs.records.is_empty());
    }
}

// =============================================================================
// Common Columns Tests
// =============================================================================

mod common_columns_tests {
    use super::*;

    #[tokio::test]
    async fn intersection_in_first_record_order() {
        let dir = sample_log_dir();
        let logs = loader::load_directory(dir.path(), "log")
            .await
            .expect("loading should succeed");

        // "worker" appears only in the last record, so it is not common
        let columns = loader::common_columns(&logs.records);
        assert_eq!(columns, vec!["time", "level", "msg", "status"]);
    }

    #[test]
    fn no_records_means_no_columns() {
        assert!(loader::common_columns(&[]).is_empty());
    }
}

// =============================================================================
// Query Pipeline Tests
// =============================================================================

mod pipeline_tests {
    use super::*;

    #[rstest]
    #[case::match_all("", 4)]
    #[case::level_equals("level='error'", 1)]
    #[case::status_at_least("status>='500'", 1)]
    #[case::or_group("level='warn'|level='error'", 2)]
    #[case::and_group("level='info'&status='200'", 2)]
    #[case::substring("msg~'time'", 1)]
    #[case::zero_never_matches_positively("status='0'", 0)]
    #[case::zero_matches_negated("status!='200'", 2)]
    #[case::date_bound("time>=date('2024-03-05 10:00:01')", 3)]
    fn query_match_counts(#[case] query: &str, #[case] expected: usize) {
        let records = sample_records();
        let compiled = CompiledQuery::compile(query).expect("query should compile");
        let matched = records.iter().filter(|r| compiled.matches(r)).count();
        assert_eq!(matched, expected, "match count for query `{query}`");
    }

    #[tokio::test]
    async fn loaded_records_flow_through_a_query() {
        let dir = sample_log_dir();
        let logs = loader::load_directory(dir.path(), "log")
            .await
            .expect("loading should succeed");

        let compiled =
            CompiledQuery::compile("[time,msg]:level='error'|status>='500'").expect("should compile");
        let matched: Vec<&Value> = logs
            .records
            .iter()
            .filter(|record| compiled.matches(record))
            .collect();

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0]["msg"], "upstream timeout");

        let original = loader::common_columns(&logs.records);
        assert_eq!(compiled.columns(&original), vec!["time", "msg"]);
    }

    #[tokio::test]
    async fn wildcard_selector_keeps_remaining_columns() {
        let dir = sample_log_dir();
        let logs = loader::load_directory(dir.path(), "log")
            .await
            .expect("loading should succeed");

        let compiled = CompiledQuery::compile("[msg,...]").expect("should compile");
        let original = loader::common_columns(&logs.records);
        assert_eq!(
            compiled.columns(&original),
            vec!["msg", "time", "level", "status"]
        );
    }
}

// =============================================================================
// Output Tests
// =============================================================================

mod output_tests {
    use super::*;

    fn plain_config() -> OutputConfig {
        OutputConfig::new(80, true, false)
    }

    #[tokio::test]
    async fn filtered_records_render_as_a_table() {
        let dir = sample_log_dir();
        let logs = loader::load_directory(dir.path(), "log")
            .await
            .expect("loading should succeed");

        let compiled = CompiledQuery::compile("[msg,status]:level='error'").expect("should compile");
        let matched: Vec<&Value> = logs
            .records
            .iter()
            .filter(|record| compiled.matches(record))
            .collect();
        let columns = compiled.columns(&loader::common_columns(&logs.records));

        let mut buffer = Vec::new();
        output::print_table(&mut buffer, &columns, &matched, &plain_config())
            .expect("printing should succeed");
        let rendered = String::from_utf8(buffer).expect("output should be UTF-8");

        assert!(rendered.contains("msg"));
        assert!(rendered.contains("status"));
        assert!(rendered.contains("upstream timeout"));
        assert!(rendered.contains("504"));
        assert!(!rendered.contains("service started"));
    }

    #[tokio::test]
    async fn filtered_records_render_as_json_lines() {
        let dir = sample_log_dir();
        let logs = loader::load_directory(dir.path(), "log")
            .await
            .expect("loading should succeed");

        let compiled = CompiledQuery::compile("[level,msg]:status>='500'").expect("should compile");
        let matched: Vec<&Value> = logs
            .records
            .iter()
            .filter(|record| compiled.matches(record))
            .collect();
        let columns = compiled.columns(&loader::common_columns(&logs.records));

        let mut buffer = Vec::new();
        output::print_json_lines(&mut buffer, &columns, &matched)
            .expect("printing should succeed");
        let rendered = String::from_utf8(buffer).expect("output should be UTF-8");

        assert_eq!(
            rendered,
            "{\"level\":\"error\",\"msg\":\"upstream timeout\"}\n"
        );
    }

    #[test]
    fn empty_selection_prints_a_notice() {
        let mut buffer = Vec::new();
        output::print_table(&mut buffer, &[], &[], &plain_config())
            .expect("printing should succeed");
        let rendered = String::from_utf8(buffer).expect("output should be UTF-8");
        assert_eq!(rendered, "No columns to display.\n");
    }
}
