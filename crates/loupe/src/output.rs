//! Table and JSON rendering for matched records.
//!
//! The table renderer draws the classic box layout log viewers use:
//! one column per selected path, cells wrapped to fit the terminal.
//! All printing goes through `Write` so tests can capture output in a
//! buffer.

use std::env;
use std::io::{self, Write};

use colored::Colorize;
use loupe_query::lookup_path;
use serde_json::Value;

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 80;
const MIN_COLUMN_WIDTH: usize = 5;
const MAX_COLUMN_WIDTH: usize = 40;

/// Configuration for output formatting.
///
/// Holds the settings that control how tables are drawn: the content
/// width cap, ASCII fallback mode, and color output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for the whole table.
    pub max_width: usize,
    /// Whether to draw borders with ASCII characters instead of
    /// box-drawing glyphs.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new `OutputConfig` with explicit values.
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an `OutputConfig` by reading from environment variables.
    ///
    /// Reads:
    /// - `LOUPE_MAX_WIDTH`: Maximum content width (default: 80)
    /// - `LOUPE_ASCII`: Set to "1" or "true" for ASCII-only borders (default: false)
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `LOUPE_COLOR`: Set to "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// The same as [`from_env`], but reading variables through `lookup` so
    /// tests can inject values without touching the process environment.
    ///
    /// [`from_env`]: OutputConfig::from_env
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_width = match lookup("LOUPE_MAX_WIDTH") {
            Some(s) if !s.is_empty() => match s.parse() {
                Ok(width) => width,
                Err(_) => {
                    tracing::warn!(
                        env_var = "LOUPE_MAX_WIDTH",
                        value = %s,
                        default = DEFAULT_MAX_CONTENT_WIDTH,
                        "Invalid value, using default"
                    );
                    DEFAULT_MAX_CONTENT_WIDTH
                }
            },
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = match lookup("LOUPE_ASCII") {
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Some(v) => {
                tracing::warn!(
                    env_var = "LOUPE_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            None => false,
        };

        // Respect the NO_COLOR standard (https://no-color.org/)
        // Also support LOUPE_COLOR for explicit control
        let use_colors = lookup("NO_COLOR").is_none()
            && lookup("LOUPE_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// A bordered table of the selected columns.
    Table,
    /// One JSON object per matching record.
    Json,
}

/// Get the current terminal width, falling back to default if detection fails.
fn get_terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_TERMINAL_WIDTH as usize)
}

// ============================================================================
// Cell Rendering
// ============================================================================

/// The text shown for a record's value at a dotted path.
///
/// Missing values and nulls render blank; strings render without quotes;
/// everything else renders as JSON. Note this differs from the query
/// language's view, where zero and false count as absent: a table cell
/// still shows them.
pub fn cell_text(record: &Value, path: &str) -> String {
    match lookup_path(record, path) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Wrap text to fit within a given width, preserving existing line breaks.
/// Uses textwrap to handle edge cases like long words (URLs, file paths).
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width)
                    .into_iter()
                    .map(|s| s.into_owned())
                    .collect()
            }
        })
        .collect()
}

// ============================================================================
// Table Rendering
// ============================================================================

struct TableGlyphs {
    horizontal: char,
    vertical: char,
    top: [char; 3],
    middle: [char; 3],
    bottom: [char; 3],
}

impl TableGlyphs {
    fn for_config(config: &OutputConfig) -> Self {
        if config.use_ascii {
            Self {
                horizontal: '-',
                vertical: '|',
                top: ['+', '+', '+'],
                middle: ['+', '+', '+'],
                bottom: ['+', '+', '+'],
            }
        } else {
            Self {
                horizontal: '─',
                vertical: '│',
                top: ['┌', '┬', '┐'],
                middle: ['├', '┼', '┤'],
                bottom: ['└', '┴', '┘'],
            }
        }
    }
}

/// Print matching records as a bordered table.
///
/// The header row holds the selected columns; each record contributes
/// one row, with cells wrapped to the column width. With no columns a
/// short notice is printed instead; with no records the table is just
/// the header.
pub fn print_table<W: Write>(
    w: &mut W,
    columns: &[String],
    records: &[&Value],
    config: &OutputConfig,
) -> io::Result<()> {
    if columns.is_empty() {
        return writeln!(w, "No columns to display.");
    }
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| columns.iter().map(|column| cell_text(record, column)).collect())
        .collect();
    let widths = column_widths(columns, &rows, config);
    let glyphs = TableGlyphs::for_config(config);

    print_rule(w, &widths, &glyphs, glyphs.top)?;
    print_row(w, columns, &widths, &glyphs, true, config.use_colors)?;
    if !rows.is_empty() {
        print_rule(w, &widths, &glyphs, glyphs.middle)?;
        for row in &rows {
            print_row(w, row, &widths, &glyphs, false, config.use_colors)?;
        }
    }
    print_rule(w, &widths, &glyphs, glyphs.bottom)
}

/// Pick a width per column: wide enough for the longest cell line, capped,
/// then shrunk a character at a time until the table fits the terminal.
fn column_widths(columns: &[String], rows: &[Vec<String>], config: &OutputConfig) -> Vec<usize> {
    let mut widths: Vec<usize> = columns.iter().map(|column| column.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            let longest_line = cell.lines().map(|l| l.chars().count()).max().unwrap_or(0);
            *width = (*width).max(longest_line);
        }
    }
    for width in &mut widths {
        *width = (*width).min(MAX_COLUMN_WIDTH);
    }

    let available = get_terminal_width().min(config.max_width);
    let overhead = 3 * columns.len() + 1;
    let mut total = widths.iter().sum::<usize>() + overhead;
    while total > available {
        let Some(widest) = widths.iter_mut().max() else {
            break;
        };
        if *widest <= MIN_COLUMN_WIDTH {
            break;
        }
        *widest -= 1;
        total -= 1;
    }
    widths
}

fn print_rule<W: Write>(
    w: &mut W,
    widths: &[usize],
    glyphs: &TableGlyphs,
    [left, mid, right]: [char; 3],
) -> io::Result<()> {
    let mut line = String::new();
    line.push(left);
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            line.push(mid);
        }
        for _ in 0..width + 2 {
            line.push(glyphs.horizontal);
        }
    }
    line.push(right);
    writeln!(w, "{line}")
}

fn print_row<W: Write>(
    w: &mut W,
    cells: &[String],
    widths: &[usize],
    glyphs: &TableGlyphs,
    header: bool,
    use_colors: bool,
) -> io::Result<()> {
    let wrapped: Vec<Vec<String>> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| wrap_text(cell, width))
        .collect();
    let height = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
    for line_index in 0..height {
        write!(w, "{}", glyphs.vertical)?;
        for (cell_lines, &width) in wrapped.iter().zip(widths) {
            let text = cell_lines.get(line_index).map_or("", String::as_str);
            let padded = format!("{text:<width$}");
            if header && use_colors {
                write!(w, " {} {}", padded.bold(), glyphs.vertical)?;
            } else {
                write!(w, " {padded} {}", glyphs.vertical)?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}

// ============================================================================
// JSON Rendering
// ============================================================================

/// Print matching records as JSON lines, one object per record,
/// containing only the selected columns.
pub fn print_json_lines<W: Write>(
    w: &mut W,
    columns: &[String],
    records: &[&Value],
) -> io::Result<()> {
    for record in records {
        let mut object = serde_json::Map::new();
        for column in columns {
            if let Some(value) = lookup_path(record, column) {
                object.insert(column.clone(), value.clone());
            }
        }
        let line = serde_json::to_string(&Value::Object(object))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(w, "{line}")?;
    }
    Ok(())
}
