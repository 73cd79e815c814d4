//! Parsing and projection of the column-selection clause.
//!
//! The selector is the `[...]` prefix of a query. Entries are separated by
//! commas at bracket depth zero, so `user[name,role]` is one entry that
//! expands to the paths `user.name` and `user.role`.

use crate::ast::Selector;
use crate::error::{Error, Result};

/// Parse the text between the selector's outer brackets.
pub(crate) fn parse_selector(text: &str) -> Result<Selector> {
    let mut selector = Selector::default();
    collect_entries(text, "", &mut selector)?;
    Ok(selector)
}

fn collect_entries(text: &str, prefix: &str, selector: &mut Selector) -> Result<()> {
    for entry in split_entries(text)? {
        if entry == "..." {
            // At the top level `...` means "all original columns"; inside
            // a nesting it selects the parent path itself.
            if prefix.is_empty() {
                selector.wildcard = true;
            } else {
                selector.paths.push(prefix.to_string());
            }
            continue;
        }
        if entry.is_empty() {
            return Err(Error::EmptySelectorEntry {
                selector: text.to_string(),
            });
        }
        match entry.find('[') {
            None => selector.paths.push(join(prefix, entry)),
            Some(open) => {
                if open == 0 || !entry.ends_with(']') {
                    return Err(Error::MalformedSelectorEntry {
                        entry: entry.to_string(),
                    });
                }
                let child_prefix = join(prefix, &entry[..open]);
                collect_entries(&entry[open + 1..entry.len() - 1], &child_prefix, selector)?;
            }
        }
    }
    Ok(())
}

/// Split on commas at bracket depth zero.
fn split_entries(text: &str) -> Result<Vec<&str>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1).ok_or_else(|| Error::UnbalancedBrackets {
                    selector: text.to_string(),
                })?;
            }
            ',' if depth == 0 => {
                entries.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::UnbalancedBrackets {
            selector: text.to_string(),
        });
    }
    entries.push(&text[start..]);
    Ok(entries)
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Project a record set's original columns through a selector.
///
/// With no selector the original columns pass through unchanged. Explicit
/// paths come first, in written order; a wildcard then appends every
/// original column not already named.
pub(crate) fn project(selector: Option<&Selector>, original: &[String]) -> Vec<String> {
    let Some(selector) = selector else {
        return original.to_vec();
    };
    let mut columns = selector.paths.clone();
    if selector.wildcard {
        for column in original {
            if !selector.paths.iter().any(|p| p == column) {
                columns.push(column.clone());
            }
        }
    }
    columns
}
