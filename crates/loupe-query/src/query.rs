//! The compiled query, the crate's entry point.

use std::str::FromStr;

use serde_json::Value;

use crate::ast::Query;
use crate::error::{Error, Result};
use crate::{eval, parser, selector};

/// A parsed and validated query, ready to evaluate against any number
/// of records.
///
/// Compiling is the only fallible step. Once built, [`matches`] and
/// [`columns`] are pure functions of their arguments.
///
/// [`matches`]: CompiledQuery::matches
/// [`columns`]: CompiledQuery::columns
///
/// # Examples
///
/// ```
/// use loupe_query::CompiledQuery;
/// use serde_json::json;
///
/// let query = CompiledQuery::compile("[name,age]:age>='18'&name~'an'")?;
/// assert!(query.matches(&json!({"name": "anna", "age": "20", "city": "X"})));
/// assert!(!query.matches(&json!({"name": "Bob", "age": "30"})));
///
/// let original = vec!["name".to_string(), "age".to_string(), "city".to_string()];
/// assert_eq!(query.columns(&original), vec!["name", "age"]);
/// # Ok::<(), loupe_query::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    query: Query,
}

impl CompiledQuery {
    /// Compile a query string. The empty string compiles to the query
    /// that matches every record and keeps every column.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] describing the first problem found in the
    /// query text.
    pub fn compile(text: &str) -> Result<Self> {
        Ok(Self {
            query: parser::parse_query(text)?,
        })
    }

    /// Whether the record satisfies the condition clause.
    ///
    /// Groups joined by `|` are tried in turn; within a group every
    /// condition must hold. A query without conditions matches
    /// everything.
    #[must_use]
    pub fn matches(&self, record: &Value) -> bool {
        eval::query_matches(&self.query, record)
    }

    /// Project a record set's original columns through the selector
    /// clause.
    ///
    /// Explicitly selected paths come first, in written order; a `...`
    /// wildcard then appends the original columns not already named.
    /// Without a selector the original columns pass through unchanged.
    #[must_use]
    pub fn columns(&self, original: &[String]) -> Vec<String> {
        selector::project(self.query.selector.as_ref(), original)
    }

    /// The parsed form of the query.
    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }
}

impl FromStr for CompiledQuery {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::compile(s)
    }
}
