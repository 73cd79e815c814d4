//! A small textual query language for JSON-line log records.
//!
//! A query selects columns and filters records in one compact string:
//! an optional bracketed selector (`[name,age]`), then conditions joined
//! by `&` and `|` (`age>='18'&name~'an'`). Queries compile once into a
//! [`CompiledQuery`] and evaluate against any number of records without
//! re-parsing.
//!
//! # Examples
//!
//! ```
//! use loupe_query::CompiledQuery;
//! use serde_json::json;
//!
//! let query = CompiledQuery::compile("level='error'|status>='500'")?;
//! assert!(query.matches(&json!({"level": "error", "status": 200})));
//! assert!(query.matches(&json!({"level": "info", "status": 503})));
//! assert!(!query.matches(&json!({"level": "info", "status": 200})));
//! # Ok::<(), loupe_query::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod error;

mod eval;
mod parser;
mod query;
mod selector;
mod value;

pub use error::{Error, Result};
pub use query::CompiledQuery;
pub use value::lookup_path;
