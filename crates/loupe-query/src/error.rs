//! Error types for query compilation.

use thiserror::Error;

/// The error type for query compilation.
///
/// Every variant is produced while parsing and validating a query string.
/// Evaluation of a compiled query against a record never fails.
#[derive(Debug, Error)]
pub enum Error {
    /// A condition is empty, e.g. `a=1&&b=2` or a trailing `|`.
    #[error("empty condition at position {position}")]
    EmptyCondition {
        /// Byte offset of the empty condition in the query string.
        position: usize,
    },

    /// A condition has no comparison operator.
    #[error("missing operator in condition `{condition}`")]
    MissingOperator {
        /// The offending condition text.
        condition: String,
    },

    /// The operator characters do not form a recognized operator.
    #[error("invalid operator `{operator}` in condition `{condition}`")]
    InvalidOperator {
        /// The operator characters as written.
        operator: String,
        /// The offending condition text.
        condition: String,
    },

    /// The left side of a condition is empty or contains illegal characters.
    #[error("invalid field path `{path}` in condition `{condition}`")]
    InvalidPath {
        /// The field path as written.
        path: String,
        /// The offending condition text.
        condition: String,
    },

    /// The right side of a condition is not a quoted literal, regex literal,
    /// or transform call.
    #[error("malformed value `{value}` in condition `{condition}`")]
    MalformedValue {
        /// The right-hand text as written.
        value: String,
        /// The offending condition text.
        condition: String,
    },

    /// A quoted or slash-delimited literal is missing its closing delimiter.
    #[error("unterminated `{delimiter}` literal in condition `{condition}`")]
    UnterminatedLiteral {
        /// The opening delimiter character.
        delimiter: char,
        /// The offending condition text.
        condition: String,
    },

    /// A transform name that the language does not define.
    #[error("unknown transform `{name}` in condition `{condition}`")]
    UnknownTransform {
        /// The transform name as written.
        name: String,
        /// The offending condition text.
        condition: String,
    },

    /// A legal transform used with an operator it does not support,
    /// e.g. `date(...)` with `~` or a regex literal with `<`.
    #[error("`{what}` cannot be used with operator `{operator}`")]
    IllegalCombination {
        /// The transform or literal kind.
        what: String,
        /// The operator as written.
        operator: String,
    },

    /// The argument to `date(...)` does not parse.
    #[error("invalid date `{value}`: expected YYYY[-MM[-DD]][ hh[:mm[:ss]]]")]
    InvalidDate {
        /// The date text as written.
        value: String,
    },

    /// The pattern of a `/.../` literal failed to compile.
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// The selector clause has unbalanced brackets.
    #[error("unbalanced brackets in selector `{selector}`")]
    UnbalancedBrackets {
        /// The selector text as written.
        selector: String,
    },

    /// The selector contains an empty entry, e.g. `[a,,b]`.
    #[error("empty entry in selector `{selector}`")]
    EmptySelectorEntry {
        /// The selector text as written.
        selector: String,
    },

    /// A selector entry with brackets in the wrong place, e.g. `a[b]c`.
    #[error("malformed selector entry `{entry}`")]
    MalformedSelectorEntry {
        /// The entry text as written.
        entry: String,
    },

    /// Characters follow the selector's closing bracket without a `:`.
    #[error("unexpected `{found}` after selector, expected `:` or end of query")]
    TrailingAfterSelector {
        /// The first unexpected character.
        found: char,
    },
}

/// A specialized Result type for query compilation.
pub type Result<T> = std::result::Result<T, Error>;
