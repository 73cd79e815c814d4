//! The abstract syntax of a compiled query.
//!
//! A query string parses into a [`Query`]: an optional column [`Selector`]
//! plus a disjunction of [`AndGroup`]s. The AST is immutable and public so
//! callers can inspect what a query will do; evaluation lives elsewhere.

use std::fmt;

use chrono::NaiveDateTime;
use regex::Regex;

/// A parsed query: optional column selector plus condition groups.
///
/// Groups are joined by OR; conditions within a group by AND. An empty
/// `groups` list means the query has no condition clause and matches
/// every record.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// The bracketed column-selection clause, if present.
    pub selector: Option<Selector>,
    /// The condition clause as a disjunction of AND-groups.
    pub groups: Vec<AndGroup>,
}

/// The column-selection clause of a query.
///
/// Nested selections like `user[name,role]` are flattened to dotted paths
/// (`user.name`, `user.role`) during parsing. A top-level `...` sets
/// `wildcard` instead of adding a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    /// Explicitly selected dotted paths, in written order.
    pub paths: Vec<String>,
    /// Whether the selector contained a top-level `...`.
    pub wildcard: bool,
}

/// A conjunction of conditions. All must hold for the group to match.
#[derive(Debug, Clone, Default)]
pub struct AndGroup {
    /// The conditions of this group, in written order.
    pub conditions: Vec<Condition>,
}

/// A single comparison within a query.
#[derive(Debug, Clone)]
pub struct Condition {
    /// The dotted field path on the left side.
    pub path: String,
    /// Numeric transform wrapped around the field, if any.
    pub transform: Option<NumericTransform>,
    /// The comparison operator.
    pub op: Op,
    /// The right-hand side.
    pub rhs: Rhs,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `~` (substring containment)
    Contains,
    /// `!~` (substring non-containment)
    NotContains,
}

impl Op {
    /// Whether this operator asserts absence of a match.
    ///
    /// Negated operators hold vacuously when the field value is absent.
    #[must_use]
    pub fn is_negated(self) -> bool {
        matches!(self, Op::Ne | Op::NotContains)
    }

    /// Whether this operator is an ordering comparison.
    #[must_use]
    pub fn is_relational(self) -> bool {
        matches!(self, Op::Lt | Op::Le | Op::Gt | Op::Ge)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Contains => "~",
            Op::NotContains => "!~",
        };
        f.write_str(s)
    }
}

/// Numeric transforms applicable to the field side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericTransform {
    /// Largest integer not above the value.
    Floor,
    /// Smallest integer not below the value.
    Ceil,
    /// Nearest integer, halves away from zero.
    Round,
}

impl NumericTransform {
    /// Apply the transform to a number.
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            NumericTransform::Floor => value.floor(),
            NumericTransform::Ceil => value.ceil(),
            NumericTransform::Round => value.round(),
        }
    }
}

impl fmt::Display for NumericTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NumericTransform::Floor => "floor",
            NumericTransform::Ceil => "ceil",
            NumericTransform::Round => "round",
        };
        f.write_str(s)
    }
}

/// The right-hand side of a comparison.
#[derive(Debug, Clone)]
pub enum Rhs {
    /// A quoted literal, compared as text or number depending on the field.
    Literal(String),
    /// A `/.../` literal, compiled at query-compile time.
    Pattern(Regex),
    /// A `date('...')` call, resolved to a timestamp at compile time.
    Date(NaiveDateTime),
    /// An `array('...')` call.
    Array {
        /// The explicit elements, as written.
        elements: Vec<String>,
        /// Whether the argument contained `...` (extra record elements
        /// are allowed).
        open_ended: bool,
    },
    /// An `object('...')` call.
    Object {
        /// The explicit key/value entries, as written.
        entries: Vec<(String, String)>,
        /// Whether the argument contained `...` (extra record keys are
        /// allowed).
        open_ended: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negated_operators() {
        assert!(Op::Ne.is_negated());
        assert!(Op::NotContains.is_negated());
        assert!(!Op::Eq.is_negated());
        assert!(!Op::Lt.is_negated());
    }

    #[test]
    fn relational_operators() {
        assert!(Op::Lt.is_relational());
        assert!(Op::Le.is_relational());
        assert!(Op::Gt.is_relational());
        assert!(Op::Ge.is_relational());
        assert!(!Op::Eq.is_relational());
        assert!(!Op::Contains.is_relational());
    }

    #[test]
    fn operator_display_round_trips_through_source_form() {
        assert_eq!(Op::Ge.to_string(), ">=");
        assert_eq!(Op::NotContains.to_string(), "!~");
    }

    #[test]
    fn round_goes_away_from_zero_on_halves() {
        assert_eq!(NumericTransform::Round.apply(2.5), 3.0);
        assert_eq!(NumericTransform::Round.apply(-2.5), -3.0);
        assert_eq!(NumericTransform::Floor.apply(2.9), 2.0);
        assert_eq!(NumericTransform::Ceil.apply(2.1), 3.0);
    }
}
