//! Record-side value handling: dotted-path lookup and coercion.
//!
//! Comparisons never see raw JSON. The field value is first coerced into
//! [`Coerced`]: absent, a finite number, or text. The coercion rules decide
//! most of the language's edge-case behavior, so they live in one place.

use serde_json::Value;

/// A record-side value after coercion.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Coerced {
    /// Missing, null, empty, zero, or false. Positive operators never
    /// match an absent value; negated operators always do.
    Absent,
    /// A finite, non-zero number (possibly parsed from a string).
    Number(f64),
    /// Anything else, as text.
    Text(String),
}

impl Coerced {
    pub(crate) fn is_absent(&self) -> bool {
        matches!(self, Coerced::Absent)
    }

    /// The text form used by substring, regex, and fallback equality
    /// comparisons. `None` for absent values.
    pub(crate) fn to_text(&self) -> Option<String> {
        match self {
            Coerced::Absent => None,
            Coerced::Number(n) => Some(number_text(*n)),
            Coerced::Text(s) => Some(s.clone()),
        }
    }
}

/// Coerce a field value (or its absence) for comparison.
///
/// Missing keys, `null`, empty strings, zero (also when written `"0"`),
/// `false`, and non-finite numbers all coerce to [`Coerced::Absent`].
/// Strings that parse entirely as a finite number become numbers, so
/// `"20"` compares numerically. `true` becomes the text `true`; objects
/// and arrays become their JSON text.
pub(crate) fn coerce(value: Option<&Value>) -> Coerced {
    let Some(value) = value else {
        return Coerced::Absent;
    };
    match value {
        Value::Null => Coerced::Absent,
        Value::Bool(false) => Coerced::Absent,
        Value::Bool(true) => Coerced::Text("true".to_string()),
        Value::Number(n) => n.as_f64().map_or(Coerced::Absent, coerce_number),
        Value::String(s) => coerce_text(s),
        Value::Array(_) | Value::Object(_) => Coerced::Text(value.to_string()),
    }
}

/// Re-apply the zero/finite gate after a numeric transform.
pub(crate) fn coerce_number(n: f64) -> Coerced {
    if n.is_finite() && n != 0.0 {
        Coerced::Number(n)
    } else {
        Coerced::Absent
    }
}

fn coerce_text(s: &str) -> Coerced {
    if s.is_empty() {
        return Coerced::Absent;
    }
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() => coerce_number(n),
        _ => Coerced::Text(s.to_string()),
    }
}

/// Render a number the way comparisons and output see it: integral
/// values without a trailing `.0`.
pub(crate) fn number_text(n: f64) -> String {
    format!("{n}")
}

/// Resolve a dotted path against a record.
///
/// Each segment descends into a nested object; a missing key or a
/// non-object intermediate yields `None`. Paths always split on `.`,
/// so a literal key containing a dot is not addressable.
///
/// # Examples
///
/// ```
/// use serde_json::json;
///
/// let record = json!({"user": {"name": "anna"}});
/// let value = loupe_query::lookup_path(&record, "user.name");
/// assert_eq!(value, Some(&json!("anna")));
/// assert_eq!(loupe_query::lookup_path(&record, "user.age"), None);
/// ```
#[must_use]
pub fn lookup_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
