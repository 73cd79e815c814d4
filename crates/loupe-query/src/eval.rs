//! Evaluation of compiled queries against records.
//!
//! Evaluation is infallible: every condition yields a boolean. The one
//! rule that shapes everything here is the absent rule. A field that is
//! missing, null, empty, zero, or false fails every positive operator
//! and satisfies every negated one, before the right-hand side is even
//! looked at.

use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};

use crate::ast::{Condition, Op, Query, Rhs};
use crate::parser::parse_date;
use crate::value::{Coerced, coerce, coerce_number, lookup_path};

pub(crate) fn query_matches(query: &Query, record: &Value) -> bool {
    if query.groups.is_empty() {
        return true;
    }
    query.groups.iter().any(|group| {
        group
            .conditions
            .iter()
            .all(|condition| condition_matches(condition, record))
    })
}

fn condition_matches(condition: &Condition, record: &Value) -> bool {
    let raw = lookup_path(record, &condition.path);
    let mut value = coerce(raw);
    if let Some(transform) = condition.transform {
        value = match value {
            Coerced::Number(n) => coerce_number(transform.apply(n)),
            _ => Coerced::Absent,
        };
    }
    if value.is_absent() {
        return condition.op.is_negated();
    }
    match &condition.rhs {
        Rhs::Literal(literal) => scalar_compare(&value, condition.op, literal),
        Rhs::Pattern(pattern) => {
            let matched = value.to_text().is_some_and(|text| pattern.is_match(&text));
            negate_for(condition.op, matched)
        }
        Rhs::Date(target) => date_compare(&value, condition.op, *target),
        Rhs::Array {
            elements,
            open_ended,
        } => {
            let matched = json_array(raw)
                .is_some_and(|items| array_matches(&items, elements, *open_ended));
            negate_for(condition.op, matched)
        }
        Rhs::Object {
            entries,
            open_ended,
        } => {
            let matched =
                json_object(raw).is_some_and(|map| object_matches(&map, entries, *open_ended));
            negate_for(condition.op, matched)
        }
    }
}

/// `!=` inverts a membership-style match; every other operator reaching
/// here takes the match as-is.
fn negate_for(op: Op, matched: bool) -> bool {
    if op == Op::Ne { !matched } else { matched }
}

// ============================================================================
// Scalar comparison
// ============================================================================

fn scalar_compare(value: &Coerced, op: Op, literal: &str) -> bool {
    match op {
        Op::Eq => scalar_eq(value, literal),
        Op::Ne => !scalar_eq(value, literal),
        Op::Lt | Op::Le | Op::Gt | Op::Ge => scalar_order(value, op, literal),
        Op::Contains => contains(value, literal),
        Op::NotContains => !contains(value, literal),
    }
}

/// Numbers compare numerically when the literal is numeric, so `'18'`
/// equals both `18` and `"18"`. Everything else falls back to the text
/// form.
fn scalar_eq(value: &Coerced, literal: &str) -> bool {
    if let Coerced::Number(n) = value {
        if let Ok(m) = literal.parse::<f64>() {
            return *n == m;
        }
    }
    value.to_text().is_some_and(|text| text == literal)
}

fn scalar_order(value: &Coerced, op: Op, literal: &str) -> bool {
    let ordering = match value {
        Coerced::Number(n) => literal.parse::<f64>().ok().and_then(|m| n.partial_cmp(&m)),
        Coerced::Text(text) => Some(text.as_str().cmp(literal)),
        Coerced::Absent => None,
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        Op::Lt => ordering.is_lt(),
        Op::Le => ordering.is_le(),
        Op::Gt => ordering.is_gt(),
        Op::Ge => ordering.is_ge(),
        _ => false,
    }
}

fn contains(value: &Coerced, literal: &str) -> bool {
    value.to_text().is_some_and(|text| text.contains(literal))
}

// ============================================================================
// Date comparison
// ============================================================================

/// The record side of a date comparison: numbers are Unix epoch
/// milliseconds, text is tried against the query date grammar and then
/// RFC 3339. Values that resolve to no timestamp behave like absent
/// values.
fn date_compare(value: &Coerced, op: Op, target: NaiveDateTime) -> bool {
    let actual = match value {
        Coerced::Number(n) => {
            DateTime::from_timestamp_millis(*n as i64).map(|dt| dt.naive_utc())
        }
        Coerced::Text(text) => parse_date(text)
            .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_utc())),
        Coerced::Absent => None,
    };
    let Some(actual) = actual else {
        return op.is_negated();
    };
    match op {
        Op::Eq => actual == target,
        Op::Ne => actual != target,
        Op::Lt => actual < target,
        Op::Le => actual <= target,
        Op::Gt => actual > target,
        Op::Ge => actual >= target,
        // Rejected at compile time.
        Op::Contains | Op::NotContains => false,
    }
}

// ============================================================================
// Structural comparison
// ============================================================================

/// The record side of an array comparison: a JSON array directly, or a
/// string containing one.
fn json_array(raw: Option<&Value>) -> Option<Vec<Value>> {
    match raw? {
        Value::Array(items) => Some(items.clone()),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

fn json_object(raw: Option<&Value>) -> Option<Map<String, Value>> {
    match raw? {
        Value::Object(map) => Some(map.clone()),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// Without `...`: set equality between the written elements and the
/// record array. With `...`: every written element must be present,
/// extras are allowed.
fn array_matches(items: &[Value], elements: &[String], open_ended: bool) -> bool {
    let all_written_present = elements
        .iter()
        .all(|element| items.iter().any(|item| element_eq(item, element)));
    if open_ended {
        all_written_present
    } else {
        all_written_present
            && items
                .iter()
                .all(|item| elements.iter().any(|element| element_eq(item, element)))
    }
}

fn object_matches(map: &Map<String, Value>, entries: &[(String, String)], open_ended: bool) -> bool {
    let all_written_present = entries.iter().all(|(key, value)| {
        map.get(key).is_some_and(|actual| element_eq(actual, value))
    });
    if open_ended {
        all_written_present
    } else {
        all_written_present && map.keys().all(|key| entries.iter().any(|(k, _)| k == key))
    }
}

/// Element equality inside arrays and objects. Numeric when both sides
/// are numeric, textual otherwise. The absent rule does not apply here:
/// `0` is a perfectly good element.
fn element_eq(value: &Value, literal: &str) -> bool {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => text.parse::<f64>().ok(),
        _ => None,
    };
    if let (Some(n), Ok(m)) = (number, literal.parse::<f64>()) {
        return n == m;
    }
    element_text(value) == literal
}

fn element_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
