//! Query-string parsing.
//!
//! A query is an optional bracketed selector followed by conditions joined
//! with `&` and `|`. Parsing is a single left-to-right scan with a small
//! literal state machine, so `&` and `|` inside quoted or slash-delimited
//! literals never split a condition. Anything suspicious is a hard error
//! at compile time; a typo must not silently match nothing.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::ast::{AndGroup, Condition, NumericTransform, Op, Query, Rhs};
use crate::error::{Error, Result};
use crate::selector::parse_selector;

/// Parse a full query string. An empty string is the match-all query.
pub(crate) fn parse_query(text: &str) -> Result<Query> {
    let (selector_text, condition_text) = split_clauses(text)?;
    let selector = selector_text.map(parse_selector).transpose()?;
    let groups = if condition_text.is_empty() {
        Vec::new()
    } else {
        parse_conditions(condition_text)?
    };
    Ok(Query { selector, groups })
}

/// Split the query into its selector and condition clauses.
///
/// A selector is present exactly when the query starts with `[`; it ends
/// at the matching bracket and must be followed by `:` or the end of the
/// query.
fn split_clauses(text: &str) -> Result<(Option<&str>, &str)> {
    if !text.starts_with('[') {
        return Ok((None, text));
    }
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    let selector = &text[1..i];
                    let rest = &text[i + 1..];
                    return match rest.chars().next() {
                        None => Ok((Some(selector), "")),
                        Some(':') => Ok((Some(selector), &rest[1..])),
                        Some(found) => Err(Error::TrailingAfterSelector { found }),
                    };
                }
            }
            _ => {}
        }
    }
    Err(Error::UnbalancedBrackets {
        selector: text.to_string(),
    })
}

/// Split the condition clause on `&` and `|` and build the OR-of-ANDs.
fn parse_conditions(text: &str) -> Result<Vec<AndGroup>> {
    let mut groups = Vec::new();
    let mut group = AndGroup::default();
    let mut literal: Option<char> = None;
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        match literal {
            Some(delimiter) => {
                if c == delimiter {
                    literal = None;
                }
            }
            None => match c {
                '\'' | '/' => literal = Some(c),
                '&' | '|' => {
                    let fragment = &text[start..i];
                    if fragment.is_empty() {
                        return Err(Error::EmptyCondition { position: start });
                    }
                    group.conditions.push(parse_condition(fragment)?);
                    if c == '|' {
                        groups.push(std::mem::take(&mut group));
                    }
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    if let Some(delimiter) = literal {
        return Err(Error::UnterminatedLiteral {
            delimiter,
            condition: text[start..].to_string(),
        });
    }
    let fragment = &text[start..];
    if fragment.is_empty() {
        return Err(Error::EmptyCondition { position: start });
    }
    group.conditions.push(parse_condition(fragment)?);
    groups.push(group);
    Ok(groups)
}

fn parse_condition(text: &str) -> Result<Condition> {
    let op_start = text
        .find(is_operator_char)
        .ok_or_else(|| Error::MissingOperator {
            condition: text.to_string(),
        })?;
    let (path, transform) = parse_left(&text[..op_start], text)?;
    let (op, value) = parse_operator(&text[op_start..], text)?;
    let rhs = parse_rhs(value, op, text)?;
    Ok(Condition {
        path,
        transform,
        op,
        rhs,
    })
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '=' | '!' | '<' | '>' | '~')
}

fn is_path_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Parse the operator at the head of `rest` and return it with the
/// remaining right-hand text. Takes the longest run of operator
/// characters (capped at two), so `==` and `<>` are rejected rather
/// than misread.
fn parse_operator<'a>(rest: &'a str, condition: &str) -> Result<(Op, &'a str)> {
    let len = rest.chars().take(2).take_while(|&c| is_operator_char(c)).count();
    let (op_text, value) = rest.split_at(len);
    let op = match op_text {
        "=" => Op::Eq,
        "!=" => Op::Ne,
        "<" => Op::Lt,
        "<=" => Op::Le,
        ">" => Op::Gt,
        ">=" => Op::Ge,
        "~" => Op::Contains,
        "!~" => Op::NotContains,
        _ => {
            return Err(Error::InvalidOperator {
                operator: op_text.to_string(),
                condition: condition.to_string(),
            });
        }
    };
    Ok((op, value))
}

fn parse_left(left: &str, condition: &str) -> Result<(String, Option<NumericTransform>)> {
    let (name, path) = match unwrap_call(left) {
        Some((name, argument)) => (Some(name), argument),
        None => (None, left),
    };
    let transform = match name {
        None => None,
        Some("floor") => Some(NumericTransform::Floor),
        Some("ceil") => Some(NumericTransform::Ceil),
        Some("round") => Some(NumericTransform::Round),
        Some(other) => {
            return Err(Error::UnknownTransform {
                name: other.to_string(),
                condition: condition.to_string(),
            });
        }
    };
    if path.is_empty() || !path.chars().all(is_path_char) {
        return Err(Error::InvalidPath {
            path: path.to_string(),
            condition: condition.to_string(),
        });
    }
    Ok((path.to_string(), transform))
}

fn parse_rhs(value: &str, op: Op, condition: &str) -> Result<Rhs> {
    if let Some(inner) = delimited(value, '\'') {
        return Ok(Rhs::Literal(inner.to_string()));
    }
    if let Some(inner) = delimited(value, '/') {
        require_equality(op, "regex")?;
        return Ok(Rhs::Pattern(Regex::new(inner)?));
    }
    if let Some((name, argument)) = unwrap_call(value) {
        let Some(argument) = delimited(argument, '\'') else {
            return Err(Error::MalformedValue {
                value: value.to_string(),
                condition: condition.to_string(),
            });
        };
        return match name {
            "date" => {
                if matches!(op, Op::Contains | Op::NotContains) {
                    return Err(Error::IllegalCombination {
                        what: "date".to_string(),
                        operator: op.to_string(),
                    });
                }
                let date = parse_date(argument).ok_or_else(|| Error::InvalidDate {
                    value: argument.to_string(),
                })?;
                Ok(Rhs::Date(date))
            }
            "object" => {
                require_equality(op, "object")?;
                parse_object_argument(argument, condition)
            }
            "array" => {
                require_equality(op, "array")?;
                Ok(parse_array_argument(argument))
            }
            other => Err(Error::UnknownTransform {
                name: other.to_string(),
                condition: condition.to_string(),
            }),
        };
    }
    Err(Error::MalformedValue {
        value: value.to_string(),
        condition: condition.to_string(),
    })
}

fn require_equality(op: Op, what: &str) -> Result<()> {
    if matches!(op, Op::Eq | Op::Ne) {
        Ok(())
    } else {
        Err(Error::IllegalCombination {
            what: what.to_string(),
            operator: op.to_string(),
        })
    }
}

/// The text between a leading and trailing `delimiter`, if both exist.
fn delimited(text: &str, delimiter: char) -> Option<&str> {
    text.strip_prefix(delimiter)?.strip_suffix(delimiter)
}

/// Split `name(argument)` using the first `(` and the final `)`.
fn unwrap_call(token: &str) -> Option<(&str, &str)> {
    let open = token.find('(')?;
    if !token.ends_with(')') {
        return None;
    }
    Some((&token[..open], &token[open + 1..token.len() - 1]))
}

fn parse_object_argument(argument: &str, condition: &str) -> Result<Rhs> {
    let body = argument
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(argument);
    let mut entries = Vec::new();
    let mut open_ended = false;
    if body.is_empty() {
        return Ok(Rhs::Object { entries, open_ended });
    }
    for entry in body.split(',') {
        if entry == "..." {
            open_ended = true;
            continue;
        }
        let Some((key, value)) = entry.split_once(':') else {
            return Err(Error::MalformedValue {
                value: entry.to_string(),
                condition: condition.to_string(),
            });
        };
        if key.is_empty() {
            return Err(Error::MalformedValue {
                value: entry.to_string(),
                condition: condition.to_string(),
            });
        }
        entries.push((key.to_string(), value.to_string()));
    }
    Ok(Rhs::Object { entries, open_ended })
}

fn parse_array_argument(argument: &str) -> Rhs {
    let body = argument
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(argument);
    let mut elements = Vec::new();
    let mut open_ended = false;
    for element in body.split(',') {
        if element == "..." {
            open_ended = true;
        } else if !element.is_empty() {
            elements.push(element.to_string());
        }
    }
    Rhs::Array { elements, open_ended }
}

/// Parse `YYYY[-MM[-DD]][ hh[:mm[:ss]]]`. Omitted parts default to the
/// start of their range.
pub(crate) fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let (date_part, time_part) = match text.split_once(' ') {
        Some((date, time)) => (date, Some(time)),
        None => (text, None),
    };
    let mut fields = date_part.splitn(3, '-');
    let year: i32 = fields.next()?.parse().ok()?;
    let month: u32 = match fields.next() {
        Some(field) => field.parse().ok()?,
        None => 1,
    };
    let day: u32 = match fields.next() {
        Some(field) => field.parse().ok()?,
        None => 1,
    };
    let (hour, minute, second) = match time_part {
        None => (0, 0, 0),
        Some(time) => {
            let mut fields = time.splitn(3, ':');
            let hour: u32 = fields.next()?.parse().ok()?;
            let minute: u32 = match fields.next() {
                Some(field) => field.parse().ok()?,
                None => 0,
            };
            let second: u32 = match fields.next() {
                Some(field) => field.parse().ok()?,
                None => 0,
            };
            (hour, minute, second)
        }
    };
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}
