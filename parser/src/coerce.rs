//! Conversion of raw string tokens into typed [`Value`]s.

use std::sync::LazyLock;

use argweave_core::{ItemKind, Value};
use regex::Regex;

use crate::error::{ParseError, Result};

static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("static regex must compile")
});
static RADIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?)0([xXoObB])([0-9a-fA-F]+)$").expect("static regex must compile")
});

/// Parses a numeric literal.
///
/// Accepts decimal literals with optional fraction and exponent, and
/// `0x`/`0o`/`0b` integers. Both forms take an optional sign. Surrounding whitespace is ignored.
/// Empty input, `inf`/`NaN` spellings and anything non-finite are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let text = raw.trim();
    if DECIMAL_RE.is_match(text) {
        return text.parse::<f64>().ok().filter(|n| n.is_finite());
    }
    let caps = RADIX_RE.captures(text)?;
    let radix = match &caps[2] {
        "x" | "X" => 16,
        "o" | "O" => 8,
        _ => 2,
    };
    let magnitude = u64::from_str_radix(&caps[3], radix).ok()? as f64;
    Some(if &caps[1] == "-" { -magnitude } else { magnitude })
}

/// Whether a dash-led token should be read as a negative number rather than
/// a flag.
pub fn is_number_literal(token: &str) -> bool {
    DECIMAL_RE.is_match(token) || RADIX_RE.is_match(token)
}

pub(crate) fn coerce_number(target: &str, raw: &str) -> Result<Value> {
    parse_number(raw)
        .map(Value::Number)
        .ok_or_else(|| ParseError::InvalidNumber {
            target: target.to_string(),
            value: raw.to_string(),
        })
}

pub(crate) fn coerce_choice(target: &str, raw: &str, choices: &[String]) -> Result<Value> {
    if choices.iter().any(|choice| choice == raw) {
        Ok(Value::String(raw.to_string()))
    } else {
        Err(ParseError::InvalidChoice {
            target: target.to_string(),
            value: raw.to_string(),
            choices: choices.to_vec(),
        })
    }
}

/// Coerces every element of an array option or variadic positional.
pub(crate) fn coerce_items(
    target: &str,
    raws: &[String],
    items: ItemKind,
    choices: Option<&[String]>,
) -> Result<Value> {
    raws.iter()
        .map(|raw| match (items, choices) {
            (ItemKind::Number, _) => coerce_number(target, raw),
            (_, Some(choices)) => coerce_choice(target, raw, choices),
            (_, None) => Ok(Value::String(raw.clone())),
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}
