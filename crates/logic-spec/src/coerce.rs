//! JavaScript-compatible coercions used by condition operators.
//!
//! Rule definitions are authored in a browser builder, so comparisons keep the
//! semantics of `===`, `String(x)`, `Number(x)` and truthiness that the stored
//! rules were written against.

use serde_json::Value;

/// An operand that may be `undefined` (missing answer or missing condition value).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand<'a> {
    Undefined,
    Json(&'a Value),
}

impl<'a> Operand<'a> {
    pub fn from_option(value: Option<&'a Value>) -> Self {
        match value {
            Some(value) => Operand::Json(value),
            None => Operand::Undefined,
        }
    }

    pub fn as_json(&self) -> Option<&'a Value> {
        match self {
            Operand::Undefined => None,
            Operand::Json(value) => Some(value),
        }
    }
}

/// `a === b`. Arrays and objects are never strictly equal to another value.
pub fn strict_equals(left: Operand<'_>, right: Operand<'_>) -> bool {
    match (left, right) {
        (Operand::Undefined, Operand::Undefined) => true,
        (Operand::Json(left), Operand::Json(right)) => primitive_equals(left, right),
        _ => false,
    }
}

fn primitive_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::Number(left), Value::Number(right)) => match (left.as_f64(), right.as_f64()) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        },
        (Value::String(left), Value::String(right)) => left == right,
        _ => false,
    }
}

/// `Array.prototype.includes` membership (SameValueZero; JSON carries no NaN).
pub fn includes(list: &[Value], needle: Operand<'_>) -> bool {
    match needle {
        Operand::Undefined => false,
        Operand::Json(needle) => list.iter().any(|item| primitive_equals(item, needle)),
    }
}

/// JS truthiness.
pub fn is_truthy(operand: Operand<'_>) -> bool {
    match operand {
        Operand::Undefined => false,
        Operand::Json(value) => match value {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Number(number) => number
                .as_f64()
                .map(|n| n != 0.0 && !n.is_nan())
                .unwrap_or(true),
            Value::String(text) => !text.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        },
    }
}

/// `String(x)`.
pub fn to_js_string(operand: Operand<'_>) -> String {
    match operand {
        Operand::Undefined => "undefined".into(),
        Operand::Json(value) => value_to_js_string(value),
    }
}

fn value_to_js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => match number.as_f64() {
            Some(n) if number.is_f64() => format_js_number(n),
            _ => number.to_string(),
        },
        Value::String(text) => text.clone(),
        // Array.prototype.toString: null/undefined elements become empty strings.
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => value_to_js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".into(),
    }
}

fn format_js_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else if n == 0.0 {
        // Covers -0.
        "0".into()
    } else if n.abs() < 1e-6 || n.abs() >= 1e21 {
        // JS switches to exponent form here and always signs the exponent.
        let formatted = format!("{:e}", n);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        }
    } else {
        format!("{}", n)
    }
}

/// `Number(x)`; `NaN` for anything that does not coerce.
pub fn to_js_number(operand: Operand<'_>) -> f64 {
    match operand {
        Operand::Undefined => f64::NAN,
        Operand::Json(value) => match value {
            Value::Null => 0.0,
            Value::Bool(flag) => {
                if *flag {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
            Value::String(text) => parse_js_number(text),
            Value::Array(_) => parse_js_number(&value_to_js_string(value)),
            Value::Object(_) => f64::NAN,
        },
    }
}

fn parse_js_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match trimmed.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&trimmed[2..], radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }

    // Rust accepts "inf"/"nan" spellings that JS rejects.
    let decimal_only = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !decimal_only {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}
