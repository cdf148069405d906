//! Coercion of loosely-typed numeric fields.
//!
//! The remote API sends ages and temperatures either as JSON numbers or as
//! numeric strings (sometimes with trailing units). Strings are read with
//! leading-number semantics: leading whitespace is skipped and the longest
//! numeric prefix wins, so `"101.2 F"` reads as `101.2`.

use serde_json::Value;

/// Outcome of reading a number out of an untrusted field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced {
    Number(f64),
    /// Absent, `null`, or the empty string.
    Missing,
    /// Present but not readable as a number.
    Invalid,
}

impl Coerced {
    pub fn number(self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n),
            Self::Missing | Self::Invalid => None,
        }
    }
}

/// Read a decimal value (temperature).
pub fn coerce_decimal(value: &Value) -> Coerced {
    coerce_with(value, leading_decimal)
}

/// Read an integer value (age). Strings are truncated at the first
/// non-digit, JSON numbers are kept as-is.
pub fn coerce_integer(value: &Value) -> Coerced {
    coerce_with(value, leading_integer)
}

fn coerce_with(value: &Value, parse: fn(&str) -> Option<f64>) -> Coerced {
    match value {
        Value::Null => Coerced::Missing,
        Value::String(s) if s.is_empty() => Coerced::Missing,
        Value::String(s) => parse(s).map_or(Coerced::Invalid, Coerced::Number),
        Value::Number(n) => n.as_f64().map_or(Coerced::Invalid, Coerced::Number),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Coerced::Invalid,
    }
}

/// Longest leading integer of `raw`, e.g. `" 45 years"` → `45`.
pub fn leading_integer(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let end = sign + count_digits(&bytes[sign..]);
    if end == sign {
        return None;
    }
    s[..end].parse::<f64>().ok()
}

/// Longest leading decimal of `raw`, e.g. `"99.8°F"` → `99.8`.
pub fn leading_decimal(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));

    let int_digits = count_digits(&bytes[sign..]);
    let mut end = sign + int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end.min(bytes.len())..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    let mut literal = String::with_capacity(end + 1);
    literal.push_str(&s[..sign]);
    if int_digits == 0 {
        literal.push('0');
    }
    literal.push_str(&s[sign..end]);
    literal.parse::<f64>().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
