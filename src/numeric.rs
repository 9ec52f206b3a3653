//! # Numeric normalization
//!
//! External sources encode "no data" in many ways: `null`, `"unknown"`, `"n/a"`, a lone
//! dash. They also attach units and separators (`"1,000 km"`). [`normalize`] is the single
//! point where all of that becomes either an exact [`Decimal`] or `None`, so the rest of
//! the crate only reasons about "value present" and "value absent".
//!
//! Binary floating point never takes part in the conversion: floats are converted through
//! their shortest decimal string.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

/// Strings that stand for a missing value (compared after trimming and lowercasing).
pub const ABSENT_SENTINELS: [&str; 5] = ["unknown", "n/a", "none", "null", "-"];

lazy_static! {
    static ref NON_NUMERIC: Regex = Regex::new(r"[^0-9.\-]").unwrap();
}

/// A scalar as received from an external collaborator, before normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    #[default]
    Null,
    Decimal(Decimal),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&serde_json::Value> for RawValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::String(s) => RawValue::Text(s.clone()),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RawValue::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    RawValue::Decimal(Decimal::from(u))
                } else {
                    n.as_f64().map(RawValue::Float).unwrap_or_default()
                }
            }
            other => RawValue::Text(other.to_string()),
        }
    }
}

impl From<Decimal> for RawValue {
    fn from(value: Decimal) -> Self {
        RawValue::Decimal(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

/// Converts an external value into an exact decimal, or `None` when it carries no data.
pub fn normalize(raw: &RawValue) -> Option<Decimal> {
    match raw {
        RawValue::Null => None,
        RawValue::Decimal(d) => Some(*d),
        RawValue::Integer(i) => Some(Decimal::from(*i)),
        RawValue::Float(f) => normalize_float(*f),
        RawValue::Text(s) => normalize_str(s),
    }
}

fn normalize_float(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    parse_decimal(&value.to_string())
}

/// Normalizes free text such as `"172"`, `"1,358 kg"` or `"unknown"`.
pub fn normalize_str(raw: &str) -> Option<Decimal> {
    let lowered = raw.trim().to_lowercase();
    if ABSENT_SENTINELS.contains(&lowered.as_str()) {
        return None;
    }
    let cleaned = NON_NUMERIC.replace_all(&lowered, "");
    match cleaned.as_ref() {
        "" | "." | "-" | "-." => None,
        digits => parse_decimal(digits),
    }
}

/// Parses a plain decimal literal, tolerating a bare leading or trailing point
/// (`".5"`, `"5."`) and an optional exponent (`"1.5e3"`).
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(at) => (&text[..at], Some(&text[at + 1..])),
        None => (text, None),
    };

    let (negative, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (digits, ""),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    let mut canonical = String::with_capacity(text.len() + 2);
    if negative {
        canonical.push('-');
    }
    canonical.push_str(if int_part.is_empty() { "0" } else { int_part });
    if !frac_part.is_empty() {
        canonical.push('.');
        canonical.push_str(frac_part);
    }

    match exponent {
        None => Decimal::from_str(&canonical).ok(),
        Some(exp) => {
            let (sign, exp_digits) = match exp.strip_prefix('-') {
                Some(rest) => ("-", rest),
                None => ("", exp.strip_prefix('+').unwrap_or(exp)),
            };
            if exp_digits.is_empty() || !all_digits(exp_digits) {
                return None;
            }
            Decimal::from_scientific(&format!("{}e{}{}", canonical, sign, exp_digits)).ok()
        }
    }
}
