use core::fmt;
use std::collections::HashMap;

use rust_decimal::Decimal;

/// Variable name to bound value, built fresh for every statement.
pub type Bindings = HashMap<String, Value>;

// 値の型システム
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Number(Decimal),
    /// Raw text, only meaningful as the argument of `len`.
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Value {
    /// Numeric view of the value. Text that leaks into arithmetic counts as its
    /// number of characters.
    pub fn to_decimal(&self) -> Decimal {
        match self {
            Value::Number(n) => *n,
            Value::Text(_) => self.char_count(),
        }
    }

    /// Characters in the value's text form; numbers use their decimal rendering.
    pub fn char_count(&self) -> Decimal {
        let count = match self {
            Value::Text(s) => s.chars().count(),
            Value::Number(n) => n.to_string().chars().count(),
        };
        Decimal::from(count)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Decimal::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}
