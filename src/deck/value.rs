//! Typed scalar values stored in deck items.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value that is either a number or the name of a user-defined quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UdaValue {
    Number(f64),
    Name(String),
}

impl UdaValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            UdaValue::Number(n) => Some(*n),
            UdaValue::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            UdaValue::Name(s) => Some(s),
            UdaValue::Number(_) => None,
        }
    }
}

impl fmt::Display for UdaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UdaValue::Number(n) => write!(f, "{}", n),
            UdaValue::Name(s) => write!(f, "'{}'", s),
        }
    }
}

/// One element of a deck item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Double(f64),
    Str(String),
    Uda(UdaValue),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view. Integers widen to `f64`.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Int(i) => Some(*i as f64),
            Value::Uda(uda) => uda.as_number(),
            Value::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_uda(&self) -> Option<UdaValue> {
        match self {
            Value::Uda(uda) => Some(uda.clone()),
            Value::Double(d) => Some(UdaValue::Number(*d)),
            Value::Int(i) => Some(UdaValue::Number(*i as f64)),
            Value::Str(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Uda(_) => "uda",
        }
    }
}

/// Parse an integer token. Accepts a leading sign only.
pub(crate) fn parse_int(token: &str) -> Option<i64> {
    token.parse::<i64>().ok()
}

/// Parse a real token, accepting Fortran style `D` exponents.
pub(crate) fn parse_double(token: &str) -> Option<f64> {
    if let Ok(v) = token.parse::<f64>() {
        return v.is_finite().then_some(v);
    }
    if token.contains(['d', 'D']) {
        let replaced: String = token
            .chars()
            .map(|c| if c == 'd' || c == 'D' { 'e' } else { c })
            .collect();
        return replaced.parse::<f64>().ok().filter(|v| v.is_finite());
    }
    None
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{}", d),
            Value::Str(s) => write!(f, "'{}'", s),
            Value::Uda(uda) => write!(f, "{}", uda),
        }
    }
}
