//! Engine values, tagged at the boundary.

use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::metadata::types::codes;

/// Storage class of a value as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Float,
    Text,
    Blob,
    Null,
}

impl ValueKind {
    /// Lower-case type name exposed through cursor column metadata.
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Blob => "blob",
            ValueKind::Null => "null",
        }
    }

    pub fn portable_code(self) -> i32 {
        match self {
            ValueKind::Integer => codes::INTEGER,
            ValueKind::Float => codes::FLOAT,
            ValueKind::Text => codes::VARCHAR,
            ValueKind::Blob => codes::BLOB,
            ValueKind::Null => codes::NULL,
        }
    }
}

/// An owned value read from an engine row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Null,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::Real(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Blob(_) => ValueKind::Blob,
            Value::Null => ValueKind::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text form; `None` for NULL.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Integer(n) => Some(n.to_string()),
            Value::Real(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
            Value::Null => None,
        }
    }

    /// Integer form following the engine's coercion: reals truncate, text
    /// contributes its leading integer prefix, NULL and blobs are 0.
    pub fn as_i64(&self) -> i64 {
        match self {
            Value::Integer(n) => *n,
            Value::Real(f) => *f as i64,
            Value::Text(s) => leading_integer(s),
            Value::Blob(_) | Value::Null => 0,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Integer(n) => *n as f64,
            Value::Real(f) => *f,
            Value::Text(s) => s.trim().parse().unwrap_or_else(|_| leading_integer(s) as f64),
            Value::Blob(_) | Value::Null => 0.0,
        }
    }

    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Value::Blob(b) => Some(b.clone()),
            Value::Text(s) => Some(s.as_bytes().to_vec()),
            Value::Null => None,
            other => other.as_string().map(String::into_bytes),
        }
    }
}

fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(n) => Value::Integer(n),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_string() {
            Some(s) => f.write_str(&s),
            None => f.write_str("NULL"),
        }
    }
}
