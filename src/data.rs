use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::schema::ColumnType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
        }
    }

    /// Numeric view of the value; text cells count as 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::String(_) => 0.0,
            Value::Integer(i) => *i as f64,
            Value::Float(f) => *f,
        }
    }

    pub fn sort_cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            _ => self.as_f64().total_cmp(&other.as_f64()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::from(0)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Best-effort numeric parse with an explicit was-defaulted flag.
///
/// Malformed or empty cells never fail; they yield the column default and a
/// `true` flag so callers can log or count the substitution.
pub fn parse_numeric_or_default(raw: &str, datatype: &ColumnType, default: Value) -> (Value, bool) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return (default, true);
    }
    match datatype {
        ColumnType::Integer => {
            if let Ok(parsed) = trimmed.parse::<i64>() {
                (Value::Integer(parsed), false)
            } else if let Ok(parsed) = trimmed.parse::<f64>() {
                (Value::Integer(parsed.trunc() as i64), false)
            } else {
                (default, true)
            }
        }
        ColumnType::Float => match trimmed.parse::<f64>() {
            Ok(parsed) => (Value::Float(parsed), false),
            Err(_) => (default, true),
        },
        ColumnType::String => (Value::String(trimmed.to_string()), false),
    }
}

/// Folds a name for matching: trims, strips diacritics via NFD
/// decomposition, and lowercases. Applied identically to stored values and
/// queries so `"José"` matches `"jose"` and `"JOSE "`.
pub fn fold_name(value: &str) -> String {
    value
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
