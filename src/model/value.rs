//! Typed attribute values.
//!
//! Every stored value carries its own discriminant, so a record read back
//! after its attribute was retyped still says what it was written as:
//!
//! ```text
//! {"type": "number", "value": 1200}
//! {"type": "date",   "value": "2024-03-01"}
//! ```
//!
//! Client input arrives as plain JSON and is converted with
//! [`AttributeValue::parse`]; output goes back as plain JSON through
//! [`AttributeValue::to_plain`].

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::types::DataType;

/// A value held under one attribute code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AttributeValue {
    Text(String),
    Number(Number),
    Date(NaiveDate),
    Boolean(bool),
    Url(String),
    Email(String),
}

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("valid regex"))
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)+$").expect("valid regex")
    })
}

/// Whether a raw input counts as "not provided": absent, `null`, or a blank string.
pub fn is_blank(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

impl AttributeValue {
    pub fn data_type(&self) -> DataType {
        match self {
            AttributeValue::Text(_) => DataType::Text,
            AttributeValue::Number(_) => DataType::Number,
            AttributeValue::Date(_) => DataType::Date,
            AttributeValue::Boolean(_) => DataType::Boolean,
            AttributeValue::Url(_) => DataType::Url,
            AttributeValue::Email(_) => DataType::Email,
        }
    }

    /// Converts client input into a value of `data_type`.
    ///
    /// No coercion across types: `"yes"` is not a boolean and `"12abc"` is not
    /// a number. Numbers may arrive as JSON numbers or as decimal strings
    /// because form inputs are strings.
    pub fn parse(data_type: DataType, raw: &Value) -> Result<AttributeValue, String> {
        match data_type {
            DataType::Text => match raw {
                Value::String(s) => Ok(AttributeValue::Text(s.clone())),
                other => Err(format!("got {}", json_type_name(other))),
            },
            DataType::Number => match raw {
                Value::Number(n) => Ok(AttributeValue::Number(n.clone())),
                Value::String(s) => parse_number(s.trim()).map(AttributeValue::Number),
                other => Err(format!("got {}", json_type_name(other))),
            },
            DataType::Date => {
                let s = expect_str(raw)?.trim();
                if !date_pattern().is_match(s) {
                    return Err(format!("'{}' is not in YYYY-MM-DD form", s));
                }
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map(AttributeValue::Date)
                    .map_err(|_| format!("'{}' is not a calendar date", s))
            }
            DataType::Boolean => match raw {
                Value::Bool(b) => Ok(AttributeValue::Boolean(*b)),
                Value::String(s) if s == "true" => Ok(AttributeValue::Boolean(true)),
                Value::String(s) if s == "false" => Ok(AttributeValue::Boolean(false)),
                Value::String(s) => Err(format!("'{}' is neither true nor false", s)),
                other => Err(format!("got {}", json_type_name(other))),
            },
            DataType::Url => {
                let s = expect_str(raw)?.trim();
                let parsed = url::Url::parse(s).map_err(|e| format!("'{}': {}", s, e))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(format!("scheme '{}' is not http or https", parsed.scheme()));
                }
                if parsed.host_str().map_or(true, str::is_empty) {
                    return Err(format!("'{}' has no host", s));
                }
                Ok(AttributeValue::Url(s.to_string()))
            }
            DataType::Email => {
                let s = expect_str(raw)?.trim();
                if !email_pattern().is_match(s) {
                    return Err(format!("'{}' is not an email address", s));
                }
                Ok(AttributeValue::Email(s.to_string()))
            }
        }
    }

    /// Best-effort typing for values outside the resolved schema.
    ///
    /// Used for detached or legacy data that is carried but not validated.
    pub fn infer(raw: &Value) -> Option<AttributeValue> {
        match raw {
            Value::Null => None,
            Value::Bool(b) => Some(AttributeValue::Boolean(*b)),
            Value::Number(n) => Some(AttributeValue::Number(n.clone())),
            Value::String(s) => Some(AttributeValue::Text(s.clone())),
            other => Some(AttributeValue::Text(other.to_string())),
        }
    }

    /// Plain JSON rendering for API responses
    pub fn to_plain(&self) -> Value {
        match self {
            AttributeValue::Text(s) | AttributeValue::Url(s) | AttributeValue::Email(s) => {
                Value::String(s.clone())
            }
            AttributeValue::Number(n) => Value::Number(n.clone()),
            AttributeValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            AttributeValue::Boolean(b) => Value::Bool(*b),
        }
    }
}

fn parse_number(s: &str) -> Result<Number, String> {
    if !decimal_pattern().is_match(s) {
        return Err(format!("'{}' is not a number", s));
    }
    if let Ok(i) = s.parse::<i64>() {
        return Ok(Number::from(i));
    }
    s.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| format!("'{}' is not a finite number", s))
}

fn expect_str(raw: &Value) -> Result<&str, String> {
    raw.as_str()
        .ok_or_else(|| format!("got {}", json_type_name(raw)))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
