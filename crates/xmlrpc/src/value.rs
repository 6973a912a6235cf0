//! XML-RPC value model.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::NaiveDateTime;
use serde_json::json;

/// Wire format of `<dateTime.iso8601>` as produced by most servers.
pub const DATETIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";

/// A single XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `<int>` / `<i4>`.
    Int(i32),
    /// `<i8>`, the 64-bit extension used by Apache XML-RPC servers.
    I8(i64),
    Boolean(bool),
    /// `<string>`, or untyped text directly inside `<value>`.
    String(String),
    Double(f64),
    DateTime(NaiveDateTime),
    Base64(Vec<u8>),
    Array(Vec<Value>),
    Struct(BTreeMap<String, Value>),
    /// `<nil/>` extension.
    Nil,
}

impl Value {
    /// Numeric view of integer and double values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(f64::from(*n)),
            Value::I8(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Integer view of `<int>` and `<i8>` values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(i64::from(*n)),
            Value::I8(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    /// Convert into the JSON shape handed to tool callers.
    ///
    /// Dates render as ISO 8601 strings, binary data as standard base64,
    /// `<nil/>` and non-finite doubles as `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int(n) => json!(n),
            Value::I8(n) => json!(n),
            Value::Boolean(b) => json!(b),
            Value::String(s) => json!(s),
            Value::Double(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::DateTime(dt) => json!(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Value::Base64(bytes) => json!(BASE64.encode(bytes)),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Struct(members) => serde_json::Value::Object(
                members
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
            Value::Nil => serde_json::Value::Null,
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        value.to_json()
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::I8(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Double(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(members: BTreeMap<String, Value>) -> Self {
        Self::Struct(members)
    }
}

/// Parse the text of a `<dateTime.iso8601>` element.
///
/// Accepts the compact wire form and the dashed ISO 8601 variant some
/// servers emit.
pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y%m%dT%H%M%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

pub(crate) fn decode_base64(text: &str) -> Option<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64.decode(compact).ok()
}

pub(crate) fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_to_json() {
        assert_eq!(Value::Int(42).to_json(), json!(42));
        assert_eq!(Value::I8(1 << 40).to_json(), json!(1i64 << 40));
        assert_eq!(Value::Double(12.5).to_json(), json!(12.5));
        assert_eq!(Value::Double(f64::NAN).to_json(), serde_json::Value::Null);
        assert_eq!(Value::Nil.to_json(), serde_json::Value::Null);
        assert_eq!(Value::Base64(b"hi".to_vec()).to_json(), json!("aGk="));
    }

    #[test]
    fn datetime_renders_dashed() {
        let dt = parse_datetime("20240315T08:30:00").unwrap();
        assert_eq!(Value::DateTime(dt).to_json(), json!("2024-03-15T08:30:00"));
        assert_eq!(parse_datetime("2024-03-15T08:30:00"), Some(dt));
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn nested_to_json() {
        let mut members = BTreeMap::new();
        members.insert("name".to_string(), Value::from("laser-1"));
        members.insert("pages".to_string(), Value::from(vec![1i32, 2]));
        let json = Value::Struct(members).to_json();
        assert_eq!(json, json!({"name": "laser-1", "pages": [1, 2]}));
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::I8(7).as_i64(), Some(7));
        assert_eq!(Value::from("7").as_f64(), None);
    }

    #[test]
    fn base64_ignores_line_breaks() {
        assert_eq!(decode_base64("aG\n  k=").unwrap(), b"hi");
        assert!(decode_base64("***").is_none());
    }
}
