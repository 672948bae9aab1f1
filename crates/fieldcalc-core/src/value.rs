//! Runtime value types
//!
//! [`Value`] is what bindings supply and what evaluation produces. It is an
//! explicit tagged union; the only implicit conversions are the ones exposed
//! as methods here ([`Value::as_number`], [`Value::is_truthy`], the
//! `Display` stringification), so callers always opt in to coercion.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Date formats accepted when a text value is used where a date is expected
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// A dynamically-typed value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// Absent value (JSON `null`, an unset field)
    Null,

    /// Boolean value
    Boolean(bool),

    /// Numeric value (all numbers stored as f64)
    Number(f64),

    /// Text value
    Text(SharedString),

    /// Date/time value without a time zone
    Date(NaiveDateTime),

    /// Ordered list of values
    List(Vec<Value>),

    /// Structured value, addressed with dotted identifiers (`user.name`)
    Object(BTreeMap<String, Value>),
}

/// Coarse static type of a value, shared by field declarations and the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Number,
    Text,
    Boolean,
    Date,
    /// Unknown or structured; compatible with every parameter type
    Any,
}

impl ValueType {
    /// Lower-case name used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::Text => "text",
            ValueType::Boolean => "boolean",
            ValueType::Date => "datetime",
            ValueType::Any => "any",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    /// Create a new text value
    pub fn text<S: AsRef<str>>(s: S) -> Self {
        Value::Text(SharedString::new(s))
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Date(_) => "datetime",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Coarse static type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Boolean(_) => ValueType::Boolean,
            Value::Number(_) => ValueType::Number,
            Value::Text(_) => ValueType::Text,
            Value::Date(_) => ValueType::Date,
            Value::Null | Value::List(_) | Value::Object(_) => ValueType::Any,
        }
    }

    /// Try to get the value as a number
    ///
    /// Numbers are returned as-is and text is parsed as a float after
    /// trimming. Everything else, including text that does not parse to a
    /// finite number, yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => parse_number(s.as_str()),
            _ => None,
        }
    }

    /// Try to get the value as a string slice (text values only)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to get the value as a date, parsing date-looking text
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Text(s) => parse_date(s.as_str()),
            _ => None,
        }
    }

    /// Truthiness used by IF/AND/OR/NOT
    ///
    /// `false`, `0`, NaN, empty text and null are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::Date(_) | Value::List(_) | Value::Object(_) => true,
        }
    }

    /// Emptiness used by ISEMPTY: null, empty text, empty list, empty object
    pub fn is_empty_value(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Loose equality
    ///
    /// Values of the same type compare structurally. A number compared with
    /// numeric-looking text compares numerically. Any other mix is unequal.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(n), Value::Text(s)) | (Value::Text(s), Value::Number(n)) => {
                parse_number(s.as_str()).map_or(false, |m| m == *n)
            }
            _ => self == other,
        }
    }

    /// Look up a member of an object value
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Walk a dotted path (`"address.city"`) through nested objects
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(self, |current, segment| current.get(segment))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s.as_str()),
            Value::Date(d) => f.write_str(&format_date(d)),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Object(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Format a number the way formulas display it: integers without a
/// fractional part, everything else in shortest round-trip form
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Format a date: date-only when the time is midnight
pub fn format_date(d: &NaiveDateTime) -> String {
    if d.time() == NaiveTime::MIN {
        d.format("%Y-%m-%d").to_string()
    } else {
        d.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Parse numeric text; rejects empty and non-finite input
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse date-looking text in one of the accepted layouts
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::text(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d.and_time(NaiveTime::MIN))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Object(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Shared immutable string
///
/// Bindings are often reused across many evaluations (one formula, many rows),
/// so text is stored as `Arc<str>` and cloned without copying.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SharedString(Arc<str>);

impl SharedString {
    /// Create a new shared string
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        SharedString(Arc::from(s.as_ref()))
    }

    /// Get the string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the string is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SharedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString::new(s)
    }
}

impl From<String> for SharedString {
    fn from(s: String) -> Self {
        SharedString::new(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for SharedString {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for SharedString {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(SharedString::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(42), Value::Number(42.0));
        assert_eq!(Value::from(3.14), Value::Number(3.14));
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(None::<f64>), Value::Null);

        let s = Value::from("hello");
        assert_eq!(s.as_str(), Some("hello"));
        assert_eq!(Value::from(true).as_str(), None);

        let shared = SharedString::new("");
        assert!(shared.is_empty());
        assert_eq!(Value::Text(shared).value_type(), ValueType::Text);
    }

    #[test]
    fn test_value_as_number() {
        assert_eq!(Value::Number(42.0).as_number(), Some(42.0));
        assert_eq!(Value::text(" 10 ").as_number(), Some(10.0));
        assert_eq!(Value::text("1.5").as_number(), Some(1.5));
        assert_eq!(Value::text("hello").as_number(), None);
        assert_eq!(Value::text("").as_number(), None);
        assert_eq!(Value::text("inf").as_number(), None);
        assert_eq!(Value::Boolean(true).as_number(), None);
        assert_eq!(Value::Null.as_number(), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Boolean(true).is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(!Value::text("").is_truthy());
        assert!(Value::text("0").is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Value::Object(BTreeMap::new()).is_truthy());
    }

    #[test]
    fn test_empty_values() {
        assert!(Value::Null.is_empty_value());
        assert!(Value::text("").is_empty_value());
        assert!(Value::List(vec![]).is_empty_value());
        assert!(Value::Object(BTreeMap::new()).is_empty_value());
        assert!(!Value::text(" ").is_empty_value());
        assert!(!Value::Number(0.0).is_empty_value());
        assert!(!Value::Boolean(false).is_empty_value());
    }

    #[test]
    fn test_loose_eq() {
        assert!(Value::Number(10.0).loose_eq(&Value::text("10")));
        assert!(Value::text("10.0").loose_eq(&Value::Number(10.0)));
        assert!(!Value::Number(10.0).loose_eq(&Value::text("ten")));
        assert!(!Value::Number(0.0).loose_eq(&Value::text("")));
        assert!(Value::text("hello").loose_eq(&Value::text("hello")));
        assert!(!Value::Boolean(true).loose_eq(&Value::Number(1.0)));
        assert!(Value::Null.loose_eq(&Value::Null));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(7.0).to_string(), "7");
        assert_eq!(Value::Number(7.5).to_string(), "7.5");
        assert_eq!(Value::Number(-0.25).to_string(), "-0.25");
        assert_eq!(Value::Boolean(false).to_string(), "false");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(
            Value::List(vec![Value::from(1), Value::from("a")]).to_string(),
            "1,a"
        );

        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(Value::from(date).to_string(), "2024-03-05");
        let dt = date.and_hms_opt(8, 30, 0).unwrap();
        assert_eq!(Value::from(dt).to_string(), "2024-03-05 08:30:00");
    }

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_date("2024-01-31"), Some(expected));
        assert_eq!(parse_date("2024/01/31"), Some(expected));
        assert_eq!(parse_date("2024-01-31 00:00:00"), Some(expected));
        assert_eq!(parse_date("2024-01-31T00:00:00+08:00"), Some(expected));
        assert_eq!(parse_date("31 Jan"), None);
    }

    #[test]
    fn test_get_path() {
        let mut address = BTreeMap::new();
        address.insert("city".to_string(), Value::from("杭州"));
        let mut user = BTreeMap::new();
        user.insert("address".to_string(), Value::Object(address));
        let user = Value::Object(user);

        assert_eq!(user.get_path("address.city"), Some(&Value::from("杭州")));
        assert_eq!(user.get_path("address.zip"), None);
        assert_eq!(user.get_path("address.city.name"), None);
    }
}
