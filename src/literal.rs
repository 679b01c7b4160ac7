//! Scalar literal values shared by example nodes, rule values and validated
//! documents.

use std::cmp::Ordering;
use std::fmt;

use ordered_float::OrderedFloat;
use serde_json::Value;

use crate::error::ErrorKind;
use crate::json_type::JsonType;

/// A JSON number kept as its source text so precision and formatting survive.
#[derive(Debug, Clone)]
pub struct Number {
    text: String,
}

impl Number {
    /// Accepts JSON number text; the scanner has already enforced the grammar
    /// for source literals, this guards the other entry points.
    pub fn parse(text: &str) -> Option<Self> {
        let body = text.strip_prefix('-').unwrap_or(text);
        let first = body.bytes().next()?;
        if !first.is_ascii_digit() || text.parse::<f64>().is_err() {
            return None;
        }
        Some(Self { text: text.to_string() })
    }

    pub fn from_u64(n: u64) -> Self {
        Self { text: n.to_string() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_integer(&self) -> bool {
        !self.text.bytes().any(|b| matches!(b, b'.' | b'e' | b'E'))
    }

    pub fn is_negative(&self) -> bool {
        self.text.starts_with('-') && self.as_f64() != 0.0
    }

    pub fn as_f64(&self) -> f64 {
        self.text.parse().unwrap_or(f64::NAN)
    }

    pub fn as_u64(&self) -> Option<u64> {
        if self.is_integer() { self.text.parse().ok() } else { None }
    }

    /// Fractional digits of the value as written: `1.5e-3` has four and
    /// `1.25e1` has one. Trailing zeros count.
    pub fn fraction_digits(&self) -> usize {
        let (mantissa, exponent) = match self.text.split_once(['e', 'E']) {
            Some((mantissa, exponent)) => (mantissa, exponent.parse::<i64>().unwrap_or(0)),
            None => (self.text.as_str(), 0),
        };
        let written = mantissa.split_once('.').map_or(0, |(_, frac)| frac.len()) as i64;
        written.saturating_sub(exponent).max(0) as usize
    }

    fn as_i128(&self) -> Option<i128> {
        if self.is_integer() { self.text.parse().ok() } else { None }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.as_i128(), other.as_i128()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => OrderedFloat(self.as_f64()).cmp(&OrderedFloat(other.as_f64())),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(Number),
    Boolean(bool),
    Null,
}

impl Literal {
    /// Decodes one literal token exactly as the scanner delimited it.
    pub fn from_token(raw: &[u8]) -> Result<Self, ErrorKind> {
        match raw.first() {
            Some(b'"') => serde_json::from_slice::<String>(raw)
                .map(Literal::String)
                .map_err(|e| ErrorKind::InvalidString(e.to_string())),
            Some(b't') if raw == b"true" => Ok(Literal::Boolean(true)),
            Some(b'f') if raw == b"false" => Ok(Literal::Boolean(false)),
            Some(b'n') if raw == b"null" => Ok(Literal::Null),
            _ => std::str::from_utf8(raw)
                .ok()
                .and_then(Number::parse)
                .map(Literal::Number)
                .ok_or_else(|| ErrorKind::InvalidString(String::from_utf8_lossy(raw).into_owned())),
        }
    }

    /// Scalar document values; arrays and objects have no literal form.
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(match value {
            Value::String(s) => Literal::String(s.clone()),
            Value::Number(n) => Literal::Number(Number::parse(&n.to_string())?),
            Value::Bool(b) => Literal::Boolean(*b),
            Value::Null => Literal::Null,
            Value::Array(_) | Value::Object(_) => return None,
        })
    }

    pub fn json_type(&self) -> JsonType {
        match self {
            Literal::String(_) => JsonType::String,
            Literal::Number(n) if n.is_integer() => JsonType::Integer,
            Literal::Number(_) => JsonType::Float,
            Literal::Boolean(_) => JsonType::Boolean,
            Literal::Null => JsonType::Null,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Literal::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// JSON text of the value.
    pub fn to_json(&self) -> String {
        match self {
            Literal::String(s) => Value::String(s.clone()).to_string(),
            Literal::Number(n) => n.to_string(),
            Literal::Boolean(b) => b.to_string(),
            Literal::Null => "null".to_string(),
        }
    }

    /// Unquoted text used for documentation scalar values.
    pub fn scalar_text(&self) -> String {
        match self {
            Literal::String(s) => s.clone(),
            other => other.to_json(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_across_notations() {
        let a = Number::parse("10").unwrap();
        let b = Number::parse("10.0").unwrap();
        let c = Number::parse("9.99").unwrap();
        assert_eq!(a, b);
        assert!(c < a);
        assert!(Number::parse("-0").map(|n| !n.is_negative()).unwrap());
    }

    #[test]
    fn large_integers_compare_exactly() {
        let a = Number::parse("9007199254740993").unwrap();
        let b = Number::parse("9007199254740992").unwrap();
        assert!(a > b);
    }

    #[test]
    fn fraction_digits_count_the_exponent() {
        assert_eq!(Number::parse("1.250").unwrap().fraction_digits(), 3);
        assert_eq!(Number::parse("1.5e3").unwrap().fraction_digits(), 0);
        assert_eq!(Number::parse("1.5e-3").unwrap().fraction_digits(), 4);
        assert_eq!(Number::parse("1.25E+1").unwrap().fraction_digits(), 1);
        assert_eq!(Number::parse("12").unwrap().fraction_digits(), 0);
    }

    #[test]
    fn tokens_decode_to_literals() {
        assert_eq!(Literal::from_token(br#""a\nb""#).unwrap(), Literal::String("a\nb".into()));
        assert_eq!(Literal::from_token(b"true").unwrap(), Literal::Boolean(true));
        assert_eq!(Literal::from_token(b"null").unwrap(), Literal::Null);
        assert_eq!(Literal::from_token(b"1.5").unwrap().json_type(), JsonType::Float);
        assert_eq!(Literal::from_token(b"-3").unwrap().json_type(), JsonType::Integer);
        assert!(Literal::from_token(b"nope").is_err());
    }

    #[test]
    fn document_values_keep_number_text() {
        let v: Value = serde_json::from_str("1.50").unwrap();
        let lit = Literal::from_value(&v).unwrap();
        assert_eq!(lit.to_json(), "1.50");
        assert!(Literal::from_value(&serde_json::json!([1])).is_none());
    }
}
