//! String formats behind the `email`, `uri`, `uuid`, `date` and `datetime`
//! types, plus compiled `regex` rules.
use std::fmt;

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("static email pattern")
});

static URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:[^\s]+$").expect("static uri pattern"));

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:urn:uuid:)?[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}$")
        .expect("static uuid pattern")
});

pub fn is_email(s: &str) -> bool {
    EMAIL.is_match(s)
}

pub fn is_uri(s: &str) -> bool {
    URI.is_match(s)
}

pub fn is_uuid(s: &str) -> bool {
    UUID.is_match(s)
}

/// Full date, `YYYY-MM-DD`.
pub fn is_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// RFC 3339 date-time with offset.
pub fn is_datetime(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
}

/// A compiled `regex` rule. Equality is by source text.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self { source: source.to_string(), regex: Regex::new(source)? })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats() {
        assert!(is_email("user@example.com"));
        assert!(!is_email("user@localhost"));
        assert!(!is_email("not an email"));
        assert!(is_uri("https://example.com/a?b=c"));
        assert!(is_uri("mailto:someone@example.com"));
        assert!(!is_uri("/relative/path"));
        assert!(is_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_uuid("550e8400e29b41d4a716446655440000"));
        assert!(is_date("2021-02-28"));
        assert!(!is_date("2021-02-30"));
        assert!(!is_date("2021-2-3"));
        assert!(is_datetime("2021-02-28T10:00:00Z"));
        assert!(is_datetime("2021-02-28T10:00:00.5+03:00"));
        assert!(!is_datetime("2021-02-28 10:00"));
    }

    #[test]
    fn pattern_search_is_unanchored() {
        let p = Pattern::new("[0-9]+").unwrap();
        assert!(p.is_match("abc123"));
        assert!(!p.is_match("abc"));
        assert!(Pattern::new("(").is_err());
    }
}
