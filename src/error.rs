//! Error taxonomy for the schema engine.
//!
//! Every failure is terminal for the call that raised it. Internals build an
//! [`ErrorKind`] tagged with a byte offset; the public entry points attach the
//! line/column context through [`SchemaError::locate`] before returning.

use std::fmt;

use thiserror::Error;

use crate::json_type::JsonType;
use crate::lexeme::LexKind;

pub type Result<T, E = SchemaError> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorKind {
    // ---- lexical ----
    #[error("invalid character {found:?} {context}{}", .expected.map(|e| format!(", expecting {e}")).unwrap_or_default())]
    InvalidCharacter {
        found: char,
        context: &'static str,
        expected: Option<&'static str>,
    },
    #[error("unexpected end of file {context}")]
    UnexpectedEof { context: &'static str },
    #[error("ending lexeme {close:?} does not match beginning {open:?}")]
    UnbalancedLexeme { open: Option<LexKind>, close: LexKind },
    #[error("new line is not allowed inside an inline annotation rule set")]
    NewLineInAnnotation,
    #[error("empty schema")]
    EmptySchema,

    // ---- loader ----
    #[error("annotation without example value on the same line")]
    AnnotationWithoutExample,
    #[error("annotation applies to several values on the same line")]
    AnnotationOnSeveralValues,
    #[error("duplicate key {0:?}")]
    DuplicateKey(String),
    #[error("unexpected lexeme {kind:?} {context}")]
    UnexpectedLexeme { kind: LexKind, context: &'static str },
    #[error("invalid string literal: {0}")]
    InvalidString(String),

    // ---- rule semantics ----
    #[error("unknown rule {0:?}")]
    UnknownRule(String),
    #[error("duplicate rule {0:?}")]
    DuplicateRule(String),
    #[error("rule {rule:?} is not compatible with {json_type} value")]
    IncompatibleRule { rule: &'static str, json_type: JsonType },
    #[error("invalid value of rule {rule:?}, expecting {expected}")]
    InvalidRuleValue { rule: String, expected: &'static str },
    #[error("rule {rule:?} cannot be used together with {other:?}")]
    ForbiddenCombination { rule: &'static str, other: &'static str },
    #[error("rule {rule:?} requires {required:?}")]
    RequiresRule { rule: &'static str, required: &'static str },
    #[error("an \"or\" rule cannot be applied to an example with children")]
    OrWithChildren,
    #[error("type \"any\" cannot have children")]
    AnyWithChildren,
    #[error("unknown type {0:?}")]
    UnknownType(String),
    #[error("example value of {json_type} kind does not match type {type_name:?}")]
    TypeMismatch { type_name: String, json_type: JsonType },
    #[error("value of {min_rule:?} must not exceed {max_rule:?}")]
    InvalidRange {
        min_rule: &'static str,
        max_rule: &'static str,
    },
    #[error("rule {0:?} must be zero for an empty array example")]
    EmptyArrayItems(&'static str),
    #[error("invalid regular expression: {0}")]
    InvalidRegex(String),
    #[error("rule {0:?} requires a non-empty list")]
    EmptyList(&'static str),
    #[error("invalid type name {0:?}")]
    InvalidTypeName(String),

    // ---- references ----
    #[error("type {0:?} not found")]
    TypeNotFound(String),
    #[error("enum rule {0:?} not found")]
    RuleNotFound(String),
    #[error("type {0:?} is already registered")]
    DuplicateType(String),
    #[error("type {0:?} used in \"allOf\" must be an object")]
    AllOfNotObject(String),
    #[error("recursive \"allOf\" inheritance through type {0:?}")]
    AllOfRecursion(String),
    #[error("property {key:?} inherited from {type_name:?} cannot be overridden")]
    CannotOverride { key: String, type_name: String },
    #[error("conflicting \"additionalProperties\" inherited from {0:?}")]
    AdditionalPropertiesConflict(String),

    // ---- validation ----
    #[error("{0}")]
    Violation(#[from] Violation),
}

/// A literal or document value that fails a constraint.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}{message} (rule {rule:?})", if .pointer.is_empty() { String::new() } else { format!("{}: ", .pointer) })]
pub struct Violation {
    /// JSON pointer into the validated document; empty for the root or a bare literal.
    pub pointer: String,
    pub rule: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(rule: &'static str, message: impl Into<String>) -> Self {
        Self { pointer: String::new(), rule, message: message.into() }
    }

    pub fn at(mut self, pointer: &str) -> Self {
        if self.pointer.is_empty() {
            self.pointer = pointer.to_string();
        }
        self
    }
}

/// Source position attached at a public boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: Option<String>,
    pub line: usize,
    pub column: usize,
    /// The offending source line, trimmed.
    pub quote: String,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}:{}:{}", self.line, self.column)?,
            None => write!(f, "line {}, column {}", self.line, self.column)?,
        }
        if !self.quote.is_empty() {
            write!(f, "\n    {}", self.quote)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "{kind}{}{}",
    .type_name.as_ref().map(|t| format!(" in type {t}")).unwrap_or_default(),
    .location.as_ref().map(|l| format!(" at {l}")).unwrap_or_default()
)]
pub struct SchemaError {
    kind: ErrorKind,
    offset: Option<usize>,
    /// User type whose source the offset points into.
    type_name: Option<String>,
    location: Option<Location>,
}

impl SchemaError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, offset: None, type_name: None, location: None }
    }

    /// Tags the error with a byte offset unless an inner step already did.
    pub fn at(mut self, offset: usize) -> Self {
        self.offset.get_or_insert(offset);
        self
    }

    /// Marks the error as raised inside a registered type; the innermost wins.
    pub fn in_type(mut self, name: &str) -> Self {
        self.type_name.get_or_insert_with(|| name.to_string());
        self
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Resolves the byte offset into a line/column position inside `source`.
    pub fn locate(mut self, source: &[u8], file: Option<&str>) -> Self {
        if self.location.is_some() {
            return self;
        }
        if let Some(offset) = self.offset {
            let offset = offset.min(source.len());
            let line_start = source[..offset]
                .iter()
                .rposition(|&b| b == b'\n')
                .map(|i| i + 1)
                .unwrap_or(0);
            let line_end = source[offset..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|i| offset + i)
                .unwrap_or(source.len());
            let line = source[..line_start].iter().filter(|&&b| b == b'\n').count() + 1;
            let column = String::from_utf8_lossy(&source[line_start..offset]).chars().count() + 1;
            let quote = String::from_utf8_lossy(&source[line_start..line_end]).trim().to_string();
            self.location = Some(Location { file: file.map(str::to_string), line, column, quote });
        }
        self
    }
}

impl From<ErrorKind> for SchemaError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<Violation> for SchemaError {
    fn from(violation: Violation) -> Self {
        Self::new(ErrorKind::Violation(violation))
    }
}

/// Shorthand for `Err(SchemaError::new(kind).at(offset))`.
pub(crate) fn fail<T>(kind: ErrorKind, offset: usize) -> Result<T> {
    Err(SchemaError::new(kind).at(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_reports_line_column_and_quote() {
        let src = b"{\n  \"a\": 1,\n  \"b\": x\n}";
        let offset = src.iter().position(|&b| b == b'x').unwrap();
        let err = SchemaError::new(ErrorKind::EmptySchema).at(offset).locate(src, Some("a.jschema"));
        let loc = err.location().unwrap();
        assert_eq!(loc.line, 3);
        assert_eq!(loc.column, 8);
        assert_eq!(loc.quote, "\"b\": x");
        assert!(err.to_string().contains("a.jschema:3:8"));
    }

    #[test]
    fn first_offset_wins() {
        let err = SchemaError::new(ErrorKind::EmptySchema).at(4).at(10);
        assert_eq!(err.offset(), Some(4));
    }

    #[test]
    fn innermost_type_wins() {
        let err = SchemaError::new(ErrorKind::EmptySchema).in_type("@B").in_type("@A");
        assert_eq!(err.type_name(), Some("@B"));
        assert_eq!(err.to_string(), "empty schema in type @B");
    }

    #[test]
    fn violation_message_includes_pointer() {
        let v = Violation::new("minLength", "string is too short").at("/b");
        assert_eq!(v.to_string(), "/b: string is too short (rule \"minLength\")");
    }
}
