//! Rule-set reading: the `{name: value, ...}` object of an annotation and its
//! trailing text, then one constraint per rule.
use std::collections::HashSet;

use super::Loader;
use crate::constraint::{AdditionalProperties, Bound, Constraint, ConstraintKind, Pattern};
use crate::error::{ErrorKind, Result, SchemaError, fail};
use crate::lexeme::{LexEvent, LexKind};
use crate::literal::Literal;
use crate::schema::{is_known_type_name, is_user_type_name};

/// A rule value as written, before it is given rule-specific meaning.
#[derive(Debug, Clone)]
pub(super) struct RuleValue {
    pub kind: ValueKind,
    /// Offset of the value in the source, for error positions.
    pub at: usize,
    /// Text of a `//` comment following an array item.
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub(super) enum ValueKind {
    Literal(Literal),
    Shortcut(Vec<String>),
    Array(Vec<RuleValue>),
    Object(Vec<(String, RuleValue)>),
}

pub(super) struct Annotation {
    pub rules: Option<Vec<(String, RuleValue)>>,
    pub text: Option<String>,
}

impl RuleValue {
    /// A string literal or a single `@name` shortcut.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::Literal(Literal::String(s)) => Some(s),
            ValueKind::Shortcut(names) if names.len() == 1 => names.first().map(String::as_str),
            _ => None,
        }
    }

    pub fn invalid(&self, rule: &str, expected: &'static str) -> SchemaError {
        SchemaError::new(ErrorKind::InvalidRuleValue { rule: rule.to_string(), expected }).at(self.at)
    }
}

impl Loader<'_> {
    /// Reads everything up to the annotation's end event.
    pub(super) fn read_annotation(&mut self, begin: LexEvent) -> Result<Annotation> {
        let end_kind = begin.kind.closing();
        let mut annotation = Annotation { rules: None, text: None };
        loop {
            let event = self.expect_event("in an annotation")?;
            match event.kind {
                kind if Some(kind) == end_kind => return Ok(annotation),
                LexKind::ObjectBegin if annotation.rules.is_none() => {
                    annotation.rules = Some(self.read_object()?);
                }
                LexKind::InlineAnnotationTextBegin | LexKind::MultiLineAnnotationTextBegin => {}
                LexKind::InlineAnnotationTextEnd | LexKind::MultiLineAnnotationTextEnd => {
                    annotation.text = note(event, self.src);
                }
                LexKind::InlineAnnotationBegin => {
                    self.read_nested_comment()?;
                }
                kind => {
                    return fail(ErrorKind::UnexpectedLexeme { kind, context: "in an annotation" }, event.begin);
                }
            }
        }
    }

    fn read_value(&mut self, first: LexEvent) -> Result<RuleValue> {
        let kind = match first.kind {
            LexKind::LiteralBegin => {
                let end = self.expect_event("in a rule value")?;
                ValueKind::Literal(self.literal(end)?)
            }
            LexKind::TypesShortcutBegin => {
                let end = self.expect_event("in a rule value")?;
                ValueKind::Shortcut(shortcut_names(&end.text(self.src)))
            }
            LexKind::ObjectBegin => ValueKind::Object(self.read_object()?),
            LexKind::ArrayBegin => ValueKind::Array(self.read_array()?),
            kind => return fail(ErrorKind::UnexpectedLexeme { kind, context: "in a rule value" }, first.begin),
        };
        Ok(RuleValue { kind, at: first.begin, comment: None })
    }

    fn read_object(&mut self) -> Result<Vec<(String, RuleValue)>> {
        let mut entries = Vec::new();
        let mut key: Option<String> = None;
        loop {
            let event = self.expect_event("in a rule set")?;
            match event.kind {
                LexKind::ObjectKeyBegin | LexKind::ObjectValueEnd => {}
                LexKind::ObjectKeyEnd => key = Some(self.rule_key(event)?),
                LexKind::ObjectValueBegin => {
                    let first = self.expect_event("in a rule value")?;
                    let value = self.read_value(first)?;
                    let Some(name) = key.take() else {
                        return fail(ErrorKind::UnexpectedLexeme { kind: event.kind, context: "without a rule name" }, event.begin);
                    };
                    entries.push((name, value));
                }
                LexKind::ObjectEnd => return Ok(entries),
                LexKind::InlineAnnotationBegin => {
                    self.read_nested_comment()?;
                }
                kind => return fail(ErrorKind::UnexpectedLexeme { kind, context: "in a rule set" }, event.begin),
            }
        }
    }

    /// Array items; a `//` comment after an item becomes that item's comment.
    fn read_array(&mut self) -> Result<Vec<RuleValue>> {
        let mut items: Vec<RuleValue> = Vec::new();
        loop {
            let event = self.expect_event("in a rule value list")?;
            match event.kind {
                LexKind::ArrayItemBegin => {
                    let first = self.expect_event("in a rule value list")?;
                    items.push(self.read_value(first)?);
                }
                LexKind::ArrayItemEnd => {}
                LexKind::ArrayEnd => return Ok(items),
                LexKind::InlineAnnotationBegin => {
                    let comment = self.read_nested_comment()?;
                    if let Some(last) = items.last_mut().filter(|item| item.comment.is_none()) {
                        last.comment = comment;
                    }
                }
                kind => return fail(ErrorKind::UnexpectedLexeme { kind, context: "in a rule value list" }, event.begin),
            }
        }
    }

    fn read_nested_comment(&mut self) -> Result<Option<String>> {
        let mut text = None;
        loop {
            let event = self.expect_event("in an annotation comment")?;
            match event.kind {
                LexKind::InlineAnnotationEnd => return Ok(text),
                LexKind::InlineAnnotationTextBegin => {}
                LexKind::InlineAnnotationTextEnd => text = note(event, self.src),
                kind => return fail(ErrorKind::UnexpectedLexeme { kind, context: "in an annotation comment" }, event.begin),
            }
        }
    }

    fn rule_key(&self, event: LexEvent) -> Result<String> {
        let raw = event.bytes(self.src);
        if raw.first() != Some(&b'"') {
            return Ok(String::from_utf8_lossy(raw).into_owned());
        }
        match self.literal(event)? {
            Literal::String(name) => Ok(name),
            other => fail(ErrorKind::InvalidString(other.to_json()), event.begin),
        }
    }

    // ---------------------------- Interpretation ---------------------------- //

    /// Turns a rule set into constraints, each tagged with its source offset.
    pub(super) fn rule_constraints(&mut self, entries: Vec<(String, RuleValue)>) -> Result<Vec<(Constraint, usize)>> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(entries.len());
        for (name, value) in entries {
            let at = value.at;
            if !seen.insert(name.clone()) {
                return fail(ErrorKind::DuplicateRule(name), at);
            }
            let Some(kind) = ConstraintKind::from_rule_name(&name) else {
                return fail(ErrorKind::UnknownRule(name), at);
            };
            match kind {
                ConstraintKind::Or => {
                    let (list, or) = self.or_rule(&value)?;
                    out.push((list, at));
                    out.push((or, at));
                }
                ConstraintKind::Enum => out.push((self.enum_rule(&value)?, at)),
                ConstraintKind::AllOf => out.push((all_of_rule(&value)?, at)),
                _ => out.push((literal_rule(kind, &value)?, at)),
            }
        }
        Ok(out)
    }
}

/// Rules whose value is a single literal or type name.
pub(super) fn literal_rule(kind: ConstraintKind, value: &RuleValue) -> Result<Constraint> {
    let rule = kind.name();
    let literal = match &value.kind {
        ValueKind::Literal(lit) => Some(lit),
        _ => None,
    };
    let count = || {
        literal
            .and_then(Literal::as_number)
            .and_then(|n| n.as_u64())
            .ok_or_else(|| value.invalid(rule, "a non-negative integer"))
    };
    let flag = || literal.and_then(Literal::as_bool).ok_or_else(|| value.invalid(rule, "true or false"));
    Ok(match kind {
        ConstraintKind::Type => {
            let name = value.as_name().ok_or_else(|| value.invalid(rule, "a type name"))?;
            if !is_known_type_name(name) {
                return fail(ErrorKind::InvalidTypeName(name.to_string()), value.at);
            }
            Constraint::Type(name.to_string())
        }
        ConstraintKind::MinLength => Constraint::MinLength(count()?),
        ConstraintKind::MaxLength => Constraint::MaxLength(count()?),
        ConstraintKind::MinItems => Constraint::MinItems(count()?),
        ConstraintKind::MaxItems => Constraint::MaxItems(count()?),
        ConstraintKind::Precision => match count()? {
            0 => return Err(value.invalid(rule, "a positive integer")),
            n => Constraint::Precision(n),
        },
        ConstraintKind::Min | ConstraintKind::Max => {
            let n = literal.and_then(Literal::as_number).ok_or_else(|| value.invalid(rule, "a number"))?;
            let bound = Bound::new(n.clone());
            if kind == ConstraintKind::Min { Constraint::Min(bound) } else { Constraint::Max(bound) }
        }
        ConstraintKind::ExclusiveMinimum => Constraint::ExclusiveMinimum(flag()?),
        ConstraintKind::ExclusiveMaximum => Constraint::ExclusiveMaximum(flag()?),
        ConstraintKind::Optional => Constraint::Optional(flag()?),
        ConstraintKind::Nullable => Constraint::Nullable(flag()?),
        ConstraintKind::Const => Constraint::Const(flag()?),
        ConstraintKind::Regex => {
            let source = literal.and_then(Literal::as_str).ok_or_else(|| value.invalid(rule, "a string"))?;
            let pattern = Pattern::new(source).map_err(|e| SchemaError::new(ErrorKind::InvalidRegex(e.to_string())).at(value.at))?;
            Constraint::Regex(pattern)
        }
        ConstraintKind::AdditionalProperties => {
            let ap = match literal.and_then(Literal::as_bool) {
                Some(b) => AdditionalProperties::Allowed(b),
                None => {
                    let name = value.as_name().ok_or_else(|| value.invalid(rule, "a boolean or a type name"))?;
                    if !is_known_type_name(name) || matches!(name, "mixed" | "enum") {
                        return fail(ErrorKind::InvalidTypeName(name.to_string()), value.at);
                    }
                    AdditionalProperties::Type(name.to_string())
                }
            };
            Constraint::AdditionalProperties(ap)
        }
        _ => return fail(ErrorKind::UnknownRule(rule.to_string()), value.at),
    })
}

/// `allOf: "@A"` or `allOf: ["@A", "@B"]`.
fn all_of_rule(value: &RuleValue) -> Result<Constraint> {
    super::all_of::type_names(value).map(Constraint::AllOf)
}

/// Names of a `@a | @b` shortcut.
pub(super) fn shortcut_names(text: &str) -> Vec<String> {
    text.split('|').map(|name| name.trim().to_string()).filter(|name| !name.is_empty()).collect()
}

/// Checks that a referenced name is a user type (`@Name`).
pub(super) fn user_type_name(value: &RuleValue, name: &str) -> Result<String> {
    if is_user_type_name(name) {
        Ok(name.to_string())
    } else {
        fail(ErrorKind::InvalidTypeName(name.to_string()), value.at)
    }
}

/// Trimmed annotation text; blank text is no text.
fn note(event: LexEvent, src: &[u8]) -> Option<String> {
    let text = event.text(src);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
