//! Rules attached to example nodes.
//!
//! A node holds at most one [`Constraint`] per [`ConstraintKind`], kept in
//! insertion order. Each kind knows which JSON types it applies to, how to
//! check a literal against itself and how it appears in documentation.
pub mod ast;
pub mod enums;
pub mod format;
pub mod numeric;
pub mod types_list;

use indexmap::IndexMap;

use crate::error::{ErrorKind, Violation};
use crate::json_type::JsonType;
use crate::literal::Literal;

pub use ast::{RuleAst, TokenType};
pub use enums::{EnumItem, EnumRule};
pub use format::Pattern;
pub use numeric::Bound;
pub use types_list::{AdditionalProperties, RuleSource, TypeItem, TypesList};

// ————————————————————————————————————————————————————————————————————————————
// KINDS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintKind {
    Type,
    TypesList,
    Or,
    Min,
    Max,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MinLength,
    MaxLength,
    MinItems,
    MaxItems,
    Precision,
    Decimal,
    Optional,
    Nullable,
    Regex,
    Const,
    Enum,
    AllOf,
    AdditionalProperties,
    RequiredKeys,
    Email,
    Uri,
    Uuid,
    Date,
    DateTime,
    Any,
}

impl ConstraintKind {
    pub fn name(self) -> &'static str {
        use ConstraintKind::*;
        match self {
            Type => "type",
            TypesList => "types",
            Or => "or",
            Min => "min",
            Max => "max",
            ExclusiveMinimum => "exclusiveMinimum",
            ExclusiveMaximum => "exclusiveMaximum",
            MinLength => "minLength",
            MaxLength => "maxLength",
            MinItems => "minItems",
            MaxItems => "maxItems",
            Precision => "precision",
            Decimal => "decimal",
            Optional => "optional",
            Nullable => "nullable",
            Regex => "regex",
            Const => "const",
            Enum => "enum",
            AllOf => "allOf",
            AdditionalProperties => "additionalProperties",
            RequiredKeys => "requiredKeys",
            Email => "email",
            Uri => "uri",
            Uuid => "uuid",
            Date => "date",
            DateTime => "datetime",
            Any => "any",
        }
    }

    /// Kinds an author may write in a rule set, by rule name.
    pub fn from_rule_name(name: &str) -> Option<Self> {
        use ConstraintKind::*;
        Some(match name {
            "type" => Type,
            "or" => Or,
            "min" => Min,
            "max" => Max,
            "exclusiveMinimum" => ExclusiveMinimum,
            "exclusiveMaximum" => ExclusiveMaximum,
            "minLength" => MinLength,
            "maxLength" => MaxLength,
            "minItems" => MinItems,
            "maxItems" => MaxItems,
            "precision" => Precision,
            "optional" => Optional,
            "nullable" => Nullable,
            "regex" => Regex,
            "const" => Const,
            "enum" => Enum,
            "allOf" => AllOf,
            "additionalProperties" => AdditionalProperties,
            _ => return None,
        })
    }

    /// Whether the kind may sit on a node of the given JSON type. `Mixed`
    /// nodes only accept kinds that need no example.
    pub fn is_compatible(self, json_type: JsonType) -> bool {
        use ConstraintKind::*;
        match self {
            Type | TypesList | Or | Optional | Nullable | Any => true,
            Enum => json_type.is_scalar() || json_type == JsonType::Mixed,
            Const => json_type.is_scalar(),
            Min | Max | ExclusiveMinimum | ExclusiveMaximum | Precision | Decimal => json_type.is_number(),
            MinLength | MaxLength | Regex | Email | Uri | Uuid | Date | DateTime => json_type == JsonType::String,
            MinItems | MaxItems => json_type == JsonType::Array,
            AllOf | AdditionalProperties | RequiredKeys => json_type == JsonType::Object,
        }
    }

    pub fn is_format(self) -> bool {
        use ConstraintKind::*;
        matches!(self, Email | Uri | Uuid | Date | DateTime)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRAINTS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Base name (`"string"`), special name (`"email"`) or user type (`"@Cat"`).
    Type(String),
    TypesList(TypesList),
    Or(RuleSource),
    Min(Bound),
    Max(Bound),
    ExclusiveMinimum(bool),
    ExclusiveMaximum(bool),
    MinLength(u64),
    MaxLength(u64),
    MinItems(u64),
    MaxItems(u64),
    Precision(u64),
    Decimal,
    Optional(bool),
    Nullable(bool),
    Regex(Pattern),
    Const(bool),
    Enum(EnumRule),
    AllOf(Vec<String>),
    AdditionalProperties(AdditionalProperties),
    RequiredKeys(Vec<String>),
    Email,
    Uri,
    Uuid,
    Date,
    DateTime,
    Any,
}

impl Constraint {
    pub fn kind(&self) -> ConstraintKind {
        use ConstraintKind as K;
        match self {
            Constraint::Type(_) => K::Type,
            Constraint::TypesList(_) => K::TypesList,
            Constraint::Or(_) => K::Or,
            Constraint::Min(_) => K::Min,
            Constraint::Max(_) => K::Max,
            Constraint::ExclusiveMinimum(_) => K::ExclusiveMinimum,
            Constraint::ExclusiveMaximum(_) => K::ExclusiveMaximum,
            Constraint::MinLength(_) => K::MinLength,
            Constraint::MaxLength(_) => K::MaxLength,
            Constraint::MinItems(_) => K::MinItems,
            Constraint::MaxItems(_) => K::MaxItems,
            Constraint::Precision(_) => K::Precision,
            Constraint::Decimal => K::Decimal,
            Constraint::Optional(_) => K::Optional,
            Constraint::Nullable(_) => K::Nullable,
            Constraint::Regex(_) => K::Regex,
            Constraint::Const(_) => K::Const,
            Constraint::Enum(_) => K::Enum,
            Constraint::AllOf(_) => K::AllOf,
            Constraint::AdditionalProperties(_) => K::AdditionalProperties,
            Constraint::RequiredKeys(_) => K::RequiredKeys,
            Constraint::Email => K::Email,
            Constraint::Uri => K::Uri,
            Constraint::Uuid => K::Uuid,
            Constraint::Date => K::Date,
            Constraint::DateTime => K::DateTime,
            Constraint::Any => K::Any,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Format marker for a special type name.
    pub fn format(type_name: &str) -> Option<Self> {
        Some(match type_name {
            "email" => Constraint::Email,
            "uri" => Constraint::Uri,
            "uuid" => Constraint::Uuid,
            "date" => Constraint::Date,
            "datetime" => Constraint::DateTime,
            _ => return None,
        })
    }

    /// Checks a literal against a literal-validating constraint. Kinds that
    /// do not look at literals, and literals of a kind the constraint does
    /// not apply to, pass.
    pub fn validate(&self, literal: &Literal) -> Result<(), Violation> {
        let name = self.name();
        let fail = |message: String| Err(Violation::new(name, message));
        match (self, literal) {
            (Constraint::MinLength(n), Literal::String(s)) if (s.chars().count() as u64) < *n => {
                fail(format!("string is shorter than {n} characters"))
            }
            (Constraint::MaxLength(n), Literal::String(s)) if (s.chars().count() as u64) > *n => {
                fail(format!("string is longer than {n} characters"))
            }
            (Constraint::Min(bound), Literal::Number(x)) if !bound.admits_from_below(x) => {
                let cmp = if bound.exclusive { "greater than" } else { "at least" };
                fail(format!("value {x} must be {cmp} {}", bound.value))
            }
            (Constraint::Max(bound), Literal::Number(x)) if !bound.admits_from_above(x) => {
                let cmp = if bound.exclusive { "less than" } else { "at most" };
                fail(format!("value {x} must be {cmp} {}", bound.value))
            }
            (Constraint::Precision(p), Literal::Number(x)) if !numeric::fits_precision(x, *p) => {
                fail(format!("value {x} has more than {p} fractional digits"))
            }
            (Constraint::Regex(pattern), Literal::String(s)) if !pattern.is_match(s) => {
                fail(format!("string does not match {:?}", pattern.as_str()))
            }
            (Constraint::Email, Literal::String(s)) if !format::is_email(s) => fail("invalid email".to_string()),
            (Constraint::Uri, Literal::String(s)) if !format::is_uri(s) => fail("invalid uri".to_string()),
            (Constraint::Uuid, Literal::String(s)) if !format::is_uuid(s) => fail("invalid uuid".to_string()),
            (Constraint::Date, Literal::String(s)) if !format::is_date(s) => {
                fail("invalid date, expecting YYYY-MM-DD".to_string())
            }
            (Constraint::DateTime, Literal::String(s)) if !format::is_datetime(s) => {
                fail("invalid datetime, expecting RFC 3339".to_string())
            }
            (Constraint::Enum(rule), value) if !rule.contains(value) => {
                fail(format!("value {value} is not one of the enum values"))
            }
            _ => Ok(()),
        }
    }

    /// Documentation node of the rule. Kinds that are derived, or that need
    /// the owning schema to be rendered, return `None`.
    pub fn ast(&self) -> Option<RuleAst> {
        let value = match self {
            Constraint::Type(name) if name.starts_with('@') => RuleAst::scalar(TokenType::Shortcut, name),
            Constraint::Type(name) => RuleAst::string(name),
            Constraint::Min(bound) | Constraint::Max(bound) => RuleAst::number(&bound.value),
            Constraint::ExclusiveMinimum(b)
            | Constraint::ExclusiveMaximum(b)
            | Constraint::Optional(b)
            | Constraint::Nullable(b)
            | Constraint::Const(b) => RuleAst::boolean(*b),
            Constraint::MinLength(n)
            | Constraint::MaxLength(n)
            | Constraint::MinItems(n)
            | Constraint::MaxItems(n)
            | Constraint::Precision(n) => RuleAst::number(n),
            Constraint::Regex(pattern) => RuleAst::string(pattern.as_str()),
            Constraint::Enum(rule) => match &rule.rule_name {
                Some(name) => RuleAst::scalar(TokenType::Shortcut, name),
                None => RuleAst::container(
                    TokenType::Array,
                    rule.items.iter().map(|item| RuleAst::literal(&item.value).noted(item.comment.clone())).collect(),
                ),
            },
            Constraint::AllOf(names) => {
                RuleAst::container(TokenType::Array, names.iter().map(|n| RuleAst::scalar(TokenType::Shortcut, n)).collect())
            }
            Constraint::AdditionalProperties(AdditionalProperties::Allowed(b)) => RuleAst::boolean(*b),
            Constraint::AdditionalProperties(AdditionalProperties::Type(name)) if name.starts_with('@') => {
                RuleAst::scalar(TokenType::Shortcut, name)
            }
            Constraint::AdditionalProperties(AdditionalProperties::Type(name)) => RuleAst::string(name),
            Constraint::TypesList(_)
            | Constraint::Or(_)
            | Constraint::Decimal
            | Constraint::RequiredKeys(_)
            | Constraint::Email
            | Constraint::Uri
            | Constraint::Uuid
            | Constraint::Date
            | Constraint::DateTime
            | Constraint::Any => return None,
        };
        Some(value.keyed(self.name()))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// MAP
// ————————————————————————————————————————————————————————————————————————————

/// Constraint map of one node: at most one entry per kind, insertion ordered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Constraints(IndexMap<ConstraintKind, Constraint>);

impl Constraints {
    /// Adds a new constraint; a second one of the same kind is an error.
    pub fn add(&mut self, constraint: Constraint) -> Result<(), ErrorKind> {
        let kind = constraint.kind();
        if self.0.contains_key(&kind) {
            return Err(ErrorKind::DuplicateRule(kind.name().to_string()));
        }
        self.0.insert(kind, constraint);
        Ok(())
    }

    /// Inserts or replaces, keeping the position of a replaced entry.
    pub fn set(&mut self, constraint: Constraint) {
        self.0.insert(constraint.kind(), constraint);
    }

    pub fn get(&self, kind: ConstraintKind) -> Option<&Constraint> {
        self.0.get(&kind)
    }

    pub fn get_mut(&mut self, kind: ConstraintKind) -> Option<&mut Constraint> {
        self.0.get_mut(&kind)
    }

    pub fn has(&self, kind: ConstraintKind) -> bool {
        self.0.contains_key(&kind)
    }

    pub fn remove(&mut self, kind: ConstraintKind) -> Option<Constraint> {
        self.0.shift_remove(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.0.values()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ConstraintKind> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of a boolean rule.
    pub fn flag(&self, kind: ConstraintKind) -> Option<bool> {
        match self.get(kind)? {
            Constraint::Optional(b)
            | Constraint::Nullable(b)
            | Constraint::Const(b)
            | Constraint::ExclusiveMinimum(b)
            | Constraint::ExclusiveMaximum(b) => Some(*b),
            _ => None,
        }
    }

    pub fn required_keys(&self) -> &[String] {
        match self.get(ConstraintKind::RequiredKeys) {
            Some(Constraint::RequiredKeys(keys)) => keys,
            _ => &[],
        }
    }

    pub fn additional_properties(&self) -> Option<&AdditionalProperties> {
        match self.get(ConstraintKind::AdditionalProperties) {
            Some(Constraint::AdditionalProperties(ap)) => Some(ap),
            _ => None,
        }
    }

    pub fn types_list(&self) -> Option<&TypesList> {
        match self.get(ConstraintKind::TypesList) {
            Some(Constraint::TypesList(list)) => Some(list),
            _ => None,
        }
    }

    /// Checks a literal against every constraint.
    pub fn validate(&self, literal: &Literal) -> Result<(), Violation> {
        self.iter().try_for_each(|c| c.validate(literal))
    }
}
