//! Compilation units and the registries they are resolved against.
use std::collections::HashSet;

use indexmap::IndexMap;

use crate::constraint::{AdditionalProperties, Constraint, EnumRule};
use crate::error::{ErrorKind, Result, SchemaError};
use crate::json_type::JsonType;
use crate::node::{Node, Span};

/// One compiled schema body: the example tree plus the anonymous types
/// synthesized from its inline `or` items and shortcut unions.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub root: Node,
    anonymous: IndexMap<String, Node>,
}

impl Schema {
    pub fn new(root: Node) -> Self {
        Self { root, anonymous: IndexMap::new() }
    }

    pub(crate) fn with_anonymous(root: Node, anonymous: IndexMap<String, Node>) -> Self {
        Self { root, anonymous }
    }

    /// Stand-in left in a registry slot while its schema is borrowed out.
    pub(crate) fn placeholder() -> Self {
        Self::new(Node::mixed(Span::default()))
    }

    pub fn anonymous_type(&self, name: &str) -> Option<&Node> {
        self.anonymous.get(name)
    }

    pub fn anonymous_types(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.anonymous.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Adds an anonymous type under the next free `#N` name.
    pub(crate) fn push_anonymous(&mut self, node: Node) -> String {
        let name = anonymous_name(self.anonymous.len());
        self.anonymous.insert(name.clone(), node);
        name
    }

    pub(crate) fn anonymous_types_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.anonymous.values_mut()
    }

    /// Every `@Name` this schema mentions directly, in first-seen order.
    pub fn direct_user_types(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut push = |name: &str| {
            if name.starts_with('@') && seen.insert(name.to_string()) {
                out.push(name.to_string());
            }
        };
        let roots = std::iter::once(&self.root).chain(self.anonymous.values());
        for root in roots {
            root.walk(&mut |node: &Node| mentioned_types(node, &mut push));
        }
        out
    }
}

/// Feeds `push` every type name one node mentions itself; callers filter
/// the `@` ones.
pub(crate) fn mentioned_types(node: &Node, push: &mut impl FnMut(&str)) {
    if let Some(props) = node.properties() {
        props.keys().filter(|k| k.shortcut).for_each(|k| push(k.name.as_str()));
    }
    for constraint in node.constraints.iter() {
        match constraint {
            Constraint::Type(name) => push(name.as_str()),
            Constraint::TypesList(list) => list.user_types().for_each(&mut *push),
            Constraint::AllOf(names) => names.iter().for_each(|n| push(n.as_str())),
            Constraint::AdditionalProperties(AdditionalProperties::Type(name)) => push(name.as_str()),
            _ => {}
        }
    }
}

/// Name of the anonymous type stored after `count` others.
pub(crate) fn anonymous_name(count: usize) -> String {
    format!("#{}", count + 1)
}

/// Named user types (`@Cat`) available to a compilation.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, Schema>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type once; names carry their `@` prefix.
    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) -> Result<()> {
        let name = name.into();
        if !is_user_type_name(&name) {
            return Err(ErrorKind::InvalidTypeName(name).into());
        }
        if self.types.contains_key(&name) {
            return Err(SchemaError::new(ErrorKind::DuplicateType(name)));
        }
        self.types.insert(name, schema);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Moves a schema out for in-place compilation; `restore` puts it back.
    pub(crate) fn take(&mut self, name: &str) -> Option<Schema> {
        self.types.get_mut(name).map(|slot| std::mem::replace(slot, Schema::placeholder()))
    }

    pub(crate) fn restore(&mut self, name: &str, schema: Schema) {
        if let Some(slot) = self.types.get_mut(name) {
            *slot = schema;
        }
    }
}

/// Named enumerations referenced as `enum: @name`.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: IndexMap<String, EnumRule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names carry their `@` prefix; the stored rule remembers it.
    pub fn insert(&mut self, name: impl Into<String>, mut rule: EnumRule) -> Result<()> {
        let name = name.into();
        if !is_user_type_name(&name) {
            return Err(ErrorKind::InvalidTypeName(name).into());
        }
        if self.rules.contains_key(&name) {
            return Err(ErrorKind::DuplicateRule(name).into());
        }
        rule.rule_name = Some(name.clone());
        self.rules.insert(name, rule);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&EnumRule> {
        self.rules.get(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Type names with compiler-defined meaning beyond the JSON base types.
pub const SPECIAL_TYPE_NAMES: [&str; 9] = ["any", "decimal", "email", "uri", "uuid", "date", "datetime", "enum", "mixed"];

/// A base JSON type, a special type or a user type.
pub fn is_known_type_name(name: &str) -> bool {
    is_user_type_name(name) || JsonType::from_base_name(name).is_some() || SPECIAL_TYPE_NAMES.contains(&name)
}

/// `@` followed by letters, digits, `_` or `-`.
pub fn is_user_type_name(name: &str) -> bool {
    name.strip_prefix('@')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(crate::scanner::is_name_byte))
}
