//! The example-value tree.
use indexmap::IndexMap;
use serde_json::Value;

use crate::constraint::{Constraint, ConstraintKind, Constraints};
use crate::json_type::JsonType;
use crate::literal::Literal;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Object property key. A shortcut key (`@id: ...`) stands for any key whose
/// name satisfies the named type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub name: String,
    pub shortcut: bool,
}

/// Byte range of the source text that produced a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Object(IndexMap<Key, Node>),
    Array(Vec<Node>),
    Literal(Literal),
    /// Shape given by a type reference or an `or` rule rather than an example.
    Mixed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub constraints: Constraints,
    pub comment: Option<String>,
    pub span: Span,
    /// Source type of a property grafted by `allOf`.
    pub inherited_from: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Key {
    pub fn plain(name: impl Into<String>) -> Self {
        Self { name: name.into(), shortcut: false }
    }

    pub fn shortcut(name: impl Into<String>) -> Self {
        Self { name: name.into(), shortcut: true }
    }
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, constraints: Constraints::default(), comment: None, span, inherited_from: None }
    }

    pub fn object(begin: usize) -> Self {
        Self::new(NodeKind::Object(IndexMap::new()), Span { begin, end: begin })
    }

    pub fn array(begin: usize) -> Self {
        Self::new(NodeKind::Array(Vec::new()), Span { begin, end: begin })
    }

    pub fn literal(literal: Literal, span: Span) -> Self {
        Self::new(NodeKind::Literal(literal), span)
    }

    pub fn mixed(span: Span) -> Self {
        Self::new(NodeKind::Mixed, span)
    }

    pub fn json_type(&self) -> JsonType {
        match &self.kind {
            NodeKind::Object(_) => JsonType::Object,
            NodeKind::Array(_) => JsonType::Array,
            NodeKind::Literal(lit) => lit.json_type(),
            NodeKind::Mixed => JsonType::Mixed,
        }
    }

    /// JSON type the attached rules are checked against. Example-less nodes
    /// take it from a scalar `type` rule when there is one.
    pub fn effective_type(&self) -> JsonType {
        if !matches!(self.kind, NodeKind::Mixed) {
            return self.json_type();
        }
        match self.constraints.get(ConstraintKind::Type) {
            Some(Constraint::Type(name)) => match name.as_str() {
                "email" | "uri" | "uuid" | "date" | "datetime" => JsonType::String,
                "decimal" => JsonType::Float,
                other => JsonType::from_base_name(other).filter(|t| t.is_scalar()).unwrap_or(JsonType::Mixed),
            },
            _ => JsonType::Mixed,
        }
    }

    pub fn literal_value(&self) -> Option<&Literal> {
        match &self.kind {
            NodeKind::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&IndexMap<Key, Node>> {
        match &self.kind {
            NodeKind::Object(props) => Some(props),
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn has_children(&self) -> bool {
        match &self.kind {
            NodeKind::Object(props) => !props.is_empty(),
            NodeKind::Array(items) => !items.is_empty(),
            _ => false,
        }
    }

    pub fn child_count(&self) -> usize {
        match &self.kind {
            NodeKind::Object(props) => props.len(),
            NodeKind::Array(items) => items.len(),
            _ => 0,
        }
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Node> {
        match &mut self.kind {
            NodeKind::Object(props) => props.get_index_mut(index).map(|(_, child)| child),
            NodeKind::Array(items) => items.get_mut(index),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Box<dyn Iterator<Item = &mut Node> + '_> {
        match &mut self.kind {
            NodeKind::Object(props) => Box::new(props.values_mut()),
            NodeKind::Array(items) => Box::new(items.iter_mut()),
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Follows child indexes from this node.
    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        path.iter().try_fold(self, |node, &index| node.child_mut(index))
    }

    pub fn is_optional(&self) -> bool {
        self.constraints.flag(ConstraintKind::Optional) == Some(true)
    }

    pub fn is_nullable(&self) -> bool {
        self.constraints.flag(ConstraintKind::Nullable) == Some(true)
    }

    /// User type named by a `type` rule, if any.
    pub fn user_type(&self) -> Option<&str> {
        match self.constraints.get(ConstraintKind::Type) {
            Some(Constraint::Type(name)) if name.starts_with('@') => Some(name),
            _ => None,
        }
    }

    /// Type name shown in documentation.
    pub fn type_name(&self) -> String {
        use ConstraintKind as K;
        let marker = [
            (K::Any, "any"),
            (K::Decimal, "decimal"),
            (K::Email, "email"),
            (K::Uri, "uri"),
            (K::Uuid, "uuid"),
            (K::Date, "date"),
            (K::DateTime, "datetime"),
            (K::Enum, "enum"),
            (K::Or, "mixed"),
        ]
        .into_iter()
        .find(|(kind, _)| self.constraints.has(*kind));
        if let Some((_, name)) = marker {
            return name.to_string();
        }
        if let Some(Constraint::Type(name)) = self.constraints.get(K::Type) {
            return name.clone();
        }
        self.json_type().to_string()
    }

    /// The example as a JSON document. `None` when part of the shape comes
    /// from a reference instead of an example.
    pub fn example_value(&self) -> Option<Value> {
        match &self.kind {
            NodeKind::Literal(lit) => serde_json::from_str(&lit.to_json()).ok(),
            NodeKind::Array(items) => items.iter().map(Node::example_value).collect::<Option<Vec<_>>>().map(Value::Array),
            NodeKind::Object(props) => {
                let mut map = serde_json::Map::new();
                for (key, child) in props {
                    if key.shortcut {
                        return None;
                    }
                    map.insert(key.name.clone(), child.example_value()?);
                }
                Some(Value::Object(map))
            }
            NodeKind::Mixed => None,
        }
    }

    /// Depth-first visit of this node and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        match &self.kind {
            NodeKind::Object(props) => props.values().for_each(|child| child.walk(visit)),
            NodeKind::Array(items) => items.iter().for_each(|child| child.walk(visit)),
            _ => {}
        }
    }

    pub fn count(&self) -> usize {
        let mut n = 0;
        self.walk(&mut |_| n += 1);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Number;

    fn lit(n: &str) -> Node {
        Node::literal(Literal::Number(Number::parse(n).unwrap()), Span::default())
    }

    #[test]
    fn descendant_follows_object_and_array_indexes() {
        let mut inner = Node::array(0);
        if let NodeKind::Array(items) = &mut inner.kind {
            items.push(lit("1"));
            items.push(lit("2"));
        }
        let mut root = Node::object(0);
        if let NodeKind::Object(props) = &mut root.kind {
            props.insert(Key::plain("a"), inner);
        }
        let found = root.descendant_mut(&[0, 1]).unwrap();
        assert_eq!(found.literal_value().unwrap().to_json(), "2");
        assert!(root.descendant_mut(&[0, 2]).is_none());
        assert_eq!(root.count(), 4);
    }

    #[test]
    fn example_value_is_none_with_references() {
        let mut root = Node::object(0);
        if let NodeKind::Object(props) = &mut root.kind {
            props.insert(Key::plain("a"), lit("1.50"));
        }
        assert_eq!(root.example_value().unwrap().to_string(), r#"{"a":1.50}"#);
        if let NodeKind::Object(props) = &mut root.kind {
            props.insert(Key::plain("b"), Node::mixed(Span::default()));
        }
        assert!(root.example_value().is_none());
    }

    #[test]
    fn effective_type_of_mixed_node_comes_from_scalar_type_rule() {
        let mut node = Node::mixed(Span::default());
        assert_eq!(node.effective_type(), JsonType::Mixed);
        node.constraints.add(Constraint::Type("email".into())).unwrap();
        assert_eq!(node.effective_type(), JsonType::String);
        assert_eq!(lit("1").effective_type(), JsonType::Integer);
    }
}
