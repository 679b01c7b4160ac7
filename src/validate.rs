//! Checks JSON documents against compiled schemas.
use std::cell::Cell;

use serde_json::Value;
use tracing::debug;

use crate::constraint::{AdditionalProperties, Constraint, ConstraintKind as K, TypesList};
use crate::error::{Result, Violation};
use crate::json_type::JsonType;
use crate::literal::Literal;
use crate::node::{Key, Node, NodeKind, Span};
use crate::schema::{Schema, TypeRegistry};

/// Nesting limit for type references; only reached by types that refer to
/// themselves without consuming any input.
const MAX_REFERENCE_DEPTH: usize = 128;

/// Validates `value` against `schema`, resolving references in `registry`.
pub fn validate_value(schema: &Schema, registry: &TypeRegistry, value: &Value) -> Result<()> {
    Validator::new(registry).validate(schema, value).map_err(|violation| {
        debug!(%violation, "document rejected");
        violation.into()
    })
}

pub struct Validator<'r> {
    registry: &'r TypeRegistry,
    depth: Cell<usize>,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry, depth: Cell::new(0) }
    }

    pub fn validate(&self, schema: &Schema, value: &Value) -> Result<(), Violation> {
        self.validate_node(schema, &schema.root, value)
    }

    /// Validates against one node of `owner`, which holds the anonymous
    /// types the node may refer to.
    pub fn validate_node(&self, owner: &Schema, node: &Node, value: &Value) -> Result<(), Violation> {
        self.check(owner, node, value, "")
    }

    fn check(&self, owner: &Schema, node: &Node, value: &Value, ptr: &str) -> Result<(), Violation> {
        if value.is_null() && node.is_nullable() {
            return Ok(());
        }
        let c = &node.constraints;
        if c.has(K::Any) {
            return self.check_const(node, value, ptr);
        }
        if let Some(list) = c.types_list() {
            return self.check_or(owner, list, value, ptr);
        }
        if let Some(name) = node.user_type() {
            return self.check_user_type(name, value, ptr);
        }
        match &node.kind {
            NodeKind::Object(props) => self.check_object(owner, node, props, value, ptr),
            NodeKind::Array(items) => self.check_array(owner, node, items, value, ptr),
            NodeKind::Literal(example) => self.check_scalar(node, Some(example), value, ptr),
            NodeKind::Mixed => self.check_scalar(node, None, value, ptr),
        }
    }

    fn check_or(&self, owner: &Schema, list: &TypesList, value: &Value, ptr: &str) -> Result<(), Violation> {
        for item in &list.items {
            let matched = if item.anonymous {
                owner.anonymous_type(&item.name).is_some_and(|node| self.check(owner, node, value, ptr).is_ok())
            } else {
                self.check_user_type(&item.name, value, ptr).is_ok()
            };
            if matched {
                return Ok(());
            }
        }
        Err(Violation::new("or", "value matches none of the allowed types").at(ptr))
    }

    fn check_user_type(&self, name: &str, value: &Value, ptr: &str) -> Result<(), Violation> {
        let Some(schema) = self.registry.get(name) else {
            return Err(Violation::new("type", format!("type {name} not found")).at(ptr));
        };
        let depth = self.depth.get();
        if depth >= MAX_REFERENCE_DEPTH {
            return Err(Violation::new("type", format!("type {name} refers to itself too deeply")).at(ptr));
        }
        self.depth.set(depth + 1);
        let result = self.check(schema, &schema.root, value, ptr);
        self.depth.set(depth);
        result
    }

    /// Value type of an `additionalProperties` rule.
    fn check_named_type(&self, owner: &Schema, name: &str, value: &Value, ptr: &str) -> Result<(), Violation> {
        if name.starts_with('@') {
            return self.check_user_type(name, value, ptr);
        }
        let mut node = Node::mixed(Span::default());
        let constraint = match name {
            "any" => Constraint::Any,
            "decimal" => Constraint::Decimal,
            other => Constraint::format(other).unwrap_or_else(|| Constraint::Type(other.to_string())),
        };
        node.constraints.set(constraint);
        self.check(owner, &node, value, ptr)
    }

    fn check_object(
        &self,
        owner: &Schema,
        node: &Node,
        props: &indexmap::IndexMap<Key, Node>,
        value: &Value,
        ptr: &str,
    ) -> Result<(), Violation> {
        let Value::Object(map) = value else {
            return Err(type_violation(JsonType::Object, value, ptr));
        };
        for (name, child_value) in map {
            let child_ptr = format!("{ptr}/{}", escape_pointer(name));
            if let Some(child) = props.get(&Key::plain(name.as_str())) {
                self.check(owner, child, child_value, &child_ptr)?;
                continue;
            }
            let key_value = Value::String(name.clone());
            let shortcut = props
                .iter()
                .filter(|(key, _)| key.shortcut)
                .find(|(key, _)| self.check_user_type(&key.name, &key_value, &child_ptr).is_ok());
            if let Some((_, child)) = shortcut {
                self.check(owner, child, child_value, &child_ptr)?;
                continue;
            }
            match node.constraints.additional_properties() {
                Some(AdditionalProperties::Allowed(true)) => {}
                Some(AdditionalProperties::Type(type_name)) => {
                    self.check_named_type(owner, type_name, child_value, &child_ptr)?;
                }
                _ => {
                    return Err(Violation::new("additionalProperties", format!("property {name:?} is not allowed"))
                        .at(&child_ptr));
                }
            }
        }
        for key in node.constraints.required_keys() {
            if !map.contains_key(key) {
                return Err(Violation::new("required", format!("missing required property {key:?}")).at(ptr));
            }
        }
        Ok(())
    }

    fn check_array(&self, owner: &Schema, node: &Node, items: &[Node], value: &Value, ptr: &str) -> Result<(), Violation> {
        let Value::Array(values) = value else {
            return Err(type_violation(JsonType::Array, value, ptr));
        };
        let len = values.len() as u64;
        if let Some(Constraint::MinItems(n)) = node.constraints.get(K::MinItems) {
            if len < *n {
                return Err(Violation::new("minItems", format!("array has fewer than {n} items")).at(ptr));
            }
        }
        if let Some(Constraint::MaxItems(n)) = node.constraints.get(K::MaxItems) {
            if len > *n {
                return Err(Violation::new("maxItems", format!("array has more than {n} items")).at(ptr));
            }
        }
        if items.is_empty() {
            if !values.is_empty() {
                return Err(Violation::new("items", "array must be empty").at(ptr));
            }
            return Ok(());
        }
        for (i, item_value) in values.iter().enumerate() {
            let item_ptr = format!("{ptr}/{i}");
            if let [only] = items {
                self.check(owner, only, item_value, &item_ptr)?;
            } else if !items.iter().any(|item| self.check(owner, item, item_value, &item_ptr).is_ok()) {
                return Err(Violation::new("items", "item matches none of the example items").at(&item_ptr));
            }
        }
        Ok(())
    }

    /// Literal examples, and example-less nodes carrying a base type or a
    /// special type marker.
    fn check_scalar(&self, node: &Node, example: Option<&Literal>, value: &Value, ptr: &str) -> Result<(), Violation> {
        let c = &node.constraints;
        let actual = value_type(value);
        let expected = if c.has(K::Enum) {
            None
        } else if c.has(K::Decimal) {
            Some(JsonType::Float)
        } else if c.kinds().any(K::is_format) {
            Some(JsonType::String)
        } else {
            match (example, c.get(K::Type)) {
                (Some(example), _) => Some(example.json_type()),
                (None, Some(Constraint::Type(name))) => JsonType::from_base_name(name),
                (None, _) => None,
            }
        };
        if let Some(expected) = expected {
            let fits = expected == actual || (expected == JsonType::Float && actual == JsonType::Integer);
            if !fits {
                return Err(type_violation(expected, value, ptr));
            }
        }
        match Literal::from_value(value) {
            Some(literal) => {
                c.validate(&literal).map_err(|v| v.at(ptr))?;
                self.check_const(node, value, ptr)
            }
            None if c.has(K::Enum) => Err(Violation::new("enum", "value is not one of the enum values").at(ptr)),
            None => Ok(()),
        }
    }

    fn check_const(&self, node: &Node, value: &Value, ptr: &str) -> Result<(), Violation> {
        if node.constraints.flag(K::Const) != Some(true) {
            return Ok(());
        }
        match (node.literal_value(), Literal::from_value(value)) {
            (Some(example), Some(literal)) if example.json_type() == literal.json_type() && *example == literal => Ok(()),
            (Some(example), _) => Err(Violation::new("const", format!("value must be {example}")).at(ptr)),
            (None, _) => Ok(()),
        }
    }
}

fn value_type(value: &Value) -> JsonType {
    match value {
        Value::String(_) => JsonType::String,
        Value::Number(_) => Literal::from_value(value).map_or(JsonType::Float, |l| l.json_type()),
        Value::Bool(_) => JsonType::Boolean,
        Value::Null => JsonType::Null,
        Value::Array(_) => JsonType::Array,
        Value::Object(_) => JsonType::Object,
    }
}

fn type_violation(expected: JsonType, value: &Value, ptr: &str) -> Violation {
    Violation::new("type", format!("expected {expected}, got {}", value_type(value))).at(ptr)
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
