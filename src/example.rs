//! Example documents regenerated from compiled schemas.
use std::str::FromStr;

use serde_json::{Map, Number, Value};

use crate::constraint::{Constraint, ConstraintKind as K};
use crate::error::{ErrorKind, Result};
use crate::json_type::JsonType;
use crate::literal::Literal;
use crate::node::{Node, NodeKind};
use crate::schema::{Schema, TypeRegistry};

impl Schema {
    /// The example this schema was written with. References and `or`
    /// rules take the example of their first type; a type met again
    /// inside itself yields `null`.
    pub fn example(&self, registry: &TypeRegistry) -> Result<Value> {
        Builder { registry, stack: Vec::new() }.node(self, &self.root)
    }

    /// [`Schema::example`] as compact JSON text.
    pub fn example_json(&self, registry: &TypeRegistry) -> Result<String> {
        Ok(self.example(registry)?.to_string())
    }
}

struct Builder<'r> {
    registry: &'r TypeRegistry,
    stack: Vec<String>,
}

impl Builder<'_> {
    fn node(&mut self, owner: &Schema, node: &Node) -> Result<Value> {
        match &node.kind {
            NodeKind::Object(props) => {
                let mut map = Map::new();
                for (key, child) in props {
                    let name = if key.shortcut {
                        match self.user_type(&key.name)? {
                            Value::String(s) => s,
                            _ => key.name.clone(),
                        }
                    } else {
                        key.name.clone()
                    };
                    map.insert(name, self.node(owner, child)?);
                }
                Ok(Value::Object(map))
            }
            NodeKind::Array(items) => items.iter().map(|item| self.node(owner, item)).collect::<Result<_>>().map(Value::Array),
            NodeKind::Literal(lit) => literal(lit),
            NodeKind::Mixed => self.mixed(owner, node),
        }
    }

    fn mixed(&mut self, owner: &Schema, node: &Node) -> Result<Value> {
        if let Some(list) = node.constraints.types_list() {
            let Some(first) = list.items.first() else {
                return Ok(Value::Null);
            };
            if !first.anonymous {
                return self.user_type(&first.name);
            }
            return match owner.anonymous_type(&first.name) {
                Some(anonymous) => self.node(owner, anonymous),
                None => Ok(Value::Null),
            };
        }
        if let Some(name) = node.user_type() {
            return self.user_type(name);
        }
        Ok(placeholder(node))
    }

    fn user_type(&mut self, name: &str) -> Result<Value> {
        if self.stack.iter().any(|n| n == name) {
            return Ok(Value::Null);
        }
        let registry = self.registry;
        let schema = registry.get(name).ok_or_else(|| ErrorKind::TypeNotFound(name.to_string()))?;
        self.stack.push(name.to_string());
        let value = self.node(schema, &schema.root);
        self.stack.pop();
        value
    }
}

fn literal(lit: &Literal) -> Result<Value> {
    Ok(match lit {
        Literal::String(s) => Value::String(s.clone()),
        Literal::Number(n) => Value::Number(Number::from_str(n.as_str()).map_err(|e| ErrorKind::InvalidString(e.to_string()))?),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    })
}

/// Sample value for a node that has a type but no example.
fn placeholder(node: &Node) -> Value {
    let c = &node.constraints;
    let text = |s: &str| Value::String(s.to_string());
    if c.has(K::Email) {
        return text("user@example.com");
    }
    if c.has(K::Uri) {
        return text("https://example.com");
    }
    if c.has(K::Uuid) {
        return text("123e4567-e89b-12d3-a456-426614174000");
    }
    if c.has(K::Date) {
        return text("2006-01-02");
    }
    if c.has(K::DateTime) {
        return text("2006-01-02T15:04:05Z");
    }
    if c.has(K::Decimal) {
        return Value::from(0.0);
    }
    if let Some(Constraint::Enum(rule)) = c.get(K::Enum) {
        if let Some(first) = rule.items.first() {
            return literal(&first.value).unwrap_or(Value::Null);
        }
    }
    match node.effective_type() {
        JsonType::String => text(""),
        JsonType::Integer => Value::from(0),
        JsonType::Float => Value::from(0.0),
        JsonType::Boolean => Value::Bool(false),
        JsonType::Array => Value::Array(Vec::new()),
        JsonType::Object => Value::Object(Map::new()),
        JsonType::Null | JsonType::Mixed => match c.get(K::Type) {
            Some(Constraint::Type(name)) if name == "array" => Value::Array(Vec::new()),
            Some(Constraint::Type(name)) if name == "object" => Value::Object(Map::new()),
            _ => Value::Null,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompileOptions, Compiler};
    use crate::schema::RuleRegistry;

    fn compile(src: &str, registry: &TypeRegistry) -> Schema {
        let options = CompileOptions { check_type_references: false, ..CompileOptions::default() };
        Compiler::new(registry, &RuleRegistry::new()).options(options).compile(src.as_bytes()).unwrap()
    }

    #[test]
    fn literals_keep_their_text() {
        let registry = TypeRegistry::new();
        let src = "{\n  \"price\": 1.50, // {type: \"decimal\", precision: 2}\n  \"tags\": [\"a\", null],\n  \"ok\": true\n}";
        let schema = compile(src, &registry);
        assert_eq!(schema.example_json(&registry).unwrap(), r#"{"price":1.50,"tags":["a",null],"ok":true}"#);
    }

    #[test]
    fn references_use_the_first_type() {
        let mut registry = TypeRegistry::new();
        let cat = compile("{\n  \"meow\": true\n}", &registry);
        registry.insert("@Cat", cat).unwrap();
        let schema = compile("{\n  \"pets\": [@Cat | @Dog],\n  \"n\": 1 // {or: [\"integer\", \"string\"]}\n}", &registry);
        assert_eq!(schema.example_json(&registry).unwrap(), r#"{"pets":[{"meow":true}],"n":1}"#);
    }

    #[test]
    fn recursive_types_stop_at_the_cycle() {
        let mut registry = TypeRegistry::new();
        let node = compile("{\n  \"next\": @Node\n}", &registry);
        registry.insert("@Node", node).unwrap();
        let schema = compile("@Node", &registry);
        assert_eq!(schema.example_json(&registry).unwrap(), r#"{"next":null}"#);
    }

    #[test]
    fn missing_types_and_placeholders() {
        let registry = TypeRegistry::new();
        let schema = compile("{\n  \"id\": @Missing\n}", &registry);
        assert!(matches!(schema.example(&registry).unwrap_err().kind(), ErrorKind::TypeNotFound(_)));

        let mut anonymous = Node::mixed(Default::default());
        anonymous.constraints.set(Constraint::Email);
        assert_eq!(placeholder(&anonymous), Value::String("user@example.com".into()));
    }
}
