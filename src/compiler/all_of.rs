//! Second pass: expand `allOf` inheritance.
//!
//! Referenced types are compiled on demand, each at most once, and borrowed
//! out of the registry while they compile so a cycle shows up as a name that
//! is still being processed.
use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::constraint::{Constraint, ConstraintKind as K};
use crate::error::{ErrorKind, Result, SchemaError};
use crate::node::{Key, Node, NodeKind};
use crate::schema::{Schema, TypeRegistry, anonymous_name};

pub struct AllOfCompiler<'r> {
    registry: &'r mut TypeRegistry,
    processing: HashSet<String>,
    compiled: HashSet<String>,
    /// Anonymous types copied in with grafted properties, appended to the
    /// schema being compiled once its tree is done.
    imported: Vec<Node>,
    anonymous_base: usize,
}

impl<'r> AllOfCompiler<'r> {
    pub fn new(registry: &'r mut TypeRegistry) -> Self {
        Self { registry, processing: HashSet::new(), compiled: HashSet::new(), imported: Vec::new(), anonymous_base: 0 }
    }

    /// Compiles every registered type.
    pub fn compile_registry(&mut self) -> Result<()> {
        let names: Vec<String> = self.registry.names().map(str::to_string).collect();
        names.iter().try_for_each(|name| self.compile_type(name))
    }

    pub fn is_compiled(&self, name: &str) -> bool {
        self.compiled.contains(name)
    }

    pub fn compile_type(&mut self, name: &str) -> Result<()> {
        if self.compiled.contains(name) {
            return Ok(());
        }
        if self.processing.contains(name) {
            return Err(ErrorKind::AllOfRecursion(name.to_string()).into());
        }
        let Some(mut schema) = self.registry.take(name) else {
            return Err(ErrorKind::TypeNotFound(name.to_string()).into());
        };
        self.processing.insert(name.to_string());
        let result = self.compile_schema(&mut schema).map_err(|err| err.in_type(name));
        self.processing.remove(name);
        self.registry.restore(name, schema);
        result?;
        self.compiled.insert(name.to_string());
        debug!(type_name = name, "allOf compiled");
        Ok(())
    }

    /// Expands the root and every anonymous type of `schema`.
    pub fn compile_schema(&mut self, schema: &mut Schema) -> Result<()> {
        let saved = (std::mem::take(&mut self.imported), self.anonymous_base);
        self.anonymous_base = schema.anonymous_types().count();

        let mut result = self.compile_node(&mut schema.root);
        if result.is_ok() {
            result = schema.anonymous_types_mut().try_for_each(|node| self.compile_node(node));
        }
        for node in std::mem::take(&mut self.imported) {
            schema.push_anonymous(node);
        }

        (self.imported, self.anonymous_base) = saved;
        result
    }

    fn compile_node(&mut self, node: &mut Node) -> Result<()> {
        for child in node.children_mut() {
            self.compile_node(child)?;
        }
        let Some(Constraint::AllOf(names)) = node.constraints.get(K::AllOf).cloned() else {
            return Ok(());
        };
        let at = node.span.begin;
        self.expand(node, &names).map_err(|err| err.at(at))?;
        node.constraints.remove(K::AllOf);
        Ok(())
    }

    /// Grafts the properties of each listed type in front of the node's own.
    /// When two types provide a key, the one listed first wins.
    fn expand(&mut self, node: &mut Node, names: &[String]) -> Result<()> {
        let mut inherited: IndexMap<Key, Node> = IndexMap::new();
        let mut required: Vec<String> = Vec::new();

        for name in names {
            self.compile_type(name)?;
            let source = self.registry.get(name).ok_or_else(|| ErrorKind::TypeNotFound(name.clone()))?;
            let Some(props) = source.root.properties() else {
                return Err(ErrorKind::AllOfNotObject(name.clone()).into());
            };

            if let Some(ap) = source.root.constraints.additional_properties() {
                match node.constraints.additional_properties() {
                    None => node.constraints.set(Constraint::AdditionalProperties(ap.clone())),
                    Some(own) if own == ap => {}
                    Some(_) => return Err(ErrorKind::AdditionalPropertiesConflict(name.clone()).into()),
                }
            }

            let own = node.properties().ok_or_else(|| ErrorKind::AllOfNotObject(name.clone()))?;
            for (key, child) in props {
                if inherited.contains_key(key) {
                    continue;
                }
                if let Some(existing) = own.get(key) {
                    if existing.inherited_from.is_none() {
                        return Err(SchemaError::new(ErrorKind::CannotOverride {
                            key: key.name.clone(),
                            type_name: name.clone(),
                        })
                        .at(existing.span.begin));
                    }
                    continue;
                }
                let mut copy = child.clone();
                copy.inherited_from.get_or_insert_with(|| name.clone());
                import_anonymous(&mut copy, source, &mut self.imported, self.anonymous_base);
                if source.root.constraints.required_keys().contains(&key.name) {
                    required.push(key.name.clone());
                }
                inherited.insert(key.clone(), copy);
            }
        }

        if let NodeKind::Object(own) = &mut node.kind {
            inherited.extend(std::mem::take(own));
            *own = inherited;
        }
        for key in node.constraints.required_keys() {
            if !required.contains(key) {
                required.push(key.clone());
            }
        }
        if !required.is_empty() {
            node.constraints.set(Constraint::RequiredKeys(required));
        }
        Ok(())
    }
}

/// Copies the anonymous types a grafted subtree refers to into the target
/// schema's pending list and renames the references.
fn import_anonymous(node: &mut Node, source: &Schema, imported: &mut Vec<Node>, base: usize) {
    if let Some(Constraint::TypesList(list)) = node.constraints.get_mut(K::TypesList) {
        for item in list.items.iter_mut().filter(|item| item.anonymous) {
            if let Some(anonymous) = source.anonymous_type(&item.name) {
                let mut copy = anonymous.clone();
                import_anonymous(&mut copy, source, imported, base);
                item.name = anonymous_name(base + imported.len());
                imported.push(copy);
            }
        }
    }
    for child in node.children_mut() {
        import_anonymous(child, source, imported, base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompileOptions, Compiler};
    use crate::constraint::AdditionalProperties;
    use crate::schema::RuleRegistry;

    fn schema(src: &str) -> Schema {
        Compiler::new(&TypeRegistry::new(), &RuleRegistry::new())
            .options(CompileOptions { check_type_references: false, ..CompileOptions::default() })
            .compile(src.as_bytes())
            .unwrap()
    }

    fn registry(types: &[(&str, &str)]) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for (name, src) in types {
            registry.insert(*name, schema(src)).unwrap();
        }
        registry
    }

    fn keys(node: &Node) -> Vec<&str> {
        node.properties().unwrap().keys().map(|k| k.name.as_str()).collect()
    }

    #[test]
    fn inherited_properties_come_first() {
        let mut types = registry(&[("@A", "{\n  \"a\": 1,\n  \"b\": \"x\" // {optional: true}\n}")]);
        let mut main = schema("{ // {allOf: \"@A\"}\n  \"c\": true\n}");
        AllOfCompiler::new(&mut types).compile_schema(&mut main).unwrap();

        assert_eq!(keys(&main.root), ["a", "b", "c"]);
        let props = main.root.properties().unwrap();
        assert_eq!(props[&Key::plain("a")].inherited_from.as_deref(), Some("@A"));
        assert_eq!(props[&Key::plain("c")].inherited_from, None);
        assert_eq!(main.root.constraints.required_keys(), ["a".to_string(), "c".to_string()]);
        assert!(!main.root.constraints.has(K::AllOf));
    }

    #[test]
    fn first_listed_type_wins() {
        let mut types = registry(&[("@A", "{\n  \"k\": 1\n}"), ("@B", "{\n  \"k\": \"s\",\n  \"m\": 2\n}")]);
        let mut main = schema("{} // {allOf: [\"@A\", \"@B\"]}");
        AllOfCompiler::new(&mut types).compile_schema(&mut main).unwrap();

        let props = main.root.properties().unwrap();
        let k = &props[&Key::plain("k")];
        assert_eq!(k.json_type(), crate::json_type::JsonType::Integer);
        assert_eq!(k.inherited_from.as_deref(), Some("@A"));
        assert_eq!(props[&Key::plain("m")].inherited_from.as_deref(), Some("@B"));
    }

    #[test]
    fn own_properties_cannot_override() {
        let mut types = registry(&[("@A", "{\n  \"k\": 1\n}")]);
        let mut main = schema("{ // {allOf: \"@A\"}\n  \"k\": 2\n}");
        let err = AllOfCompiler::new(&mut types).compile_schema(&mut main).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::CannotOverride { key: "k".into(), type_name: "@A".into() });
    }

    #[test]
    fn cycles_are_detected() {
        let mut types = registry(&[("@A", "{} // {allOf: \"@B\"}"), ("@B", "{} // {allOf: \"@A\"}")]);
        let err = AllOfCompiler::new(&mut types).compile_registry().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::AllOfRecursion(_)));
        assert!(types.get("@A").is_some());
        assert!(types.get("@B").is_some());
    }

    #[test]
    fn chained_inheritance_keeps_original_source() {
        let mut types = registry(&[("@A", "{\n  \"a\": 1\n}"), ("@B", "{} // {allOf: \"@A\"}")]);
        let mut main = schema("{} // {allOf: \"@B\"}");
        let mut compiler = AllOfCompiler::new(&mut types);
        compiler.compile_schema(&mut main).unwrap();
        assert!(compiler.is_compiled("@A"));
        assert!(compiler.is_compiled("@B"));
        let a = &main.root.properties().unwrap()[&Key::plain("a")];
        assert_eq!(a.inherited_from.as_deref(), Some("@A"));
    }

    #[test]
    fn allof_requires_object_types() {
        let mut types = registry(&[("@S", "\"str\"")]);
        let mut main = schema("{} // {allOf: \"@S\"}");
        let err = AllOfCompiler::new(&mut types).compile_schema(&mut main).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::AllOfNotObject("@S".into()));

        let mut empty = TypeRegistry::new();
        let err = AllOfCompiler::new(&mut empty).compile_schema(&mut main).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TypeNotFound("@S".into()));
    }

    #[test]
    fn additional_properties_merge() {
        let mut types = registry(&[
            ("@Open", "{ // {additionalProperties: true}\n  \"a\": 1\n}"),
            ("@Closed", "{ // {additionalProperties: false}\n  \"b\": 1\n}"),
        ]);
        let mut main = schema("{} // {allOf: \"@Open\"}");
        AllOfCompiler::new(&mut types).compile_schema(&mut main).unwrap();
        assert_eq!(main.root.constraints.additional_properties(), Some(&AdditionalProperties::Allowed(true)));

        let mut main = schema("{} // {allOf: [\"@Open\", \"@Closed\"]}");
        let err = AllOfCompiler::new(&mut types).compile_schema(&mut main).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::AdditionalPropertiesConflict("@Closed".into()));
    }

    #[test]
    fn grafted_or_rules_bring_their_anonymous_types() {
        let mut types = registry(&[("@A", "{\n  \"v\": 1 // {or: [\"integer\", \"string\"]}\n}")]);
        let mut main = schema("{ // {allOf: \"@A\"}\n  \"w\": 2 // {or: [\"integer\", \"boolean\"]}\n}");
        AllOfCompiler::new(&mut types).compile_schema(&mut main).unwrap();

        assert_eq!(main.anonymous_types().count(), 4);
        let v = &main.root.properties().unwrap()[&Key::plain("v")];
        let names: Vec<&str> = v.constraints.types_list().unwrap().items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["#3", "#4"]);
        assert_eq!(main.anonymous_type("#4").unwrap().type_name(), "string");
    }
}
