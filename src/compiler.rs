//! Turns schema source into a compiled [`Schema`].
//!
//! Compilation runs the loader and the basic pass. Inheritance needs the
//! referenced types, so it runs later through [`resolve`] once the caller has
//! compiled and registered them.
mod all_of;
mod basic;

use std::collections::HashSet;

use tracing::debug;

pub use all_of::AllOfCompiler;

use crate::error::{ErrorKind, Result, SchemaError};
use crate::loader;
use crate::node::Node;
use crate::schema::{RuleRegistry, Schema, TypeRegistry, mentioned_types};
use crate::validate::Validator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Fail when a mentioned `@Type` is missing from the registry.
    pub check_type_references: bool,
    /// Keys without an `optional` rule are optional.
    pub keys_optional_by_default: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { check_type_references: true, keys_optional_by_default: false }
    }
}

pub struct Compiler<'r> {
    types: &'r TypeRegistry,
    rules: &'r RuleRegistry,
    options: CompileOptions,
    file: Option<String>,
}

impl<'r> Compiler<'r> {
    pub fn new(types: &'r TypeRegistry, rules: &'r RuleRegistry) -> Self {
        Self { types, rules, options: CompileOptions::default(), file: None }
    }

    pub fn options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// File name reported in error locations.
    pub fn file(mut self, name: impl Into<String>) -> Self {
        self.file = Some(name.into());
        self
    }

    pub fn compile(&self, src: &[u8]) -> Result<Schema> {
        self.compile_unlocated(src).map_err(|err| err.locate(src, self.file.as_deref()))
    }

    fn compile_unlocated(&self, src: &[u8]) -> Result<Schema> {
        let mut schema = loader::load(src, self.rules)?;
        basic::compile_schema(&mut schema, &self.options)?;
        if self.options.check_type_references {
            for name in schema.direct_user_types() {
                if !self.types.contains(&name) {
                    let err = SchemaError::new(ErrorKind::TypeNotFound(name.clone()));
                    return Err(match reference_offset(&schema, &name) {
                        Some(offset) => err.at(offset),
                        None => err,
                    });
                }
            }
        }
        debug!(nodes = schema.root.count(), anonymous = schema.anonymous_types().count(), "schema compiled");
        Ok(schema)
    }
}

/// Compiles with default options.
pub fn compile(src: &[u8], types: &TypeRegistry, rules: &RuleRegistry) -> Result<Schema> {
    Compiler::new(types, rules).compile(src)
}

/// Runs the basic pass again on an already loaded schema.
pub fn compile_basic(schema: &mut Schema, options: &CompileOptions) -> Result<()> {
    basic::compile_schema(schema, options)
}

/// Every user type `schema` depends on, directly or through other types, in
/// first-seen order.
pub fn collect_user_types(schema: &Schema, registry: &TypeRegistry) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    let mut queue: Vec<String> = schema.direct_user_types().into_iter().rev().collect();
    while let Some(name) = queue.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }
        let Some(dependency) = registry.get(&name) else {
            return Err(ErrorKind::TypeNotFound(name).into());
        };
        queue.extend(dependency.direct_user_types().into_iter().rev());
        order.push(name);
    }
    Ok(order)
}

/// Final step for a compiled schema: expands inheritance in every type it
/// uses and in the schema itself, then checks the examples that could not
/// be checked without those types.
pub fn resolve(schema: &mut Schema, registry: &mut TypeRegistry) -> Result<()> {
    let used = collect_user_types(schema, registry)?;
    let mut compiler = AllOfCompiler::new(registry);
    for name in &used {
        compiler.compile_type(name)?;
    }
    compiler.compile_schema(schema)?;
    for name in &used {
        if let Some(dependency) = registry.get(name) {
            validate_reference_examples(dependency, registry).map_err(|err| err.in_type(name))?;
        }
    }
    validate_reference_examples(schema, registry)?;
    debug!(types = used.len(), "schema resolved");
    Ok(())
}

fn validate_reference_examples(schema: &Schema, registry: &TypeRegistry) -> Result<()> {
    let validator = Validator::new(registry);
    let mut result = Ok(());
    schema.root.walk(&mut |node: &Node| {
        if result.is_err() || (node.user_type().is_none() && node.constraints.types_list().is_none()) {
            return;
        }
        if let Some(example) = node.example_value() {
            if let Err(violation) = validator.validate_node(schema, node, &example) {
                result = Err(SchemaError::new(violation.into()).at(node.span.begin));
            }
        }
    });
    result
}

/// Start of the first node that mentions `name`.
fn reference_offset(schema: &Schema, name: &str) -> Option<usize> {
    let mut found = None;
    schema.root.walk(&mut |node: &Node| {
        if found.is_some() {
            return;
        }
        mentioned_types(node, &mut |mentioned| {
            if mentioned == name {
                found.get_or_insert(node.span.begin);
            }
        });
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintKind, RuleSource};
    use crate::json_type::JsonType;

    fn compile_types(types: &[(&str, &str)]) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        let rules = RuleRegistry::new();
        let options = CompileOptions { check_type_references: false, ..CompileOptions::default() };
        for (name, src) in types {
            let schema = Compiler::new(&registry, &rules).options(options).compile(src.as_bytes()).unwrap();
            registry.insert(*name, schema).unwrap();
        }
        registry
    }

    #[test]
    fn missing_reference_is_located() {
        let err = compile(b"{\n  \"pet\": @cat\n}", &TypeRegistry::new(), &RuleRegistry::new()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TypeNotFound("@cat".into()));
        assert_eq!(err.location().unwrap().line, 2);
    }

    #[test]
    fn shortcut_union_becomes_generated_or() {
        let types = compile_types(&[("@Foo", "{\n  \"f\": 1\n}"), ("@Bar", "\"bar\"")]);
        let schema = compile(b"@Foo | @Bar", &types, &RuleRegistry::new()).unwrap();

        assert_eq!(schema.root.json_type(), JsonType::Mixed);
        let list = schema.root.constraints.types_list().unwrap();
        assert_eq!(list.source, RuleSource::Generated);
        let wrapped: Vec<String> = list
            .items
            .iter()
            .map(|item| schema.anonymous_type(&item.name).unwrap().user_type().unwrap().to_string())
            .collect();
        assert_eq!(wrapped, ["@Foo", "@Bar"]);
        assert_eq!(schema.direct_user_types(), ["@Foo", "@Bar"]);
    }

    #[test]
    fn collects_transitive_types() {
        let types = compile_types(&[("@C", "1"), ("@B", "{\n  \"c\": @C\n}"), ("@A", "[@B]"), ("@Z", "2")]);
        let schema = compile(b"{\n  \"a\": @A\n}", &types, &RuleRegistry::new()).unwrap();
        assert_eq!(collect_user_types(&schema, &types).unwrap(), ["@A", "@B", "@C"]);
    }

    #[test]
    fn resolve_expands_used_types() {
        let mut types = compile_types(&[("@Base", "{\n  \"id\": 1\n}"), ("@Pet", "{ // {allOf: \"@Base\"}\n  \"name\": \"x\"\n}")]);
        let mut schema = compile(b"{\n  \"pet\": @Pet\n}", &types, &RuleRegistry::new()).unwrap();
        resolve(&mut schema, &mut types).unwrap();
        let pet = types.get("@Pet").unwrap();
        assert_eq!(pet.root.child_count(), 2);
        assert!(!pet.root.constraints.has(ConstraintKind::AllOf));
    }

    #[test]
    fn resolve_checks_examples_against_referenced_types() {
        let mut types = compile_types(&[("@Id", "1 // {min: 1}")]);
        let mut schema = compile(b"{\n  \"id\": 0 // {type: \"@Id\"}\n}", &types, &RuleRegistry::new()).unwrap();
        let err = resolve(&mut schema, &mut types).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Violation(v) if v.rule == "min"));
        assert!(err.offset().is_some());
    }
}
