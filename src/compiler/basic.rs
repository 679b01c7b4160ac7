//! First pass: reconcile the rules attached to each node.
//!
//! Nodes are visited children first so an object sees its compiled
//! properties when it computes its required keys. Every step leaves the node
//! in a state the step accepts again, so a second run changes nothing.
use tracing::trace;

use super::CompileOptions;
use crate::constraint::numeric::range_is_satisfiable;
use crate::constraint::{Constraint, ConstraintKind as K};
use crate::error::{ErrorKind, Result, SchemaError, fail};
use crate::json_type::JsonType;
use crate::node::{Node, NodeKind};
use crate::schema::Schema;

const FORMATS: [K; 5] = [K::Email, K::Uri, K::Uuid, K::Date, K::DateTime];

pub(crate) fn compile_schema(schema: &mut Schema, options: &CompileOptions) -> Result<()> {
    compile_node(&mut schema.root, options)?;
    for node in schema.anonymous_types_mut() {
        compile_node(node, options)?;
    }
    validate_examples(&schema.root)
}

fn compile_node(node: &mut Node, options: &CompileOptions) -> Result<()> {
    for child in node.children_mut() {
        compile_node(child, options)?;
    }
    let at = node.span.begin;
    let step = |result: Result<(), ErrorKind>| result.map_err(|kind| SchemaError::new(kind).at(at));

    drop_false_flags(node);
    step(check_or(node))?;
    step(check_enum(node))?;
    step(resolve_type(node))?;
    step(check_banned(node))?;
    step(check_any(node))?;
    step(check_ranges(node))?;
    step(fold_exclusive(node))?;
    required_keys(node, options);
    step(check_precision(node))?;
    step(check_empty_array(node))?;
    Ok(())
}

/// `nullable: false` and `const: false` say nothing.
fn drop_false_flags(node: &mut Node) {
    for kind in [K::Nullable, K::Const] {
        if node.constraints.flag(kind) == Some(false) {
            node.constraints.remove(kind);
        }
    }
}

fn check_or(node: &Node) -> Result<(), ErrorKind> {
    let Some(Constraint::Or(source)) = node.constraints.get(K::Or) else {
        return Ok(());
    };
    for constraint in node.constraints.iter() {
        match constraint {
            Constraint::Or(_) | Constraint::TypesList(_) | Constraint::Optional(_) | Constraint::Nullable(_) => {}
            Constraint::Type(name) if name == "mixed" => {}
            other => return Err(ErrorKind::ForbiddenCombination { rule: "or", other: other.name() }),
        }
    }
    if *source == crate::constraint::RuleSource::Manual && node.has_children() {
        return Err(ErrorKind::OrWithChildren);
    }
    Ok(())
}

fn check_enum(node: &Node) -> Result<(), ErrorKind> {
    if !node.constraints.has(K::Enum) {
        return Ok(());
    }
    for constraint in node.constraints.iter() {
        match constraint {
            Constraint::Enum(_) | Constraint::Optional(_) | Constraint::Nullable(_) => {}
            Constraint::Type(name) if name == "enum" => {}
            other => return Err(ErrorKind::ForbiddenCombination { rule: "enum", other: other.name() }),
        }
    }
    match node.kind {
        NodeKind::Object(_) | NodeKind::Array(_) => {
            Err(ErrorKind::IncompatibleRule { rule: "enum", json_type: node.json_type() })
        }
        _ => Ok(()),
    }
}

/// Base types are checked against the example and dropped; special types
/// become marker constraints; user types stay for the resolve step. Nodes
/// without an example keep their base type since it is their only shape.
fn resolve_type(node: &mut Node) -> Result<(), ErrorKind> {
    let Some(Constraint::Type(name)) = node.constraints.get(K::Type).cloned() else {
        return Ok(());
    };
    if name.starts_with('@') {
        return Ok(());
    }
    let example = node.json_type();
    let has_example = example != JsonType::Mixed;
    let mismatch = || ErrorKind::TypeMismatch { type_name: name.clone(), json_type: example };

    if let Some(base) = JsonType::from_base_name(&name) {
        if !has_example {
            return Ok(());
        }
        if base != example {
            return Err(mismatch());
        }
    } else {
        match name.as_str() {
            "any" => node.constraints.set(Constraint::Any),
            "decimal" => {
                if has_example && !example.is_number() {
                    return Err(mismatch());
                }
                if !node.constraints.has(K::Precision) {
                    return Err(ErrorKind::RequiresRule { rule: "decimal", required: "precision" });
                }
                node.constraints.set(Constraint::Decimal);
            }
            "enum" if !node.constraints.has(K::Enum) => {
                return Err(ErrorKind::RequiresRule { rule: "type", required: "enum" });
            }
            "mixed" if !node.constraints.has(K::Or) => {
                return Err(ErrorKind::RequiresRule { rule: "type", required: "or" });
            }
            "enum" | "mixed" => {}
            other => {
                let marker = Constraint::format(other).ok_or_else(|| ErrorKind::InvalidTypeName(other.to_string()))?;
                if has_example && example != JsonType::String {
                    return Err(mismatch());
                }
                node.constraints.set(marker);
            }
        }
    }
    trace!(type_name = %name, "type resolved");
    node.constraints.remove(K::Type);
    Ok(())
}

fn check_banned(node: &Node) -> Result<(), ErrorKind> {
    let c = &node.constraints;
    for format in FORMATS.into_iter().filter(|f| c.has(*f)) {
        if let Some(other) = [K::MinLength, K::MaxLength, K::Regex].into_iter().find(|k| c.has(*k)) {
            return Err(ErrorKind::ForbiddenCombination { rule: format.name(), other: other.name() });
        }
    }
    if c.has(K::Enum) {
        if let Some(other) = [K::Const, K::Regex].into_iter().find(|k| c.has(*k)) {
            return Err(ErrorKind::ForbiddenCombination { rule: other.name(), other: "enum" });
        }
    }
    Ok(())
}

fn check_any(node: &Node) -> Result<(), ErrorKind> {
    if !node.constraints.has(K::Any) {
        return Ok(());
    }
    if node.has_children() {
        return Err(ErrorKind::AnyWithChildren);
    }
    match node.constraints.kinds().find(|k| !matches!(k, K::Any | K::Optional | K::Nullable | K::Const)) {
        Some(other) => Err(ErrorKind::ForbiddenCombination { rule: "any", other: other.name() }),
        None => Ok(()),
    }
}

fn check_ranges(node: &Node) -> Result<(), ErrorKind> {
    let c = &node.constraints;
    if let (Some(Constraint::Min(min)), Some(Constraint::Max(max))) = (c.get(K::Min), c.get(K::Max)) {
        let mut min = min.clone();
        let mut max = max.clone();
        min.exclusive |= c.flag(K::ExclusiveMinimum) == Some(true);
        max.exclusive |= c.flag(K::ExclusiveMaximum) == Some(true);
        if !range_is_satisfiable(&min, &max) {
            return Err(ErrorKind::InvalidRange { min_rule: "min", max_rule: "max" });
        }
    }
    let pairs = [(K::MinLength, K::MaxLength), (K::MinItems, K::MaxItems)];
    for (low, high) in pairs {
        if let (Some(lo), Some(hi)) = (count(c.get(low)), count(c.get(high))) {
            if lo > hi {
                return Err(ErrorKind::InvalidRange { min_rule: low.name(), max_rule: high.name() });
            }
        }
    }
    Ok(())
}

fn count(constraint: Option<&Constraint>) -> Option<u64> {
    match constraint? {
        Constraint::MinLength(n) | Constraint::MaxLength(n) | Constraint::MinItems(n) | Constraint::MaxItems(n) => Some(*n),
        _ => None,
    }
}

/// Moves `exclusiveMinimum`/`exclusiveMaximum` onto their bound.
fn fold_exclusive(node: &mut Node) -> Result<(), ErrorKind> {
    let pairs = [(K::ExclusiveMinimum, K::Min), (K::ExclusiveMaximum, K::Max)];
    for (flag_kind, bound_kind) in pairs {
        let Some(flag) = node.constraints.flag(flag_kind) else {
            continue;
        };
        node.constraints.remove(flag_kind);
        match node.constraints.get_mut(bound_kind) {
            Some(Constraint::Min(bound) | Constraint::Max(bound)) => bound.exclusive = flag,
            _ if flag => return Err(ErrorKind::RequiresRule { rule: flag_kind.name(), required: bound_kind.name() }),
            _ => {}
        }
    }
    Ok(())
}

/// Keys are required unless marked optional, or unless the unit makes keys
/// optional by default. Shortcut keys are patterns and never required.
fn required_keys(node: &mut Node, options: &CompileOptions) {
    let NodeKind::Object(props) = &node.kind else {
        return;
    };
    let keys: Vec<String> = props
        .iter()
        .filter(|(key, _)| !key.shortcut)
        .filter(|(_, child)| match child.constraints.flag(K::Optional) {
            Some(optional) => !optional,
            None => !options.keys_optional_by_default,
        })
        .map(|(key, _)| key.name.clone())
        .collect();
    if keys.is_empty() {
        node.constraints.remove(K::RequiredKeys);
    } else {
        node.constraints.set(Constraint::RequiredKeys(keys));
    }
}

fn check_precision(node: &Node) -> Result<(), ErrorKind> {
    if node.constraints.has(K::Precision) && !node.constraints.has(K::Decimal) {
        return Err(ErrorKind::RequiresRule { rule: "precision", required: "decimal" });
    }
    Ok(())
}

fn check_empty_array(node: &Node) -> Result<(), ErrorKind> {
    if !matches!(&node.kind, NodeKind::Array(items) if items.is_empty()) {
        return Ok(());
    }
    for kind in [K::MinItems, K::MaxItems] {
        if count(node.constraints.get(kind)).is_some_and(|n| n > 0) {
            return Err(ErrorKind::EmptyArrayItems(kind.name()));
        }
    }
    Ok(())
}

/// Example literals must satisfy their own rules. Literals typed by a
/// reference are checked once the referenced types are known.
fn validate_examples(root: &Node) -> Result<()> {
    let mut result = Ok(());
    root.walk(&mut |node| {
        if result.is_err() || node.user_type().is_some() || node.constraints.has(K::Or) {
            return;
        }
        if let Some(example) = node.literal_value() {
            if let Err(violation) = node.constraints.validate(example) {
                result = fail(ErrorKind::Violation(violation), node.span.begin);
            }
        }
    });
    result
}
