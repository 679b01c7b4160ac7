//! Serializable documentation tree of a compiled schema.
use serde::Serialize;

use crate::constraint::{ConstraintKind as K, RuleAst, RuleSource, TokenType, TypesList};
use crate::node::{Key, Node, NodeKind};
use crate::schema::Schema;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocElement {
    pub token_type: TokenType,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_key_shortcut: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scalar_value: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherited_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleAst>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocElement>,
}

impl Schema {
    pub fn doc(&self) -> DocElement {
        element(self, &self.root, None)
    }
}

fn element(schema: &Schema, node: &Node, key: Option<&Key>) -> DocElement {
    let (token_type, scalar_value, children) = match &node.kind {
        NodeKind::Object(props) => {
            let children = props.iter().map(|(k, child)| element(schema, child, Some(k))).collect();
            (TokenType::Object, None, children)
        }
        NodeKind::Array(items) => {
            let children = items.iter().map(|child| element(schema, child, None)).collect();
            (TokenType::Array, None, children)
        }
        NodeKind::Literal(lit) => (TokenType::of(lit), Some(lit.scalar_text()), Vec::new()),
        NodeKind::Mixed => (TokenType::Shortcut, Some(shortcut_text(schema, node)), Vec::new()),
    };
    DocElement {
        token_type,
        type_name: node.type_name(),
        key: key.map(|k| k.name.clone()),
        is_key_shortcut: key.is_some_and(|k| k.shortcut),
        scalar_value,
        optional: node.is_optional(),
        inherited_from: node.inherited_from.clone(),
        note: node.comment.clone(),
        rules: rules(schema, node),
        children,
    }
}

/// `@Cat`, or `@Cat | @Dog` for a shortcut union.
fn shortcut_text(schema: &Schema, node: &Node) -> String {
    match node.constraints.types_list() {
        Some(list) => list
            .items
            .iter()
            .map(|item| match schema.anonymous_type(&item.name) {
                Some(anonymous) if item.anonymous => anonymous.type_name(),
                _ => item.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(" | "),
        None => node.type_name(),
    }
}

fn rules(schema: &Schema, node: &Node) -> Vec<RuleAst> {
    let c = &node.constraints;
    let mut out = Vec::new();
    let marker = [K::Any, K::Decimal, K::Email, K::Uri, K::Uuid, K::Date, K::DateTime]
        .into_iter()
        .any(|kind| c.has(kind));
    if marker {
        out.push(RuleAst::string(node.type_name()).keyed("type"));
    }
    for constraint in c.iter() {
        if let Some(ast) = constraint.ast() {
            out.push(ast);
        }
    }
    if let Some(list) = c.types_list() {
        if list.source == RuleSource::Manual {
            out.push(or_rule(schema, list));
        }
    }
    out
}

fn or_rule(schema: &Schema, list: &TypesList) -> RuleAst {
    let items = list
        .items
        .iter()
        .map(|item| match schema.anonymous_type(&item.name) {
            Some(anonymous) if item.anonymous => {
                let rules = rules(schema, anonymous);
                match rules.as_slice() {
                    [only] if only.key.as_deref() == Some("type") => RuleAst { key: None, ..only.clone() },
                    _ => RuleAst::container(TokenType::Object, rules),
                }
            }
            _ => RuleAst::scalar(TokenType::Shortcut, &item.name),
        })
        .collect();
    RuleAst::container(TokenType::Array, items).keyed("or")
}
