use super::Loader;
use super::rule::{RuleValue, ValueKind};
use crate::constraint::{Constraint, EnumItem, EnumRule};
use crate::error::{ErrorKind, Result, fail};

impl Loader<'_> {
    /// `enum: [1, 2, 3]` with optional per-item comments, or `enum: @name`
    /// expanded from the rule registry.
    pub(super) fn enum_rule(&mut self, value: &RuleValue) -> Result<Constraint> {
        match &value.kind {
            ValueKind::Array(items) => {
                if items.is_empty() {
                    return fail(ErrorKind::EmptyList("enum"), value.at);
                }
                let items = items
                    .iter()
                    .map(|item| match &item.kind {
                        ValueKind::Literal(lit) => Ok(EnumItem { value: lit.clone(), comment: item.comment.clone() }),
                        _ => Err(item.invalid("enum", "a scalar literal")),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Constraint::Enum(EnumRule { items, rule_name: None }))
            }
            ValueKind::Shortcut(names) if names.len() == 1 => {
                let name = &names[0];
                match self.rules.get(name) {
                    Some(rule) => Ok(Constraint::Enum(rule.clone())),
                    None => fail(ErrorKind::RuleNotFound(name.clone()), value.at),
                }
            }
            _ => Err(value.invalid("enum", "a list of literals or @rule")),
        }
    }
}
