use super::rule::{RuleValue, ValueKind};
use super::{Loader, apply_rules};
use crate::constraint::{Constraint, ConstraintKind, RuleSource, TypeItem, TypesList};
use crate::error::{ErrorKind, Result, fail};
use crate::node::{Node, Span};
use crate::schema::{is_known_type_name, is_user_type_name};

impl Loader<'_> {
    /// `or: ["@cat", "string", {type: "integer", min: 0}]`. Every item that is
    /// not a plain user-type reference becomes an anonymous type.
    pub(super) fn or_rule(&mut self, value: &RuleValue) -> Result<(Constraint, Constraint)> {
        let ValueKind::Array(items) = &value.kind else {
            return Err(value.invalid("or", "a list of types"));
        };
        if items.is_empty() {
            return fail(ErrorKind::EmptyList("or"), value.at);
        }
        let mut list = Vec::with_capacity(items.len());
        for item in items {
            list.push(self.or_item(item)?);
        }
        let types = TypesList { items: list, source: RuleSource::Manual };
        Ok((Constraint::TypesList(types), Constraint::Or(RuleSource::Manual)))
    }

    fn or_item(&mut self, item: &RuleValue) -> Result<TypeItem> {
        let span = Span { begin: item.at, end: item.at };
        if let Some(name) = item.as_name() {
            if is_user_type_name(name) {
                return Ok(TypeItem { name: name.to_string(), anonymous: false });
            }
            if !is_known_type_name(name) {
                return fail(ErrorKind::InvalidTypeName(name.to_string()), item.at);
            }
            let mut node = Node::mixed(span);
            apply_rules(&mut node, vec![(Constraint::Type(name.to_string()), item.at)])?;
            return Ok(TypeItem { name: self.register_anonymous(node), anonymous: true });
        }
        let ValueKind::Object(entries) = &item.kind else {
            return Err(item.invalid("or", "a type name or a rule set"));
        };
        let constraints = self.rule_constraints(entries.clone())?;
        if !constraints.iter().any(|(c, _)| c.kind() == ConstraintKind::Type) {
            return fail(ErrorKind::RequiresRule { rule: "or", required: "type" }, item.at);
        }
        let mut node = Node::mixed(span);
        apply_rules(&mut node, constraints)?;
        Ok(TypeItem { name: self.register_anonymous(node), anonymous: true })
    }
}

#[cfg(test)]
mod tests {
    use crate::constraint::{Bound, Constraint, ConstraintKind, RuleSource};
    use crate::error::ErrorKind;
    use crate::literal::Number;
    use crate::schema::{RuleRegistry, Schema};

    fn load(src: &str) -> crate::error::Result<Schema> {
        super::super::load(src.as_bytes(), &RuleRegistry::new())
    }

    #[test]
    fn items_become_references_or_anonymous_types() {
        let schema = load(r#"1 // {or: ["@cat", "string", {type: "integer", min: 0}]}"#).unwrap();
        let list = schema.root.constraints.types_list().unwrap();
        assert_eq!(list.source, RuleSource::Manual);
        let names: Vec<_> = list.items.iter().map(|i| (i.name.as_str(), i.anonymous)).collect();
        assert_eq!(names, vec![("@cat", false), ("#1", true), ("#2", true)]);
        let third = schema.anonymous_type("#2").unwrap();
        assert_eq!(third.constraints.get(ConstraintKind::Min), Some(&Constraint::Min(Bound::new(Number::from_u64(0)))));
        assert_eq!(schema.direct_user_types(), vec!["@cat".to_string()]);
    }

    #[test]
    fn rule_set_items_need_a_type() {
        let err = load(r#"1 // {or: [{min: 0}, "string"]}"#).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::RequiresRule { rule: "or", required: "type" });
    }

    #[test]
    fn rule_set_items_are_type_checked() {
        let err = load(r#"1 // {or: [{type: "string", min: 0}]}"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::IncompatibleRule { rule: "min", .. }));
    }

    #[test]
    fn empty_or_is_rejected() {
        assert_eq!(load(r#"1 // {or: []}"#).unwrap_err().kind(), &ErrorKind::EmptyList("or"));
    }
}
