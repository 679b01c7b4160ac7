use super::rule::{RuleValue, ValueKind, user_type_name};
use crate::error::{ErrorKind, Result, fail};

/// Type names of an `allOf` rule, in the order written.
pub(super) fn type_names(value: &RuleValue) -> Result<Vec<String>> {
    if let Some(name) = value.as_name() {
        return Ok(vec![user_type_name(value, name)?]);
    }
    let ValueKind::Array(items) = &value.kind else {
        return Err(value.invalid("allOf", "a type name or a list of type names"));
    };
    if items.is_empty() {
        return fail(ErrorKind::EmptyList("allOf"), value.at);
    }
    items
        .iter()
        .map(|item| match item.as_name() {
            Some(name) => user_type_name(item, name),
            None => Err(item.invalid("allOf", "a type name")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::constraint::{Constraint, ConstraintKind};
    use crate::error::ErrorKind;
    use crate::schema::RuleRegistry;

    fn all_of(src: &str) -> crate::error::Result<Option<Constraint>> {
        let schema = super::super::load(src.as_bytes(), &RuleRegistry::new())?;
        Ok(schema.root.constraints.get(ConstraintKind::AllOf).cloned())
    }

    #[test]
    fn single_name_and_list_forms() {
        assert_eq!(all_of(r#"{} // {allOf: "@a"}"#).unwrap(), Some(Constraint::AllOf(vec!["@a".into()])));
        assert_eq!(
            all_of(r#"{} // {allOf: ["@a", @b]}"#).unwrap(),
            Some(Constraint::AllOf(vec!["@a".into(), "@b".into()]))
        );
    }

    #[test]
    fn only_user_types_may_be_inherited() {
        let err = all_of(r#"{} // {allOf: "object"}"#).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidTypeName("object".into()));
        assert!(all_of(r#"[] // {allOf: "@a"}"#).is_err());
    }
}
