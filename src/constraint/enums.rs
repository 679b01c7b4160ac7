use crate::literal::Literal;

#[derive(Debug, Clone, PartialEq)]
pub struct EnumItem {
    pub value: Literal,
    pub comment: Option<String>,
}

/// Values of an `enum` rule. `rule_name` is set when the list was expanded
/// from a named rule (`enum: @colors`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumRule {
    pub items: Vec<EnumItem>,
    pub rule_name: Option<String>,
}

impl EnumRule {
    pub fn from_values(values: impl IntoIterator<Item = Literal>) -> Self {
        let items = values.into_iter().map(|value| EnumItem { value, comment: None }).collect();
        Self { items, rule_name: None }
    }

    /// Type and value must both match: `1` and `1.0` are different items.
    pub fn contains(&self, value: &Literal) -> bool {
        self.items
            .iter()
            .any(|item| item.value.json_type() == value.json_type() && item.value == *value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_compares_type_and_value() {
        let rule = EnumRule::from_values([
            Literal::from_token(b"1").unwrap(),
            Literal::from_token(br#""a""#).unwrap(),
            Literal::Null,
        ]);
        assert!(rule.contains(&Literal::from_token(b"1").unwrap()));
        assert!(!rule.contains(&Literal::from_token(b"1.0").unwrap()));
        assert!(rule.contains(&Literal::Null));
        assert!(!rule.contains(&Literal::String("b".into())));
    }
}
