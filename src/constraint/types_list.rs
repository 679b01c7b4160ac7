/// Who wrote an `or` rule. Generated ones come from `@A | @B` shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSource {
    Manual,
    Generated,
}

/// One alternative of an `or` rule. Anonymous items live in the owning
/// schema; the others name a user type (`@Cat`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeItem {
    pub name: String,
    pub anonymous: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypesList {
    pub items: Vec<TypeItem>,
    pub source: RuleSource,
}

impl TypesList {
    pub fn user_types(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter(|i| !i.anonymous).map(|i| i.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdditionalProperties {
    Allowed(bool),
    /// Extra properties are allowed when their value has this type: a base
    /// type name, a format name or `@Type`.
    Type(String),
}
