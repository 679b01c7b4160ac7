//! Project file (`jschema.json`) read by the command line tool.
use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::compiler::CompileOptions;
use crate::constraint::EnumRule;
use crate::error::{ErrorKind, SchemaError};
use crate::literal::Literal;
use crate::schema::RuleRegistry;

pub const DEFAULT_FILE_NAME: &str = "jschema.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("at JSON path {path} → {message}")]
    Parse { path: String, message: String },
    #[error("enum {name:?}: {source}")]
    Enum { name: String, source: SchemaError },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Glob patterns of type files; a file's stem is its type name.
    #[serde(default)]
    pub types: Vec<String>,
    /// Named enum rules, `"@name": [values…]`.
    #[serde(default)]
    pub enums: IndexMap<String, Vec<Value>>,
    #[serde(default)]
    pub options: OptionOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct OptionOverrides {
    pub check_type_references: Option<bool>,
    pub keys_optional_by_default: Option<bool>,
}

impl ProjectConfig {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        from_slice_with_path(bytes)
    }

    pub fn compile_options(&self) -> CompileOptions {
        let defaults = CompileOptions::default();
        CompileOptions {
            check_type_references: self.options.check_type_references.unwrap_or(defaults.check_type_references),
            keys_optional_by_default: self.options.keys_optional_by_default.unwrap_or(defaults.keys_optional_by_default),
        }
    }

    pub fn rule_registry(&self) -> Result<RuleRegistry, ConfigError> {
        let mut rules = RuleRegistry::new();
        for (name, values) in &self.enums {
            let enum_error = |kind: ErrorKind| ConfigError::Enum { name: name.clone(), source: kind.into() };
            let literals = values
                .iter()
                .map(|value| {
                    Literal::from_value(value)
                        .ok_or_else(|| enum_error(ErrorKind::InvalidRuleValue { rule: "enum".into(), expected: "scalar values" }))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if literals.is_empty() {
                return Err(enum_error(ErrorKind::EmptyList("enum")));
            }
            rules
                .insert(name.clone(), EnumRule::from_values(literals))
                .map_err(|source| ConfigError::Enum { name: name.clone(), source })?;
        }
        Ok(rules)
    }
}

/// Deserialize with JSON-path context in error messages.
fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ConfigError> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| ConfigError::Parse {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_a_full_project_file() {
        let config = ProjectConfig::from_slice(
            br#"{
                "types": ["types/*.jschema"],
                "enums": {"@colors": ["red", "green"]},
                "options": {"keysOptionalByDefault": true}
            }"#,
        )
        .unwrap();
        assert_eq!(config.types, ["types/*.jschema"]);
        let options = config.compile_options();
        assert!(options.keys_optional_by_default);
        assert!(options.check_type_references);
        let rules = config.rule_registry().unwrap();
        assert_eq!(rules.get("@colors").unwrap().items.len(), 2);
    }

    #[test]
    fn errors_name_the_json_path() {
        let err = ProjectConfig::from_slice(br#"{"options": {"checkTypeReferences": "yes"}}"#).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, "options.checkTypeReferences"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(ProjectConfig::from_slice(br#"{"typos": []}"#).is_err());
    }

    #[test]
    fn enum_values_must_be_scalars() {
        let config = ProjectConfig::from_slice(br#"{"enums": {"@bad": [[1]]}}"#).unwrap();
        assert!(matches!(config.rule_registry(), Err(ConfigError::Enum { .. })));
        let config = ProjectConfig::from_slice(br#"{"enums": {"colors": ["red"]}}"#).unwrap();
        assert!(config.rule_registry().is_err());
    }
}
