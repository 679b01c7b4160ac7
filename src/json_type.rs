use std::fmt;

use serde::Serialize;

/// JSON kind of an example value. `Mixed` is the placeholder kind of nodes
/// whose shape comes from a type reference or an `or` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Integer,
    Float,
    Boolean,
    Null,
    Array,
    Object,
    Mixed,
}

impl JsonType {
    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Integer => "integer",
            JsonType::Float => "float",
            JsonType::Boolean => "boolean",
            JsonType::Null => "null",
            JsonType::Array => "array",
            JsonType::Object => "object",
            JsonType::Mixed => "mixed",
        }
    }

    /// Base JSON type names accepted by the `type` rule.
    pub fn from_base_name(name: &str) -> Option<Self> {
        Some(match name {
            "string" => JsonType::String,
            "integer" => JsonType::Integer,
            "float" => JsonType::Float,
            "boolean" => JsonType::Boolean,
            "null" => JsonType::Null,
            "array" => JsonType::Array,
            "object" => JsonType::Object,
            _ => return None,
        })
    }

    pub fn is_number(self) -> bool {
        matches!(self, JsonType::Integer | JsonType::Float)
    }

    pub fn is_scalar(self) -> bool {
        !matches!(self, JsonType::Array | JsonType::Object | JsonType::Mixed)
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
