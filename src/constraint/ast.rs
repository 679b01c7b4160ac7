use serde::Serialize;

use crate::literal::Literal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
    Shortcut,
}

impl TokenType {
    pub fn of(literal: &Literal) -> Self {
        match literal {
            Literal::String(_) => TokenType::String,
            Literal::Number(_) => TokenType::Number,
            Literal::Boolean(_) => TokenType::Boolean,
            Literal::Null => TokenType::Null,
        }
    }
}

/// Documentation view of one rule or rule value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAst {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub token_type: TokenType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scalar_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RuleAst>,
}

impl RuleAst {
    pub fn scalar(token_type: TokenType, value: impl Into<String>) -> Self {
        Self { key: None, token_type, scalar_value: Some(value.into()), note: None, children: Vec::new() }
    }

    pub fn literal(literal: &Literal) -> Self {
        Self::scalar(TokenType::of(literal), literal.scalar_text())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::scalar(TokenType::String, value)
    }

    pub fn number(value: impl ToString) -> Self {
        Self::scalar(TokenType::Number, value.to_string())
    }

    pub fn boolean(value: bool) -> Self {
        Self::scalar(TokenType::Boolean, value.to_string())
    }

    pub fn container(token_type: TokenType, children: Vec<RuleAst>) -> Self {
        Self { key: None, token_type, scalar_value: None, note: None, children }
    }

    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn noted(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}
