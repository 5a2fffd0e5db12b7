use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing a `field:operator:value` term
#[derive(Debug, Error, PartialEq)]
pub enum CriterionParseError {
    #[error("Invalid criterion '{0}'. Expected 'field:operator:value' format")]
    InvalidFormat(String),

    #[error("Empty {part} in criterion '{term}'")]
    EmptyPart { part: &'static str, term: String },
}

/// A flat, user-facing (field, operator, value) triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriterion {
    pub field: String,
    pub operator: String,
    pub value: Value,
}

impl FilterCriterion {
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value,
        }
    }
}

impl FromStr for FilterCriterion {
    type Err = CriterionParseError;

    /// Parse `field:operator:value`.
    ///
    /// Splits on the first two colons only, so timestamps keep theirs. A value
    /// starting with `[`, `{` or `"` is read as JSON when it parses; anything
    /// else is a plain string (`404` stays text for `Message:contains:404`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.splitn(3, ':').collect();
        if parts.len() != 3 {
            return Err(CriterionParseError::InvalidFormat(s.to_string()));
        }

        let field = parts[0].trim();
        let operator = parts[1].trim();
        let raw_value = parts[2].trim();
        for (part, text) in [("field", field), ("operator", operator), ("value", raw_value)] {
            if text.is_empty() {
                return Err(CriterionParseError::EmptyPart {
                    part,
                    term: s.to_string(),
                });
            }
        }

        let value = if raw_value.starts_with(['[', '{', '"']) {
            serde_json::from_str::<Value>(raw_value)
                .unwrap_or_else(|_| Value::String(raw_value.to_string()))
        } else {
            Value::String(raw_value.to_string())
        };

        Ok(FilterCriterion::new(field, operator, value))
    }
}

impl fmt::Display for FilterCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::String(s) => write!(f, "{}:{}:{}", self.field, self.operator, s),
            other => write!(f, "{}:{}:{}", self.field, self.operator, other),
        }
    }
}
