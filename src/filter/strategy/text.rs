use super::{FieldStrategy, MatchOptions, Predicate, ensure_supported, invalid_value, non_empty_list};
use crate::filter::catalog::{Field, Operator};
use crate::filter::error::FilterError;
use crate::record::LogRecord;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::sync::Arc;

const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// String matching for the free-text fields: Message, Node and Username.
#[derive(Debug, Clone)]
pub struct TextStrategy {
    field: Field,
    operator: Operator,
    options: MatchOptions,
}

impl TextStrategy {
    pub fn new(field: Field, operator: Operator, options: MatchOptions) -> Result<Self, FilterError> {
        if !matches!(field, Field::Message | Field::Node | Field::Username) {
            return Err(FilterError::UnsupportedField(field.to_string()));
        }
        ensure_supported(field, operator)?;
        Ok(Self {
            field,
            operator,
            options,
        })
    }

    fn normalize(&self, text: &str) -> String {
        if self.options.case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        }
    }

    fn compile_operand(&self, value: &Value) -> Result<TextOperand, String> {
        match self.operator {
            Operator::In | Operator::NotIn => non_empty_list(value)?
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(|s| self.normalize(s))
                        .ok_or_else(|| format!("expected a string, got {item}"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(TextOperand::Set),
            Operator::Regex => {
                let pattern = value
                    .as_str()
                    .ok_or_else(|| "expected a regular expression string".to_string())?;
                RegexBuilder::new(pattern)
                    .case_insensitive(!self.options.case_sensitive)
                    .size_limit(REGEX_SIZE_LIMIT)
                    .build()
                    .map(TextOperand::Pattern)
                    .map_err(|e| format!("invalid regular expression: {e}"))
            }
            _ => value
                .as_str()
                .map(|s| TextOperand::Literal(self.normalize(s)))
                .ok_or_else(|| "expected a string".to_string()),
        }
    }
}

#[derive(Debug)]
enum TextOperand {
    Literal(String),
    Set(Vec<String>),
    Pattern(Regex),
}

impl TextOperand {
    fn test(&self, operator: Operator, actual: &str) -> bool {
        match (operator, self) {
            (Operator::Equals, TextOperand::Literal(v)) => actual == v,
            (Operator::NotEquals, TextOperand::Literal(v)) => actual != v,
            (Operator::Contains, TextOperand::Literal(v)) => actual.contains(v.as_str()),
            (Operator::NotContains, TextOperand::Literal(v)) => !actual.contains(v.as_str()),
            (Operator::StartsWith, TextOperand::Literal(v)) => actual.starts_with(v.as_str()),
            (Operator::EndsWith, TextOperand::Literal(v)) => actual.ends_with(v.as_str()),
            (Operator::In, TextOperand::Set(values)) => values.iter().any(|v| v == actual),
            (Operator::NotIn, TextOperand::Set(values)) => values.iter().all(|v| v != actual),
            (Operator::Regex, TextOperand::Pattern(re)) => re.is_match(actual),
            _ => false,
        }
    }
}

fn field_text(field: Field, record: &LogRecord) -> Option<&str> {
    match field {
        Field::Message => Some(record.message.as_str()),
        Field::Node => Some(record.node.as_str()),
        Field::Username => record.username.as_deref(),
        _ => None,
    }
}

impl FieldStrategy for TextStrategy {
    fn field(&self) -> Field {
        self.field
    }

    fn operator(&self) -> Operator {
        self.operator
    }

    fn compile(&self, value: &Value) -> Result<Predicate, FilterError> {
        let operand = self
            .compile_operand(value)
            .map_err(|reason| invalid_value(self.field, self.operator, value, reason))?;
        let field = self.field;
        let operator = self.operator;
        // The regex carries its own case flag, so only literals are lowered.
        let lower = !self.options.case_sensitive && operator != Operator::Regex;

        Ok(Arc::new(move |record: &LogRecord| match field_text(field, record) {
            Some(text) if lower => operand.test(operator, &text.to_lowercase()),
            Some(text) => operand.test(operator, text),
            None => operator.is_negated(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::json;

    fn record(message: &str, username: Option<&str>) -> LogRecord {
        LogRecord {
            source: "app.log".to_string(),
            line_number: 1,
            timestamp: DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap(),
            level: "INFO".to_string(),
            message: message.to_string(),
            node: "broker-01".to_string(),
            process_id: None,
            username: username.map(str::to_string),
        }
    }

    fn strategy(field: Field, operator: Operator) -> TextStrategy {
        TextStrategy::new(field, operator, MatchOptions::default()).unwrap()
    }

    #[test]
    fn test_message_contains_is_case_insensitive_by_default() {
        let contains = strategy(Field::Message, Operator::Contains);
        let log = record("Connection Timeout Error", None);

        assert!(contains.matches(&log, &json!("timeout")).unwrap());
        assert!(contains.matches(&log, &json!("TIMEOUT")).unwrap());
        assert!(!contains.matches(&log, &json!("refused")).unwrap());
    }

    #[test]
    fn test_case_sensitive_option() {
        let options = MatchOptions {
            case_sensitive: true,
        };
        let contains = TextStrategy::new(Field::Message, Operator::Contains, options).unwrap();
        let regex = TextStrategy::new(Field::Message, Operator::Regex, options).unwrap();
        let log = record("Connection Timeout Error", None);

        assert!(contains.matches(&log, &json!("Timeout")).unwrap());
        assert!(!contains.matches(&log, &json!("timeout")).unwrap());
        assert!(!regex.matches(&log, &json!("^connection")).unwrap());
    }

    #[test]
    fn test_regex_must_compile() {
        let regex = strategy(Field::Message, Operator::Regex);
        assert!(regex.is_valid_value(&json!(r"time\s*out")));
        assert!(!regex.is_valid_value(&json!("(unclosed")));
        assert!(regex.matches(&record("request TIMED OUT", None), &json!("timed\\s+out")).unwrap());
    }

    #[test]
    fn test_node_prefix_and_membership() {
        let log = record("hello", None);
        assert!(strategy(Field::Node, Operator::StartsWith).matches(&log, &json!("BROKER")).unwrap());
        assert!(strategy(Field::Node, Operator::EndsWith).matches(&log, &json!("-01")).unwrap());
        assert!(strategy(Field::Node, Operator::In).matches(&log, &json!(["broker-02", "Broker-01"])).unwrap());
    }

    #[test]
    fn test_missing_username() {
        let log = record("hello", None);
        assert!(!strategy(Field::Username, Operator::Equals).matches(&log, &json!("alice")).unwrap());
        assert!(strategy(Field::Username, Operator::NotContains).matches(&log, &json!("alice")).unwrap());
    }

    #[test]
    fn test_rejects_non_text_field_and_unsupported_operator() {
        assert!(TextStrategy::new(Field::Level, Operator::Equals, MatchOptions::default()).is_err());
        assert!(TextStrategy::new(Field::Username, Operator::Regex, MatchOptions::default()).is_err());
    }
}
