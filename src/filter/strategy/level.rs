use super::ordered::OrderedOperand;
use super::{FieldStrategy, Predicate, ensure_supported, invalid_value};
use crate::filter::catalog::{Field, Operator};
use crate::filter::error::FilterError;
use crate::record::{LogLevel, LogRecord};
use serde_json::Value;
use std::sync::Arc;

fn parse_level(value: &Value) -> Result<LogLevel, String> {
    value
        .as_str()
        .ok_or_else(|| "expected a level name".to_string())?
        .parse()
}

/// Matches on severity. Level names are compared case-insensitively and
/// through aliases ("warning" equals "warn"); ordering operators compare
/// by severity.
#[derive(Debug, Clone)]
pub struct LevelStrategy {
    operator: Operator,
}

impl LevelStrategy {
    pub fn new(operator: Operator) -> Result<Self, FilterError> {
        ensure_supported(Field::Level, operator)?;
        Ok(Self { operator })
    }
}

impl FieldStrategy for LevelStrategy {
    fn field(&self) -> Field {
        Field::Level
    }

    fn operator(&self) -> Operator {
        self.operator
    }

    fn compile(&self, value: &Value) -> Result<Predicate, FilterError> {
        let operator = self.operator;
        let operand = OrderedOperand::parse(operator, value, parse_level)
            .map_err(|reason| invalid_value(Field::Level, operator, value, reason))?;

        Ok(Arc::new(move |record: &LogRecord| match record.severity() {
            Some(level) => operand.test(operator, &level),
            None => operator.is_negated(),
        }))
    }
}
