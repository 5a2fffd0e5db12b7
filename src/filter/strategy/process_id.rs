use super::ordered::OrderedOperand;
use super::{FieldStrategy, Predicate, ensure_supported, invalid_value};
use crate::filter::catalog::{Field, Operator};
use crate::filter::error::FilterError;
use crate::record::LogRecord;
use serde_json::Value;
use std::sync::Arc;

fn parse_pid(value: &Value) -> Result<u32, String> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| format!("{value} is not a valid process id"))
}

#[derive(Debug, Clone)]
pub struct ProcessIdStrategy {
    operator: Operator,
}

impl ProcessIdStrategy {
    pub fn new(operator: Operator) -> Result<Self, FilterError> {
        ensure_supported(Field::ProcessId, operator)?;
        Ok(Self { operator })
    }
}

impl FieldStrategy for ProcessIdStrategy {
    fn field(&self) -> Field {
        Field::ProcessId
    }

    fn operator(&self) -> Operator {
        self.operator
    }

    fn compile(&self, value: &Value) -> Result<Predicate, FilterError> {
        let operator = self.operator;
        let operand = OrderedOperand::parse(operator, value, parse_pid)
            .map_err(|reason| invalid_value(Field::ProcessId, operator, value, reason))?;

        Ok(Arc::new(move |record: &LogRecord| match record.process_id {
            Some(pid) => operand.test(operator, &pid),
            None => operator.is_negated(),
        }))
    }
}
