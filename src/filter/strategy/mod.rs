//! Per-field match strategies.
//!
//! A strategy is bound to one (field, operator) pair at construction and is
//! immutable afterwards. It validates operands, estimates selectivity, and
//! compiles an operand into a [`Predicate`] that is applied per record.

mod level;
mod ordered;
mod process_id;
mod text;
mod timestamp;

pub use level::LevelStrategy;
pub use process_id::ProcessIdStrategy;
pub use text::TextStrategy;
pub use timestamp::TimestampStrategy;

use super::catalog::{Field, Operator, supported_operators};
use super::error::FilterError;
use crate::record::LogRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Compiled per-record test
pub type Predicate = Arc<dyn Fn(&LogRecord) -> bool + Send + Sync>;

/// Options shared by all string comparisons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// String operators ignore case unless this is set
    pub case_sensitive: bool,
}

pub trait FieldStrategy: fmt::Debug + Send + Sync {
    fn field(&self) -> Field;

    fn operator(&self) -> Operator;

    /// Compile an operand into a predicate, rejecting invalid operands
    fn compile(&self, value: &Value) -> Result<Predicate, FilterError>;

    fn field_name(&self) -> &'static str {
        self.field().canonical_name()
    }

    fn operator_name(&self) -> &'static str {
        self.operator().canonical_name()
    }

    fn is_valid_value(&self, value: &Value) -> bool {
        self.compile(value).is_ok()
    }

    /// Expected fraction of records that pass, always within [0, 1]
    fn estimate_selectivity(&self, value: &Value) -> f64 {
        default_selectivity(self.operator(), value)
    }

    /// One-off check of a single record. Compiles `value` on every call, so
    /// streams go through [`FilterExpression::leaf`](crate::filter::FilterExpression::leaf),
    /// which compiles once and reuses the predicate.
    fn matches(&self, record: &LogRecord, value: &Value) -> Result<bool, FilterError> {
        let predicate = self.compile(value)?;
        Ok(predicate(record))
    }
}

/// Operator-level selectivity, widened for set membership by operand size
pub fn default_selectivity(operator: Operator, value: &Value) -> f64 {
    let set_size = value.as_array().map(|a| a.len().max(1)).unwrap_or(1) as f64;
    let estimate = match operator {
        Operator::In => Operator::In.base_selectivity() * set_size,
        Operator::NotIn => 1.0 - Operator::In.base_selectivity() * set_size,
        other => other.base_selectivity(),
    };
    estimate.clamp(0.0, 1.0)
}

fn ensure_supported(field: Field, operator: Operator) -> Result<(), FilterError> {
    if supported_operators(field).contains(&operator) {
        Ok(())
    } else {
        Err(FilterError::UnsupportedOperator {
            field: field.to_string(),
            operator: operator.to_string(),
        })
    }
}

fn invalid_value(field: Field, operator: Operator, value: &Value, reason: impl Into<String>) -> FilterError {
    FilterError::InvalidValue {
        field: field.to_string(),
        operator: operator.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Elements of a non-empty array operand (`in` / `notIn`)
fn non_empty_list(value: &Value) -> Result<&[Value], String> {
    match value.as_array() {
        Some(items) if !items.is_empty() => Ok(items),
        Some(_) => Err("expected at least one value".to_string()),
        None => Err("expected an array of values".to_string()),
    }
}
