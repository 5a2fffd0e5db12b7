use super::catalog::{self, FieldMetadataProvider, Operator};
use super::criterion::FilterCriterion;
use super::error::FilterError;
use super::expression::FilterExpression;
use super::factory::StrategyFactory;
use super::strategy::MatchOptions;
use super::stream::{self, RecordStream};
use super::validation::ValidationResult;
use crate::record::LogRecord;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Weight of computational cost relative to selectivity when ordering
const COST_WEIGHT: f64 = 0.1;

/// One criterion with the numbers that decided its position
#[derive(Debug, Clone, Serialize)]
pub struct PlannedCriterion {
    pub criterion: FilterCriterion,
    pub selectivity: f64,
    pub cost: f64,
    pub score: f64,
}

/// Validates flat criteria, compiles them into expression trees and streams
/// records through them.
///
/// Trees are built per call and never cached.
#[derive(Debug, Clone, Default)]
pub struct FilterService {
    factory: StrategyFactory,
    metadata: FieldMetadataProvider,
}

impl FilterService {
    pub fn new(options: MatchOptions) -> Self {
        Self {
            factory: StrategyFactory::new(options),
            metadata: FieldMetadataProvider::new(),
        }
    }

    pub fn factory(&self) -> &StrategyFactory {
        &self.factory
    }

    pub fn metadata(&self) -> &FieldMetadataProvider {
        &self.metadata
    }

    /// Stream `records` through an already-built expression.
    ///
    /// The first error (a bad upstream record, cancellation) is yielded and
    /// ends the stream.
    pub fn apply_filter<'a, I>(
        &self,
        records: I,
        expression: &FilterExpression,
        cancel: &CancellationToken,
    ) -> RecordStream<'a>
    where
        I: IntoIterator<Item = Result<LogRecord, FilterError>>,
        I::IntoIter: 'a,
    {
        let source: RecordStream<'a> = Box::new(records.into_iter());
        stream::abort_on_error(expression.evaluate(source, cancel))
    }

    /// Validate `criteria`, build a cost-ordered AND tree and apply it.
    ///
    /// Fails with `InvalidCriteria` carrying every validation error when any
    /// criterion is invalid.
    pub fn apply_simple_filters<'a, I>(
        &self,
        records: I,
        criteria: &[FilterCriterion],
        cancel: &CancellationToken,
    ) -> Result<RecordStream<'a>, FilterError>
    where
        I: IntoIterator<Item = Result<LogRecord, FilterError>>,
        I::IntoIter: 'a,
    {
        let validation = self.validate_filter_criteria(criteria);
        if !validation.is_valid {
            return Err(FilterError::InvalidCriteria(validation.errors));
        }
        let expression = self.build_expression(criteria)?;
        tracing::debug!(filter = %expression, "applying filter");
        Ok(self.apply_filter(records, &expression, cancel))
    }

    /// Compile criteria into an expression: one criterion becomes a leaf,
    /// several become an AND whose children follow [`Self::plan`].
    pub fn build_expression(
        &self,
        criteria: &[FilterCriterion],
    ) -> Result<FilterExpression, FilterError> {
        if let [single] = criteria {
            return self.leaf(single);
        }

        let children = self
            .plan(criteria)?
            .iter()
            .map(|planned| self.leaf(&planned.criterion))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FilterExpression::and_planned(children))
    }

    /// Order criteria ascending by `selectivity + 0.1 * cost`.
    ///
    /// Cheap, narrowing predicates run first so expensive ones see fewer
    /// records. The sort is stable: equal scores keep input order.
    pub fn plan(&self, criteria: &[FilterCriterion]) -> Result<Vec<PlannedCriterion>, FilterError> {
        let mut planned = criteria
            .iter()
            .map(|criterion| -> Result<PlannedCriterion, FilterError> {
                let (field, operator) = catalog::resolve(&criterion.field, &criterion.operator)?;
                let strategy = self
                    .factory
                    .create_strategy(&criterion.field, &criterion.operator)?;
                let selectivity = strategy.estimate_selectivity(&criterion.value);
                let cost = catalog::computational_cost(field, operator);
                Ok(PlannedCriterion {
                    criterion: criterion.clone(),
                    selectivity,
                    cost,
                    score: selectivity + COST_WEIGHT * cost,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        planned.sort_by(|a, b| a.score.total_cmp(&b.score));
        for (position, p) in planned.iter().enumerate() {
            tracing::debug!(
                position,
                criterion = %p.criterion,
                selectivity = p.selectivity,
                cost = p.cost,
                score = p.score,
                "planned filter criterion"
            );
        }
        Ok(planned)
    }

    /// Check every criterion and report all problems at once
    pub fn validate_filter_criteria(&self, criteria: &[FilterCriterion]) -> ValidationResult {
        let mut result = ValidationResult::new();
        let mut seen: Vec<(usize, &FilterCriterion)> = Vec::new();

        for (idx, criterion) in criteria.iter().enumerate() {
            let label = format!("Criterion {}", idx + 1);

            if criterion.field.trim().is_empty() {
                result.add_error(format!("{label}: field is required"));
                continue;
            }
            if criterion.operator.trim().is_empty() {
                result.add_error(format!("{label}: operator is required"));
                continue;
            }
            if !self.metadata.is_field_supported(&criterion.field) {
                result.add_error(format!(
                    "{label}: Unsupported field '{}'. Available fields: {}",
                    criterion.field,
                    self.metadata.available_fields().join(", ")
                ));
                continue;
            }
            if !self
                .metadata
                .is_operator_supported(&criterion.field, &criterion.operator)
            {
                result.add_error(format!(
                    "{label}: Operator '{}' is not supported for field '{}'. Supported operators: {}",
                    criterion.operator,
                    criterion.field,
                    self.metadata.available_operators(&criterion.field).join(", ")
                ));
                continue;
            }

            let strategy = match self
                .factory
                .create_strategy(&criterion.field, &criterion.operator)
            {
                Ok(strategy) => strategy,
                Err(e) => {
                    result.add_error(format!("{label}: {e}"));
                    continue;
                }
            };
            if let Err(e) = strategy.compile(&criterion.value) {
                result.add_error(format!("{label}: {e}"));
                continue;
            }

            let operator = strategy.operator();
            let empty_operand = criterion.value.as_str().is_some_and(str::is_empty);
            match operator {
                Operator::Contains | Operator::StartsWith | Operator::EndsWith if empty_operand => {
                    result.add_warning(format!(
                        "{label}: empty value for '{operator}' matches every record"
                    ));
                }
                Operator::NotContains if empty_operand => {
                    result.add_warning(format!(
                        "{label}: empty value for '{operator}' matches no record"
                    ));
                }
                Operator::Regex => {
                    result.add_warning(format!(
                        "{label}: regular expressions are the most expensive filters and run after cheaper ones"
                    ));
                }
                _ => {}
            }

            let duplicate = seen.iter().find(|(_, other)| {
                catalog::resolve(&other.field, &other.operator).ok()
                    == Some((strategy.field(), operator))
                    && other.value == criterion.value
            });
            if let Some((first, _)) = duplicate {
                result.add_warning(format!("{label} duplicates criterion {}", first + 1));
            }
            seen.push((idx, criterion));
        }

        result
    }

    pub fn available_fields(&self) -> Vec<&'static str> {
        self.metadata.available_fields()
    }

    pub fn available_operators(&self, field: &str) -> Vec<&'static str> {
        self.metadata.available_operators(field)
    }

    fn leaf(&self, criterion: &FilterCriterion) -> Result<FilterExpression, FilterError> {
        let strategy = self
            .factory
            .create_strategy(&criterion.field, &criterion.operator)?;
        FilterExpression::leaf(strategy, criterion.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn criterion(field: &str, operator: &str, value: serde_json::Value) -> FilterCriterion {
        FilterCriterion::new(field, operator, value)
    }

    #[test]
    fn test_plan_runs_cheap_selective_criteria_first() {
        let service = FilterService::default();
        let planned = service
            .plan(&[
                criterion("Message", "contains", json!("timeout")),
                criterion("Level", "equals", json!("error")),
            ])
            .unwrap();

        assert_eq!(planned[0].criterion.field, "Level");
        assert_eq!(planned[1].criterion.field, "Message");
        assert!(planned[0].score < planned[1].score);
    }

    #[test]
    fn test_cost_breaks_selectivity_ties() {
        let service = FilterService::default();
        let planned = service
            .plan(&[
                criterion("Message", "regex", json!("time.*out")),
                criterion("Node", "startsWith", json!("db")),
            ])
            .unwrap();

        assert_eq!(planned[0].criterion.field, "Node");
    }

    #[test]
    fn test_built_and_executes_in_planned_order() {
        let service = FilterService::default();
        let levels = json!(["trace", "debug", "info", "warn", "error", "fatal", "warning"]);
        let criteria = [
            criterion("Message", "regex", json!("time.*out")),
            criterion("Level", "in", levels),
        ];

        let planned = service.plan(&criteria).unwrap();
        assert_eq!(planned[0].criterion.field, "Level");
        assert!(planned[0].selectivity > planned[1].selectivity);

        let expr = service.build_expression(&criteria).unwrap();
        let FilterExpression::Composite(c) = &expr else {
            panic!("expected a composite");
        };
        let order: Vec<String> = c.execution_order().iter().map(|e| e.description()).collect();
        assert!(order[0].starts_with("Level in"), "{order:?}");
        assert!(order[1].starts_with("Message regex"), "{order:?}");
    }

    #[test]
    fn test_single_criterion_builds_leaf() {
        let service = FilterService::default();
        let expr = service
            .build_expression(&[criterion("Level", "equals", json!("error"))])
            .unwrap();
        assert!(matches!(expr, FilterExpression::Leaf(_)));
    }

    #[test]
    fn test_validation_collects_every_error() {
        let service = FilterService::default();
        let result = service.validate_filter_criteria(&[
            criterion("Color", "equals", json!("red")),
            criterion("Level", "contains", json!("err")),
            criterion("ProcessId", "equals", json!("abc")),
            criterion("", "equals", json!("x")),
            criterion("Level", "equals", json!("error")),
        ]);

        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 4, "errors: {:?}", result.errors);
        assert!(result.errors[0].starts_with("Criterion 1: Unsupported field 'Color'"));
        assert!(result.errors[1].contains("not supported for field 'Level'"));
        assert!(result.errors[2].starts_with("Criterion 3"));
        assert!(result.errors[3].contains("field is required"));
    }

    #[test]
    fn test_validation_warnings() {
        let service = FilterService::default();
        let result = service.validate_filter_criteria(&[
            criterion("Message", "contains", json!("")),
            criterion("level", "eq", json!("error")),
            criterion("Level", "equals", json!("error")),
            criterion("Message", "regex", json!("a+")),
        ]);

        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 3, "warnings: {:?}", result.warnings);
        assert!(result.warnings[1].contains("Criterion 3 duplicates criterion 2"));
    }
}
