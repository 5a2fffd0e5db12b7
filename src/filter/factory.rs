use super::catalog::{self, Field};
use super::error::FilterError;
use super::strategy::{
    FieldStrategy, LevelStrategy, MatchOptions, ProcessIdStrategy, TextStrategy,
    TimestampStrategy,
};
use std::sync::Arc;

/// Builds the strategy for a (field, operator) pair.
///
/// Holds no mutable state; one instance can be shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyFactory {
    options: MatchOptions,
}

impl StrategyFactory {
    pub fn new(options: MatchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> MatchOptions {
        self.options
    }

    pub fn create_strategy(
        &self,
        field: &str,
        operator: &str,
    ) -> Result<Arc<dyn FieldStrategy>, FilterError> {
        let (field, operator) = catalog::resolve(field, operator)?;
        let strategy: Arc<dyn FieldStrategy> = match field {
            Field::Timestamp => Arc::new(TimestampStrategy::new(operator)?),
            Field::Level => Arc::new(LevelStrategy::new(operator)?),
            Field::ProcessId => Arc::new(ProcessIdStrategy::new(operator)?),
            Field::Message | Field::Node | Field::Username => {
                Arc::new(TextStrategy::new(field, operator, self.options)?)
            }
        };
        Ok(strategy)
    }

    pub fn is_field_supported(&self, field: &str) -> bool {
        field.parse::<Field>().is_ok()
    }

    pub fn is_operator_supported(&self, field: &str, operator: &str) -> bool {
        catalog::resolve(field, operator).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::catalog::{Operator, supported_operators};

    #[test]
    fn test_creates_every_catalog_pair() {
        let factory = StrategyFactory::default();
        for field in Field::ALL {
            for op in supported_operators(field) {
                let strategy = factory
                    .create_strategy(field.canonical_name(), op.canonical_name())
                    .expect("catalog pair should be constructible");
                assert_eq!(strategy.field(), field);
                assert_eq!(strategy.operator(), *op);
            }
        }
    }

    #[test]
    fn test_unsupported_pairs() {
        let factory = StrategyFactory::default();
        assert!(matches!(
            factory.create_strategy("Color", "equals"),
            Err(FilterError::UnsupportedField(_))
        ));
        assert!(matches!(
            factory.create_strategy("Level", "regex"),
            Err(FilterError::UnsupportedOperator { .. })
        ));
        assert!(matches!(
            factory.create_strategy("Level", "bogus"),
            Err(FilterError::UnsupportedOperator { .. })
        ));
        assert!(!factory.is_operator_supported("ProcessId", "contains"));
        assert!(factory.is_operator_supported("pid", "between"));
        assert_eq!(Operator::Between.canonical_name(), "between");
    }
}
