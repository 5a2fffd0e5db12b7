use super::error::FilterError;
use super::strategy::{FieldStrategy, Predicate};
use super::stream::{self, ComplementStream, RecordStream, UnionStream};
use crate::record::LogRecord;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Logical operator of a composite expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "AND"),
            LogicalOperator::Or => write!(f, "OR"),
            LogicalOperator::Not => write!(f, "NOT"),
        }
    }
}

/// A filter predicate tree
#[derive(Debug, Clone)]
pub enum FilterExpression {
    Leaf(LeafExpression),
    Composite(CompositeExpression),
}

/// One strategy with its bound operand
#[derive(Clone)]
pub struct LeafExpression {
    strategy: Arc<dyn FieldStrategy>,
    value: Value,
    predicate: Predicate,
}

impl LeafExpression {
    /// Bind `value` to `strategy`. Fails if the strategy rejects the value,
    /// so an invalid operand never reaches per-record matching.
    pub fn new(strategy: Arc<dyn FieldStrategy>, value: Value) -> Result<Self, FilterError> {
        let predicate = strategy.compile(&value)?;
        Ok(Self {
            strategy,
            value,
            predicate,
        })
    }

    pub fn strategy(&self) -> &dyn FieldStrategy {
        self.strategy.as_ref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn selectivity(&self) -> f64 {
        self.strategy.estimate_selectivity(&self.value).clamp(0.0, 1.0)
    }

    pub fn description(&self) -> String {
        format!(
            "{} {} {}",
            self.strategy.field_name(),
            self.strategy.operator_name(),
            self.value
        )
    }
}

impl fmt::Debug for LeafExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafExpression")
            .field("strategy", &self.strategy)
            .field("value", &self.value)
            .finish()
    }
}

/// Children combined with AND / OR / NOT
#[derive(Debug, Clone)]
pub struct CompositeExpression {
    operator: LogicalOperator,
    children: Vec<FilterExpression>,
    /// AND children already arrive in evaluation order
    planned: bool,
}

impl CompositeExpression {
    /// NOT takes exactly one child. AND / OR with no children pass every
    /// record through.
    pub fn new(
        operator: LogicalOperator,
        children: Vec<FilterExpression>,
    ) -> Result<Self, FilterError> {
        if operator == LogicalOperator::Not && children.len() != 1 {
            return Err(FilterError::InvalidStructure(format!(
                "NOT requires exactly one child, got {}",
                children.len()
            )));
        }
        Ok(Self {
            operator,
            children,
            planned: false,
        })
    }

    pub fn operator(&self) -> LogicalOperator {
        self.operator
    }

    pub fn children(&self) -> &[FilterExpression] {
        &self.children
    }

    /// Order in which an AND pipeline runs its children: as given when the
    /// tree was planned, otherwise most selective first (stable).
    pub fn execution_order(&self) -> Vec<&FilterExpression> {
        let mut ordered: Vec<&FilterExpression> = self.children.iter().collect();
        if self.operator == LogicalOperator::And && !self.planned {
            ordered.sort_by(|a, b| a.selectivity().total_cmp(&b.selectivity()));
        }
        ordered
    }
}

impl FilterExpression {
    pub fn leaf(strategy: Arc<dyn FieldStrategy>, value: Value) -> Result<Self, FilterError> {
        LeafExpression::new(strategy, value).map(FilterExpression::Leaf)
    }

    pub fn and(children: Vec<FilterExpression>) -> Self {
        FilterExpression::Composite(CompositeExpression {
            operator: LogicalOperator::And,
            children,
            planned: false,
        })
    }

    /// AND whose children are evaluated exactly in the given order
    pub fn and_planned(children: Vec<FilterExpression>) -> Self {
        FilterExpression::Composite(CompositeExpression {
            operator: LogicalOperator::And,
            children,
            planned: true,
        })
    }

    pub fn or(children: Vec<FilterExpression>) -> Self {
        FilterExpression::Composite(CompositeExpression {
            operator: LogicalOperator::Or,
            children,
            planned: false,
        })
    }

    pub fn not(child: FilterExpression) -> Self {
        FilterExpression::Composite(CompositeExpression {
            operator: LogicalOperator::Not,
            children: vec![child],
            planned: false,
        })
    }

    /// Estimated fraction of input that passes, in [0, 1].
    ///
    /// AND multiplies child estimates, OR takes the independent union
    /// `1 - prod(1 - s)`, NOT takes `1 - s`.
    pub fn selectivity(&self) -> f64 {
        match self {
            FilterExpression::Leaf(leaf) => leaf.selectivity(),
            FilterExpression::Composite(c) if c.children.is_empty() => 1.0,
            FilterExpression::Composite(c) => match c.operator {
                LogicalOperator::And => c.children.iter().map(Self::selectivity).product(),
                LogicalOperator::Or => {
                    1.0 - c
                        .children
                        .iter()
                        .map(|child| 1.0 - child.selectivity())
                        .product::<f64>()
                }
                LogicalOperator::Not => 1.0 - c.children[0].selectivity(),
            },
        }
    }

    pub fn description(&self) -> String {
        match self {
            FilterExpression::Leaf(leaf) => leaf.description(),
            FilterExpression::Composite(c) if c.children.is_empty() => "(all records)".to_string(),
            FilterExpression::Composite(c) if c.operator == LogicalOperator::Not => {
                format!("NOT ({})", c.children[0].description())
            }
            FilterExpression::Composite(c) => {
                let separator = format!(" {} ", c.operator);
                let parts: Vec<String> = c.children.iter().map(Self::description).collect();
                format!("({})", parts.join(&separator))
            }
        }
    }

    /// Evaluate against a single record
    pub fn matches(&self, record: &LogRecord) -> bool {
        match self {
            FilterExpression::Leaf(leaf) => (leaf.predicate)(record),
            FilterExpression::Composite(c) => match c.operator {
                LogicalOperator::And => c.children.iter().all(|child| child.matches(record)),
                LogicalOperator::Or if c.children.is_empty() => true,
                LogicalOperator::Or => c.children.iter().any(|child| child.matches(record)),
                LogicalOperator::Not => !c.children[0].matches(record),
            },
        }
    }

    /// Lazily filter `source`.
    ///
    /// Leaves and AND stream without buffering; AND runs its children as a
    /// pipeline in [`CompositeExpression::execution_order`]. OR and NOT
    /// buffer the source (see
    /// [`UnionStream`] and [`ComplementStream`]).
    pub fn evaluate<'a>(
        &self,
        source: RecordStream<'a>,
        cancel: &CancellationToken,
    ) -> RecordStream<'a> {
        let source = stream::cancellable(source, cancel);
        match self {
            FilterExpression::Leaf(leaf) => {
                let predicate = Arc::clone(&leaf.predicate);
                Box::new(source.filter(move |item| match item {
                    Ok(record) => predicate(record),
                    Err(_) => true,
                }))
            }
            FilterExpression::Composite(c) if c.children.is_empty() => source,
            FilterExpression::Composite(c) => match c.operator {
                LogicalOperator::And => c
                    .execution_order()
                    .into_iter()
                    .fold(source, |upstream, child| child.evaluate(upstream, cancel)),
                LogicalOperator::Or => Box::new(UnionStream::new(c.children.clone(), source, cancel)),
                LogicalOperator::Not => Box::new(ComplementStream::new(
                    c.children[0].clone(),
                    source,
                    cancel,
                )),
            },
        }
    }
}

impl From<LeafExpression> for FilterExpression {
    fn from(leaf: LeafExpression) -> Self {
        FilterExpression::Leaf(leaf)
    }
}

impl From<CompositeExpression> for FilterExpression {
    fn from(composite: CompositeExpression) -> Self {
        FilterExpression::Composite(composite)
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}
