use super::non_empty_list;
use crate::filter::catalog::Operator;
use serde_json::Value;

/// Operand of an ordered field (timestamps, process ids, severities)
#[derive(Debug, Clone, PartialEq)]
pub(super) enum OrderedOperand<T> {
    Single(T),
    /// Inclusive `[low, high]`
    Range(T, T),
    Set(Vec<T>),
}

impl<T: PartialOrd> OrderedOperand<T> {
    /// Parse an operand of the shape the operator expects
    pub(super) fn parse<F>(operator: Operator, value: &Value, parse_one: F) -> Result<Self, String>
    where
        F: Fn(&Value) -> Result<T, String>,
    {
        match operator {
            Operator::Between => {
                let bounds = value
                    .as_array()
                    .filter(|items| items.len() == 2)
                    .ok_or_else(|| "expected a two-element array [from, to]".to_string())?;
                let low = parse_one(&bounds[0])?;
                let high = parse_one(&bounds[1])?;
                if low > high {
                    return Err("lower bound must not exceed upper bound".to_string());
                }
                Ok(OrderedOperand::Range(low, high))
            }
            Operator::In | Operator::NotIn => non_empty_list(value)?
                .iter()
                .map(parse_one)
                .collect::<Result<Vec<_>, _>>()
                .map(OrderedOperand::Set),
            _ => parse_one(value).map(OrderedOperand::Single),
        }
    }

    /// Apply `operator` to an actual value
    pub(super) fn test(&self, operator: Operator, actual: &T) -> bool {
        match (operator, self) {
            (Operator::Equals, OrderedOperand::Single(v)) => actual == v,
            (Operator::NotEquals, OrderedOperand::Single(v)) => actual != v,
            (Operator::GreaterThan, OrderedOperand::Single(v)) => actual > v,
            (Operator::LessThan, OrderedOperand::Single(v)) => actual < v,
            (Operator::GreaterOrEqual, OrderedOperand::Single(v)) => actual >= v,
            (Operator::LessOrEqual, OrderedOperand::Single(v)) => actual <= v,
            (Operator::Between, OrderedOperand::Range(low, high)) => actual >= low && actual <= high,
            (Operator::In, OrderedOperand::Set(values)) => values.iter().any(|v| v == actual),
            (Operator::NotIn, OrderedOperand::Set(values)) => values.iter().all(|v| v != actual),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn int(value: &Value) -> Result<i64, String> {
        value.as_i64().ok_or_else(|| "expected an integer".to_string())
    }

    #[test]
    fn test_between_is_inclusive() {
        let operand = OrderedOperand::parse(Operator::Between, &json!([10, 20]), int).unwrap();
        assert!(operand.test(Operator::Between, &10));
        assert!(operand.test(Operator::Between, &20));
        assert!(!operand.test(Operator::Between, &21));
    }

    #[test]
    fn test_between_rejects_inverted_or_wrong_arity() {
        assert!(OrderedOperand::parse(Operator::Between, &json!([20, 10]), int).is_err());
        assert!(OrderedOperand::parse(Operator::Between, &json!([1, 2, 3]), int).is_err());
        assert!(OrderedOperand::parse(Operator::Between, &json!(5), int).is_err());
    }

    #[test]
    fn test_set_membership() {
        let operand = OrderedOperand::parse(Operator::NotIn, &json!([1, 2]), int).unwrap();
        assert!(!operand.test(Operator::NotIn, &2));
        assert!(operand.test(Operator::NotIn, &3));
        assert!(OrderedOperand::parse(Operator::In, &json!([]), int).is_err());
    }
}
