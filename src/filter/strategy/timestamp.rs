use super::ordered::OrderedOperand;
use super::{FieldStrategy, Predicate, ensure_supported, invalid_value};
use crate::filter::catalog::{Field, Operator};
use crate::filter::error::FilterError;
use crate::record::LogRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use std::sync::Arc;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Accepts RFC 3339, naive date-times (taken as UTC), or bare dates (midnight UTC)
pub fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, String> {
    let text = value
        .as_str()
        .ok_or_else(|| "expected a date/time string".to_string())?
        .trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| format!("'{text}' is not a recognized date/time"))
}

#[derive(Debug, Clone)]
pub struct TimestampStrategy {
    operator: Operator,
}

impl TimestampStrategy {
    pub fn new(operator: Operator) -> Result<Self, FilterError> {
        ensure_supported(Field::Timestamp, operator)?;
        Ok(Self { operator })
    }
}

impl FieldStrategy for TimestampStrategy {
    fn field(&self) -> Field {
        Field::Timestamp
    }

    fn operator(&self) -> Operator {
        self.operator
    }

    fn compile(&self, value: &Value) -> Result<Predicate, FilterError> {
        let operator = self.operator;
        let operand = OrderedOperand::parse(operator, value, parse_timestamp)
            .map_err(|reason| invalid_value(Field::Timestamp, operator, value, reason))?;

        Ok(Arc::new(move |record: &LogRecord| {
            operand.test(operator, &record.timestamp.with_timezone(&Utc))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_at(ts: &str) -> LogRecord {
        LogRecord {
            source: "app.log".to_string(),
            line_number: 1,
            timestamp: DateTime::parse_from_rfc3339(ts).expect("valid RFC3339 timestamp"),
            level: "INFO".to_string(),
            message: "hello".to_string(),
            node: String::new(),
            process_id: None,
            username: None,
        }
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parse_timestamp(&json!("2026-01-02T03:04:05Z")), Ok(expected));
        assert_eq!(parse_timestamp(&json!("2026-01-02 03:04:05")), Ok(expected));
        assert_eq!(
            parse_timestamp(&json!("2026-01-02T05:04:05+02:00")),
            Ok(expected)
        );
        assert!(parse_timestamp(&json!("2026-01-02")).is_ok());
        assert!(parse_timestamp(&json!("yesterday")).is_err());
        assert!(parse_timestamp(&json!(12345)).is_err());
    }

    #[test]
    fn test_between_accepts_range_across_offsets() {
        let strategy = TimestampStrategy::new(Operator::Between).unwrap();
        let range = json!(["2026-01-01T00:00:00Z", "2026-01-01T12:00:00Z"]);

        assert!(strategy.matches(&record_at("2026-01-01T13:00:00+02:00"), &range).unwrap());
        assert!(!strategy.matches(&record_at("2026-01-01T12:00:01Z"), &range).unwrap());
    }

    #[test]
    fn test_rejects_unsupported_operator() {
        assert!(TimestampStrategy::new(Operator::Contains).is_err());
    }

    #[test]
    fn test_invalid_values() {
        let strategy = TimestampStrategy::new(Operator::Between).unwrap();
        assert!(!strategy.is_valid_value(&json!("2026-01-01")));
        assert!(!strategy.is_valid_value(&json!(["2026-01-02", "2026-01-01"])));
        assert!(strategy.is_valid_value(&json!(["2026-01-01", "2026-01-02"])));
    }
}
