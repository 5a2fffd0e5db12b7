use chrono::DateTime;
use log_filter::filter::{FilterError, FilterExpression, MatchOptions, StrategyFactory};
use log_filter::record::LogRecord;
use serde_json::{Value, json};

fn create_test_record(node: &str, level: &str, message: &str) -> LogRecord {
    LogRecord {
        source: "test.log".to_string(),
        line_number: 1,
        timestamp: DateTime::parse_from_rfc3339("2026-01-01T12:00:00+02:00").unwrap(),
        level: level.to_string(),
        message: message.to_string(),
        node: node.to_string(),
        process_id: Some(4242),
        username: Some("Alice".to_string()),
    }
}

fn matches(factory: StrategyFactory, field: &str, operator: &str, value: Value, record: &LogRecord) -> bool {
    let strategy = factory.create_strategy(field, operator).unwrap();
    FilterExpression::leaf(strategy, value).unwrap().matches(record)
}

fn sensitive() -> StrategyFactory {
    StrategyFactory::new(MatchOptions {
        case_sensitive: true,
    })
}

#[test]
fn test_node_filter_is_case_insensitive() {
    let record = create_test_record("Broker-East", "INFO", "test message");
    let factory = StrategyFactory::default();

    assert!(matches(factory, "Node", "equals", json!("broker-east"), &record));
    assert!(matches(factory, "host", "startsWith", json!("BROKER"), &record));
    assert!(matches(factory, "Node", "in", json!(["x", "BROKER-EAST"]), &record));
}

#[test]
fn test_level_filter_is_case_insensitive() {
    let record = create_test_record("node", "ERROR", "test message");
    let factory = StrategyFactory::default();

    assert!(matches(factory, "Level", "equals", json!("error"), &record));
    assert!(matches(factory, "Level", "equals", json!("ErRoR"), &record));
    assert!(matches(factory, "lvl", "greaterOrEqual", json!("WARNING"), &record));
}

#[test]
fn test_message_filter_is_case_insensitive() {
    let record = create_test_record("node", "INFO", "Connection Timeout Error");
    let factory = StrategyFactory::default();

    assert!(matches(factory, "Message", "contains", json!("timeout"), &record));
    assert!(matches(factory, "msg", "endsWith", json!("error"), &record));
    assert!(matches(factory, "Message", "regex", json!("^connection"), &record));
    assert!(!matches(factory, "Message", "notContains", json!("TIMEOUT"), &record));
}

#[test]
fn test_case_sensitive_option_is_honored() {
    let record = create_test_record("node", "INFO", "Connection Timeout Error");

    assert!(!matches(sensitive(), "Message", "contains", json!("timeout"), &record));
    assert!(matches(sensitive(), "Message", "contains", json!("Timeout"), &record));
    assert!(!matches(sensitive(), "Username", "equals", json!("alice"), &record));
    assert!(!matches(sensitive(), "Message", "regex", json!("^connection"), &record));
}

#[test]
fn test_level_names_match_regardless_of_case_option() {
    let record = create_test_record("node", "warning", "disk almost full");

    assert!(matches(sensitive(), "Level", "equals", json!("WARN"), &record));
}

#[test]
fn test_missing_username_only_matches_negated_operators() {
    let mut record = create_test_record("node", "INFO", "anonymous request");
    record.username = None;
    let factory = StrategyFactory::default();

    assert!(!matches(factory, "Username", "equals", json!("alice"), &record));
    assert!(!matches(factory, "Username", "contains", json!(""), &record));
    assert!(matches(factory, "Username", "notEquals", json!("alice"), &record));
    assert!(matches(factory, "user", "notIn", json!(["alice", "bob"]), &record));
}

#[test]
fn test_one_off_strategy_match_agrees_with_compiled_leaf() {
    let factory = StrategyFactory::default();
    let record = create_test_record("web-1", "WARN", "disk nearly full");
    let cases = [
        ("Level", "greaterOrEqual", json!("info")),
        ("Message", "regex", json!("full$")),
        ("Node", "in", json!(["web-2", "web-3"])),
        ("ProcessId", "between", json!([4000, 5000])),
    ];

    for (field, operator, value) in cases {
        let strategy = factory.create_strategy(field, operator).unwrap();
        let one_off = strategy.matches(&record, &value).unwrap();
        assert_eq!(
            one_off,
            matches(factory, field, operator, value.clone(), &record),
            "{field} {operator} {value}"
        );
    }

    let strategy = factory.create_strategy("Message", "regex").unwrap();
    assert!(matches!(
        strategy.matches(&record, &json!("(unclosed")),
        Err(FilterError::InvalidValue { .. })
    ));
}
