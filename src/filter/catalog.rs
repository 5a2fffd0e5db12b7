use super::error::FilterError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Record fields that can be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Timestamp,
    Level,
    Message,
    Node,
    ProcessId,
    Username,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Timestamp,
        Field::Level,
        Field::Message,
        Field::Node,
        Field::ProcessId,
        Field::Username,
    ];

    /// Get the canonical name of this field
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Field::Timestamp => "Timestamp",
            Field::Level => "Level",
            Field::Message => "Message",
            Field::Node => "Node",
            Field::ProcessId => "ProcessId",
            Field::Username => "Username",
        }
    }
}

impl FromStr for Field {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "timestamp" | "time" | "ts" => Ok(Field::Timestamp),
            "level" | "lvl" => Ok(Field::Level),
            "message" | "msg" => Ok(Field::Message),
            "node" | "host" => Ok(Field::Node),
            "processid" | "process_id" | "pid" => Ok(Field::ProcessId),
            "username" | "user" => Ok(Field::Username),
            _ => Err(FilterError::UnsupportedField(s.to_string())),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Comparison operators a criterion can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Between,
    In,
    NotIn,
    Regex,
}

impl Operator {
    /// Get the canonical name of this operator
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "notEquals",
            Operator::Contains => "contains",
            Operator::NotContains => "notContains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::GreaterThan => "greaterThan",
            Operator::LessThan => "lessThan",
            Operator::GreaterOrEqual => "greaterOrEqual",
            Operator::LessOrEqual => "lessOrEqual",
            Operator::Between => "between",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Regex => "regex",
        }
    }

    /// Whether the operator selects records that do NOT match its operand
    pub fn is_negated(&self) -> bool {
        matches!(
            self,
            Operator::NotEquals | Operator::NotContains | Operator::NotIn
        )
    }

    /// Static selectivity estimate: expected fraction of records that pass.
    ///
    /// Only the relative ordering matters; no live statistics are consulted.
    pub fn base_selectivity(&self) -> f64 {
        match self {
            Operator::Equals => 0.05,
            Operator::NotEquals => 0.95,
            Operator::Contains => 0.35,
            Operator::NotContains => 0.65,
            Operator::StartsWith | Operator::EndsWith => 0.3,
            Operator::GreaterThan
            | Operator::LessThan
            | Operator::GreaterOrEqual
            | Operator::LessOrEqual => 0.5,
            Operator::Between => 0.2,
            Operator::In => 0.05,
            Operator::NotIn => 0.95,
            Operator::Regex => 0.3,
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equals" | "eq" | "=" | "==" => Ok(Operator::Equals),
            "notequals" | "ne" | "!=" => Ok(Operator::NotEquals),
            "contains" => Ok(Operator::Contains),
            "notcontains" => Ok(Operator::NotContains),
            "startswith" => Ok(Operator::StartsWith),
            "endswith" => Ok(Operator::EndsWith),
            "greaterthan" | "gt" | ">" => Ok(Operator::GreaterThan),
            "lessthan" | "lt" | "<" => Ok(Operator::LessThan),
            "greaterorequal" | "ge" | ">=" => Ok(Operator::GreaterOrEqual),
            "lessorequal" | "le" | "<=" => Ok(Operator::LessOrEqual),
            "between" => Ok(Operator::Between),
            "in" => Ok(Operator::In),
            "notin" => Ok(Operator::NotIn),
            "regex" | "matches" | "~" => Ok(Operator::Regex),
            _ => Err(format!("Unknown operator '{s}'")),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Kind of value a field holds, for UI population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Timestamp,
    Level,
    Text,
    Integer,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Timestamp => write!(f, "timestamp"),
            ValueKind::Level => write!(f, "level"),
            ValueKind::Text => write!(f, "text"),
            ValueKind::Integer => write!(f, "integer"),
        }
    }
}

/// Descriptive metadata for one filterable field
#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: ValueKind,
    pub description: &'static str,
    pub operators: Vec<&'static str>,
}

use Operator::*;

const TIMESTAMP_OPS: &[Operator] = &[
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Between,
];
const LEVEL_OPS: &[Operator] = &[Equals, NotEquals, In, NotIn, GreaterOrEqual, LessOrEqual];
const MESSAGE_OPS: &[Operator] = &[
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Regex,
];
const NODE_OPS: &[Operator] = &[
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    Regex,
];
const PROCESS_ID_OPS: &[Operator] = &[
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Between,
    In,
    NotIn,
];
const USERNAME_OPS: &[Operator] = &[
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
];

/// Operators allowed for a field. The strategy factory and the metadata
/// provider both read this table.
pub fn supported_operators(field: Field) -> &'static [Operator] {
    match field {
        Field::Timestamp => TIMESTAMP_OPS,
        Field::Level => LEVEL_OPS,
        Field::Message => MESSAGE_OPS,
        Field::Node => NODE_OPS,
        Field::ProcessId => PROCESS_ID_OPS,
        Field::Username => USERNAME_OPS,
    }
}

/// Resolve a (field, operator) name pair against the catalog
pub fn resolve(field: &str, operator: &str) -> Result<(Field, Operator), FilterError> {
    let field: Field = field.parse()?;
    let unsupported = || FilterError::UnsupportedOperator {
        field: field.to_string(),
        operator: operator.to_string(),
    };
    let op: Operator = operator.parse().map_err(|_| unsupported())?;
    if supported_operators(field).contains(&op) {
        Ok((field, op))
    } else {
        Err(unsupported())
    }
}

/// Static computational cost weight for evaluating an operator on a field.
///
/// Cheap: enum/number comparisons (~0.1). Moderate: prefix and substring scans
/// (0.2-0.4, higher on the long message field). Expensive: regex (0.8).
pub fn computational_cost(field: Field, operator: Operator) -> f64 {
    let text_scan = match field {
        Field::Message => 0.4,
        _ => 0.3,
    };
    match (field, operator) {
        (_, Regex) => 0.8,
        (Field::Level | Field::ProcessId | Field::Timestamp, Between) => 0.15,
        (Field::Level | Field::ProcessId | Field::Timestamp, _) => 0.1,
        (_, Equals | NotEquals) => 0.15,
        (_, In | NotIn) => 0.2,
        (_, StartsWith | EndsWith) => 0.2,
        (_, Contains | NotContains) => text_scan,
        _ => 0.2,
    }
}

/// Answers "which fields and operators exist" for UI population and
/// validation. Backed by the same table as the strategy factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMetadataProvider;

impl FieldMetadataProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn is_field_supported(&self, field: &str) -> bool {
        field.parse::<Field>().is_ok()
    }

    pub fn is_operator_supported(&self, field: &str, operator: &str) -> bool {
        resolve(field, operator).is_ok()
    }

    pub fn available_fields(&self) -> Vec<&'static str> {
        Field::ALL.iter().map(Field::canonical_name).collect()
    }

    /// Operators for a field; empty when the field is unknown
    pub fn available_operators(&self, field: &str) -> Vec<&'static str> {
        field
            .parse::<Field>()
            .map(|f| {
                supported_operators(f)
                    .iter()
                    .map(Operator::canonical_name)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn describe(&self, field: Field) -> FieldDescriptor {
        let (kind, description) = match field {
            Field::Timestamp => (ValueKind::Timestamp, "When the record was written"),
            Field::Level => (ValueKind::Level, "Severity (trace, debug, info, warn, error, fatal)"),
            Field::Message => (ValueKind::Text, "Free-form message text"),
            Field::Node => (ValueKind::Text, "Host or broker node that emitted the record"),
            Field::ProcessId => (ValueKind::Integer, "Numeric id of the emitting process"),
            Field::Username => (ValueKind::Text, "User associated with the record"),
        };
        FieldDescriptor {
            name: field.canonical_name(),
            kind,
            description,
            operators: supported_operators(field)
                .iter()
                .map(Operator::canonical_name)
                .collect(),
        }
    }

    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        Field::ALL.iter().map(|f| self.describe(*f)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_aliases() {
        assert_eq!("pid".parse::<Field>(), Ok(Field::ProcessId));
        assert_eq!("LEVEL".parse::<Field>(), Ok(Field::Level));
        assert_eq!("host".parse::<Field>(), Ok(Field::Node));
        assert!("color".parse::<Field>().is_err());
    }

    #[test]
    fn test_resolve_rejects_operator_not_in_catalog() {
        assert_eq!(
            resolve("Level", "contains"),
            Err(FilterError::UnsupportedOperator {
                field: "Level".to_string(),
                operator: "contains".to_string(),
            })
        );
        assert_eq!(
            resolve("message", "REGEX"),
            Ok((Field::Message, Operator::Regex))
        );
    }

    #[test]
    fn test_resolve_unknown_field() {
        assert_eq!(
            resolve("Color", "equals"),
            Err(FilterError::UnsupportedField("Color".to_string()))
        );
    }

    #[test]
    fn test_metadata_matches_catalog() {
        let provider = FieldMetadataProvider::new();
        for field in Field::ALL {
            for op in provider.available_operators(field.canonical_name()) {
                assert!(resolve(field.canonical_name(), op).is_ok());
            }
        }
        assert!(provider.available_operators("Color").is_empty());
    }

    #[test]
    fn test_regex_is_most_expensive() {
        for field in [Field::Message, Field::Node] {
            for op in supported_operators(field) {
                assert!(computational_cost(field, *op) <= computational_cost(field, Regex));
            }
        }
        assert!(computational_cost(Field::Level, Equals) < computational_cost(Field::Message, Contains));
    }
}
