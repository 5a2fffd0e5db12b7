use thiserror::Error;

/// Errors raised while building or evaluating filter expressions
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error(
        "Unsupported field: '{0}'. Valid fields are: Timestamp, Level, Message, Node, ProcessId, Username"
    )]
    UnsupportedField(String),

    #[error("Operator '{operator}' is not supported for field '{field}'")]
    UnsupportedOperator { field: String, operator: String },

    #[error("Invalid value {value} for {field} {operator}: {reason}")]
    InvalidValue {
        field: String,
        operator: String,
        value: String,
        reason: String,
    },

    #[error("Invalid filter criteria: {}", .0.join("; "))]
    InvalidCriteria(Vec<String>),

    #[error("Invalid filter structure: {0}")]
    InvalidStructure(String),

    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },

    #[error("Filter operation was cancelled")]
    Cancelled,
}
