//! Filter expression engine
//!
//! Criteria are flat `(field, operator, value)` triples. The service validates
//! them, compiles them into an expression tree of strategy-backed leaves and
//! AND / OR / NOT composites, and streams records through the tree.
//!
//! # Criterion syntax
//!
//! ```text
//! field:operator:value
//! ```
//!
//! # Fields
//!
//! - `Timestamp` / `time` / `ts` - RFC 3339 or `YYYY-MM-DD[ HH:MM:SS]`
//! - `Level` / `lvl` - trace, debug, info, warn, error, fatal
//! - `Message` / `msg` - free text
//! - `Node` / `host` - emitting node
//! - `ProcessId` / `pid` - process id
//! - `Username` / `user` - associated user
//!
//! # Examples
//!
//! ```text
//! Level:equals:error                                  # Error records
//! Level:greaterOrEqual:warn                           # Warnings and worse
//! Message:contains:timeout                            # Case-insensitive substring
//! Message:regex:"conn(ection)? (reset|refused)"       # Pattern match
//! ProcessId:in:[101, 102]                             # Set membership
//! Timestamp:between:["2026-01-01","2026-01-02"]       # Inclusive range
//! ```

pub mod catalog;
pub mod criterion;
pub mod error;
pub mod expression;
pub mod factory;
pub mod service;
pub mod strategy;
pub mod stream;
pub mod validation;

pub use catalog::{Field, FieldDescriptor, FieldMetadataProvider, Operator, ValueKind};
pub use criterion::{CriterionParseError, FilterCriterion};
pub use error::FilterError;
pub use expression::{CompositeExpression, FilterExpression, LeafExpression, LogicalOperator};
pub use factory::StrategyFactory;
pub use service::{FilterService, PlannedCriterion};
pub use strategy::{FieldStrategy, MatchOptions, Predicate};
pub use stream::{RecordStream, from_records};
pub use validation::ValidationResult;
pub use tokio_util::sync::CancellationToken;
