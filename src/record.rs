//! Log record value objects consumed by the filter engine.
//!
//! Records are produced by format-specific parsers elsewhere; this module only
//! defines the shape the engine filters on and a JSON-lines reader used by the
//! command line front end.

mod level;
mod reader;

pub use level::LogLevel;
pub use reader::read_json_lines;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single structured log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// File or stream the record came from
    #[serde(default)]
    pub source: String,
    /// Source line number in the original file (1-indexed)
    #[serde(default)]
    pub line_number: usize,
    pub timestamp: DateTime<FixedOffset>,
    /// Log level as written in the source (e.g. "INFO", "warning")
    pub level: String,
    pub message: String,
    /// Host or broker node that emitted the record
    #[serde(default)]
    pub node: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl LogRecord {
    /// Identity used for deduplication across filter branches.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            source: self.source.clone(),
            line_number: self.line_number,
        }
    }

    /// Parsed severity, if the level text is recognized
    pub fn severity(&self) -> Option<LogLevel> {
        self.level.parse().ok()
    }
}

/// Explicit record identity: two records are the same record when they come
/// from the same source at the same line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub source: String,
    pub line_number: usize,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.line_number)
    }
}
