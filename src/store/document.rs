use crate::filter::FilterCriterion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CURRENT_SCHEMA_VERSION: &str = "1.0";
pub const SUPPORTED_SCHEMA_VERSIONS: &[&str] = &[CURRENT_SCHEMA_VERSION];

pub fn supports_schema_version(version: &str) -> bool {
    SUPPORTED_SCHEMA_VERSIONS.contains(&version)
}

fn current_schema_version() -> String {
    CURRENT_SCHEMA_VERSION.to_string()
}

/// A named, versioned set of criteria persisted as one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfiguration {
    pub name: String,
    #[serde(default = "current_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub criteria: Vec<FilterCriterion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl FilterConfiguration {
    pub fn new(name: impl Into<String>, criteria: Vec<FilterCriterion>) -> Self {
        Self {
            name: name.into(),
            schema_version: current_schema_version(),
            criteria,
            created_at: None,
            last_modified: None,
        }
    }

    /// Set `last_modified` to `now`, and `created_at` too if it was never set
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
        self.last_modified = Some(now);
    }
}
