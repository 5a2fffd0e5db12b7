use serde::{Deserialize, Serialize};

/// Outcome of validating criteria or a configuration.
///
/// Collection never stops at the first problem: every error and warning found
/// is reported, and any single error makes the whole result invalid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(error.into());
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_error_invalidates() {
        let mut result = ValidationResult::new();
        result.add_warning("heads up");
        assert!(result.is_valid);

        result.add_error("first");
        result.add_error("second");
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["first", "second"]);
    }

    #[test]
    fn test_merge_keeps_everything() {
        let mut a = ValidationResult::new();
        a.add_warning("w1");
        let mut b = ValidationResult::new();
        b.add_error("e1");

        a.merge(b);
        assert!(!a.is_valid);
        assert_eq!(a.errors, vec!["e1"]);
        assert_eq!(a.warnings, vec!["w1"]);
    }
}
