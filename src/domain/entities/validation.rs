//! Construction-time checks shared by every unit variant.
//!
//! A `Validator` collects every offending field instead of stopping at the
//! first one, so a plugin author sees the full list in a single error.

use crate::application::errors::{FieldIssue, ValidationError};

/// Largest integer exactly representable as an IEEE-754 double
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

#[derive(Debug)]
pub struct Validator {
    unit: String,
    issues: Vec<FieldIssue>,
}

impl Validator {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            issues: Vec::new(),
        }
    }

    pub fn issue(&mut self, field: &'static str, reason: impl Into<String>) {
        self.issues.push(FieldIssue::new(field, reason));
    }

    pub fn non_empty(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.issue(field, "must be a non-empty string");
        }
    }

    pub fn aliases(&mut self, aliases: &[String]) {
        if aliases.iter().any(|a| a.trim().is_empty()) {
            self.issue("aliases", "must only contain non-empty strings");
        }
    }

    pub fn cooldown(&mut self, cooldown: Option<f64>) {
        if let Some(secs) = cooldown {
            if !secs.is_finite() || secs <= 0.0 {
                self.issue("cooldown", "must be a finite number greater than zero");
            }
        }
    }

    pub fn run_order(&mut self, run_order: Option<u64>) {
        if matches!(run_order, Some(order) if order > MAX_SAFE_INTEGER) {
            self.issue("run-order", "must be a safe integer");
        }
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_issue(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }

    /// Record `field` as missing when `value` is `None` (unless it already
    /// has an issue), then finish.
    pub fn finish_with<T>(mut self, field: &'static str, value: Option<T>) -> Result<T, ValidationError> {
        match value {
            Some(value) => self.finish().map(|()| value),
            None => {
                if !self.has_issue(field) {
                    self.issue(field, "must be given");
                }
                Err(ValidationError {
                    unit: self.unit,
                    issues: self.issues,
                })
            }
        }
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                unit: self.unit,
                issues: self.issues,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_every_issue() {
        let mut v = Validator::new("command");
        v.non_empty("name", "  ");
        v.aliases(&["ok".to_string(), "".to_string()]);
        v.cooldown(Some(f64::NAN));

        let err = v.finish_with::<()>("handler", None).unwrap_err();
        assert_eq!(err.issues.len(), 4);
        assert!(err.has_field("name"));
        assert!(err.has_field("aliases"));
        assert!(err.has_field("cooldown"));
        assert!(err.has_field("handler"));
        assert!(err.to_string().starts_with("invalid command:"));
    }

    #[test]
    fn test_cooldown_bounds() {
        for bad in [0.0, -1.0, f64::INFINITY] {
            let mut v = Validator::new("command");
            v.cooldown(Some(bad));
            assert!(v.has_issues(), "{} should be rejected", bad);
        }

        let mut v = Validator::new("command");
        v.cooldown(Some(0.5));
        v.cooldown(None);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_run_order_safe_integer() {
        let mut v = Validator::new("event");
        v.run_order(Some(MAX_SAFE_INTEGER));
        assert!(!v.has_issues());
        v.run_order(Some(MAX_SAFE_INTEGER + 1));
        assert!(v.has_issues());
    }
}
