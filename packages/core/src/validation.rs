// ABOUTME: Field-level validation errors collected while checking catalog payloads
// ABOUTME: Provides range, length, and presence checks with stable user-facing messages

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Field key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn non_field(message: impl Into<String>) -> Self {
        Self::new(NON_FIELD_ERRORS, message)
    }
}

/// An accumulated set of validation failures.
///
/// Checks append to the set rather than returning early so that a caller
/// sees every problem with a payload in one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn messages_for(&self, field: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// Merge errors produced for a nested item, prefixing each field with `prefix`.
    pub fn extend_nested(&mut self, prefix: &str, nested: ValidationErrors) {
        for error in nested.0 {
            let field = if error.field == NON_FIELD_ERRORS {
                prefix.to_string()
            } else {
                format!("{}.{}", prefix, error.field)
            };
            self.0.push(ValidationError::new(field, error.message));
        }
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    /// Errors grouped by field, in the shape API clients expect.
    pub fn by_field(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.0 {
            grouped
                .entry(error.field.clone())
                .or_default()
                .push(error.message.clone());
        }
        grouped
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn ensure(&mut self, condition: bool, field: &str, message: impl Into<String>) {
        if !condition {
            self.push(field, message);
        }
    }

    /// Required, non-blank text no longer than `max_len` characters.
    pub fn require_text(&mut self, field: &str, value: &str, max_len: usize) {
        if value.trim().is_empty() {
            self.push(field, "This field may not be blank.");
            return;
        }
        self.check_max_chars(field, value, max_len);
    }

    pub fn check_max_chars(&mut self, field: &str, value: &str, max_len: usize) {
        let count = value.chars().count();
        if count > max_len {
            self.push(
                field,
                format!(
                    "Ensure this field has no more than {} characters (it has {}).",
                    max_len, count
                ),
            );
        }
    }

    pub fn check_optional_chars(&mut self, field: &str, value: Option<&str>, max_len: usize) {
        if let Some(value) = value {
            self.check_max_chars(field, value, max_len);
        }
    }

    pub fn check_min(&mut self, field: &str, value: f64, min: f64) {
        if value < min {
            self.push(
                field,
                format!(
                    "Ensure this value is greater than or equal to {}.",
                    format_number(min)
                ),
            );
        }
    }

    pub fn check_max(&mut self, field: &str, value: f64, max: f64) {
        if value > max {
            self.push(
                field,
                format!(
                    "Ensure this value is less than or equal to {}.",
                    format_number(max)
                ),
            );
        }
    }

    pub fn check_range(&mut self, field: &str, value: f64, min: f64, max: f64) {
        self.check_min(field, value, min);
        self.check_max(field, value, max);
    }

    pub fn check_optional_range(&mut self, field: &str, value: Option<f64>, min: f64, max: f64) {
        if let Some(value) = value {
            self.check_range(field, value, min, max);
        }
    }

    pub fn check_optional_min(&mut self, field: &str, value: Option<f64>, min: f64) {
        if let Some(value) = value {
            self.check_min(field, value, min);
        }
    }

    /// `low` must not exceed `high` when both bounds are present.
    pub fn check_ordered(&mut self, field: &str, low: Option<f64>, high: Option<f64>) {
        if let (Some(low), Some(high)) = (low, high) {
            if low > high {
                self.push(field, "Minimum value cannot exceed the maximum value.");
            }
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        ValidationErrors(vec![error])
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
