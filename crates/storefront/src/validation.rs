//! Pre-network form validation.
//!
//! Validation failures are collected per field so the shell can show each
//! message next to the offending input. No request is sent while any field
//! is invalid.

use std::collections::BTreeMap;
use std::fmt;

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, String>,
}

impl FieldErrors {
    /// No errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. The first message per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    /// Record an error for `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &'static str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    /// Require a non-blank value.
    pub fn require(&mut self, field: &'static str, value: &str) {
        self.check(!value.trim().is_empty(), field, "is required");
    }

    /// Message for one field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Whether every field passed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over `(field, message)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok(value)` if no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field failed.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field} {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_first_message_per_field() {
        let mut errors = FieldErrors::new();
        errors.require("name", "  ");
        errors.add("name", "second message is ignored");
        errors.check(false, "password", "must be at least 6 characters");

        assert_eq!(errors.get("name"), Some("is required"));
        assert_eq!(
            errors.to_string(),
            "name is required; password must be at least 6 characters"
        );
        assert!(errors.into_result(()).is_err());
    }

    #[test]
    fn test_empty_passes() {
        let mut errors = FieldErrors::new();
        errors.require("title", "Winter boots");
        assert_eq!(errors.into_result(7), Ok(7));
    }
}
