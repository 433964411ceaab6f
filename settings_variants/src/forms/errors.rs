//! Collected user-facing form validation errors.

use std::sync::Arc;

use crate::{SettingsError, SettingsResult};

/// Key used for errors that concern the whole form rather than one field.
pub const FORM_KEY: &str = "form";

/// A single validation error attached to a form key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormError {
    /// Form key the error belongs to.
    pub key: String,
    /// Human-readable message.
    pub message: String,
}

/// Validation errors gathered while a form is validated.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormErrors {
    errors: Vec<FormError>,
}

impl FormErrors {
    /// Create an empty error set.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record an error against `key`.
    pub fn set_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FormError {
            key: key.into(),
            message: message.into(),
        });
    }

    /// Record an error against the whole form.
    pub fn set_form_error(&mut self, message: impl Into<String>) {
        self.set_error(FORM_KEY, message);
    }

    /// Whether no errors were recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded errors.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over recorded errors.
    pub fn iter(&self) -> impl Iterator<Item = &FormError> {
        self.errors.iter()
    }

    /// Whether an error was recorded against `key`.
    #[must_use]
    pub fn has_error(&self, key: &str) -> bool {
        self.errors.iter().any(|e| e.key == key)
    }

    /// Convert the collected errors into a result.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Validation`] for a single error and
    /// [`SettingsError::Aggregate`] for several.
    pub fn into_result(self) -> SettingsResult<()> {
        let errors = self
            .errors
            .into_iter()
            .map(|e| SettingsError::validation(e.key, e.message));
        SettingsError::try_aggregate(errors).map_or(Ok(()), |err| Err(Arc::new(err)))
    }
}

impl Extend<FormError> for FormErrors {
    fn extend<T: IntoIterator<Item = FormError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}
