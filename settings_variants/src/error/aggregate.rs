//! Errors raised together by one form submission.

use std::fmt;
use std::sync::Arc;

use super::SettingsError;

/// Failures collected while a form submission was validated.
///
/// Validation failures keep the form key they were raised against so callers
/// can attach each message to its field.
///
/// # Examples
///
/// ```
/// use settings_variants::SettingsError;
///
/// let err = SettingsError::try_aggregate(vec![
///     SettingsError::validation("label", "Label field is required."),
///     SettingsError::validation("parent", "Unknown variation."),
/// ]);
/// let Some(SettingsError::Aggregate(failures)) = err else {
///     panic!("expected several failures");
/// };
/// assert_eq!(failures.failed_keys(), ["label", "parent"]);
/// ```
#[derive(Debug, Default)]
pub struct AggregatedErrors {
    errors: Vec<Arc<SettingsError>>,
}

impl AggregatedErrors {
    /// Collect `errors` in report order.
    #[must_use]
    pub const fn new(errors: Vec<Arc<SettingsError>>) -> Self {
        Self { errors }
    }

    /// Collected failures in report order.
    pub fn iter(&self) -> impl Iterator<Item = &SettingsError> {
        self.errors.iter().map(Arc::as_ref)
    }

    /// Number of collected failures.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether nothing was collected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Form keys with at least one validation failure, first report first.
    #[must_use]
    pub fn failed_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for key in self.iter().filter_map(validation_key) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Validation messages raised against form key `key`.
    #[must_use]
    pub fn messages_for(&self, key: &str) -> Vec<&str> {
        self.iter()
            .filter_map(|err| match err {
                SettingsError::Validation { key: failed, message } if failed == key => {
                    Some(message.as_str())
                }
                _ => None,
            })
            .collect()
    }
}

fn validation_key(err: &SettingsError) -> Option<&str> {
    match err {
        SettingsError::Validation { key, .. } => Some(key.as_str()),
        _ => None,
    }
}

impl fmt::Display for AggregatedErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for err in self.iter() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            match err {
                SettingsError::Validation { key, message } => write!(f, "- {key}: {message}")?,
                other => write!(f, "- {other}")?,
            }
        }
        Ok(())
    }
}
