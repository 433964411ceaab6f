//! Constructors and aggregation helpers for `SettingsError`.

use std::sync::Arc;

use camino::Utf8Path;

use super::{AggregatedErrors, SettingsError};

impl SettingsError {
    /// Tries to build a [`SettingsError`] from an iterator of errors.
    ///
    /// Returns `None` for an empty iterator, the error itself when a single
    /// uniquely owned error is supplied, and [`Self::Aggregate`] otherwise.
    #[must_use]
    pub fn try_aggregate<I, E>(errors: I) -> Option<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<Arc<Self>>,
    {
        let mut arcs: Vec<Arc<Self>> = errors.into_iter().map(Into::into).collect();
        if arcs.len() > 1 {
            return Some(Self::Aggregate(Box::new(AggregatedErrors::new(arcs))));
        }
        let last = arcs.pop()?;
        Some(match Arc::try_unwrap(last) {
            Ok(err) => err,
            Err(shared) => Self::Aggregate(Box::new(AggregatedErrors::new(vec![shared]))),
        })
    }

    /// Construct a validation error for `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use settings_variants::SettingsError;
    /// let e = SettingsError::validation("label", "required");
    /// assert!(matches!(e, SettingsError::Validation { .. }));
    /// ```
    #[must_use]
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Construct a lookup error for an unregistered plugin type.
    #[must_use]
    pub fn unknown_plugin(plugin: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::UnknownPlugin {
            plugin: plugin.into(),
        })
    }

    /// Construct a store error for `operation`.
    #[must_use]
    pub fn store(
        operation: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Arc<Self> {
        Arc::new(Self::Store {
            operation: operation.into(),
            source: source.into(),
        })
    }

    /// Construct an error for a packaged defaults document at `path`.
    #[must_use]
    pub fn defaults(
        path: &Utf8Path,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Arc<Self> {
        Arc::new(Self::Defaults {
            path: path.to_path_buf(),
            source: source.into(),
        })
    }

    /// Whether this error reports a missing plugin type.
    #[must_use]
    pub const fn is_unknown_plugin(&self) -> bool {
        matches!(self, Self::UnknownPlugin { .. })
    }
}
