//! Extensions for mapping errors to `SettingsResult` concisely.
//!
//! These helpers reduce repetitive `.map_err(|e| Arc::new(…))` patterns when
//! converting external error types into the crate's `SettingsResult<T>` alias
//! (`Result<T, Arc<SettingsError>>`).
//!
//! # Examples
//!
//! ```
//! use settings_variants::{SettingsResult, SettingsResultExt};
//!
//! fn encode() -> SettingsResult<serde_json::Value> {
//!     serde_json::to_value(42).into_settings()
//! }
//! ```

use std::sync::Arc;

use crate::{SettingsError, SettingsResult};

/// Generic extension for mapping any `Result<T, E>` with
/// `E: Into<SettingsError>` into a `SettingsResult<T>`.
pub trait SettingsResultExt<T> {
    /// Convert `Result<T, E>` into `SettingsResult<T>` using `Into<SettingsError>`.
    ///
    /// # Errors
    ///
    /// Propagates the original error after conversion into `Arc<SettingsError>`.
    fn into_settings(self) -> SettingsResult<T>;
}

impl<T, E> SettingsResultExt<T> for Result<T, E>
where
    E: Into<SettingsError>,
{
    fn into_settings(self) -> SettingsResult<T> {
        self.map_err(|e| Arc::new(e.into()))
    }
}

/// Extension attaching an operation description to storage failures.
pub trait StoreResultExt<T> {
    /// Convert the error into [`SettingsError::Store`] describing `operation`.
    ///
    /// # Errors
    ///
    /// Returns a `SettingsError::Store` wrapped in `Arc` when the input is `Err`.
    fn store_context(self, operation: impl FnOnce() -> String) -> SettingsResult<T>;
}

impl<T, E> StoreResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn store_context(self, operation: impl FnOnce() -> String) -> SettingsResult<T> {
        self.map_err(|e| SettingsError::store(operation(), e))
    }
}
