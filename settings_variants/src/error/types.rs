//! Primary error enum for settings resolution and persistence flows.

use camino::Utf8PathBuf;
use thiserror::Error;

use super::aggregate::AggregatedErrors;

/// Errors that can occur while registering, resolving or persisting settings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
    /// No plugin type is registered under the requested id.
    #[error("settings plugin '{plugin}' does not exist")]
    UnknownPlugin {
        /// Plugin type id that failed the lookup.
        plugin: String,
    },

    /// A variation record does not name the plugin type it configures.
    #[error("the settings '{variation}' did not specify a plugin")]
    MissingPlugin {
        /// Id of the variation missing its plugin type.
        variation: String,
    },

    /// A plugin type without a persisted config document was asked for one.
    #[error("settings plugin '{plugin}' does not declare a config name")]
    MissingConfigName {
        /// Plugin type id.
        plugin: String,
    },

    /// The packaged default values of a plugin type could not be loaded.
    #[error("default values error in '{path}': {source}")]
    Defaults {
        /// Path of the packaged defaults document.
        path: Utf8PathBuf,
        /// Underlying read or parse failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A persistence collaborator failed.
    #[error("settings store failed to {operation}: {source}")]
    Store {
        /// Short description of the attempted store operation.
        operation: String,
        /// Underlying storage failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A variation appears among its own ancestors.
    #[error(
        "circular reference detected: '{variation}' exists in the inheritance of its parents ({chain})"
    )]
    CircularParent {
        /// Variation whose parent chain loops back onto itself.
        variation: String,
        /// Parent chain rendered as `a -> b -> a`.
        chain: String,
    },

    /// A newly generated variation id collides with a stored one.
    #[error("the name '{id}' has already been used, please try a different name")]
    DuplicateId {
        /// Colliding id.
        id: String,
    },

    /// User-facing validation failure raised while processing a form.
    #[error("validation failed for '{key}': {message}")]
    Validation {
        /// Form key (or `form` for whole-form errors) that failed validation.
        key: String,
        /// Human-readable explanation of the failure.
        message: String,
    },

    /// Several failures reported by one submission.
    #[error("the submission was rejected:\n{0}")]
    Aggregate(Box<AggregatedErrors>),
}
