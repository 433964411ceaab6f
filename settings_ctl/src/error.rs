//! Error types for `settings-ctl`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use settings_variants::SettingsError;
use thiserror::Error;

/// Errors surfaced by `settings-ctl` commands.
#[derive(Debug, Error)]
pub enum CtlError {
    /// A settings operation failed.
    #[error(transparent)]
    Settings(#[from] Arc<SettingsError>),

    /// A plugin type registration document could not be parsed.
    #[error("invalid registration document {path}: {source}")]
    Registration {
        /// Offending document.
        path: Utf8PathBuf,
        /// Parse failure.
        #[source]
        source: Box<figment::Error>,
    },

    /// `--settings` was not valid JSON.
    #[error("--settings is not valid JSON: {0}")]
    SettingsJson(#[source] serde_json::Error),

    /// `--settings` parsed but was not a JSON object.
    #[error("--settings must be a JSON object")]
    SettingsNotObject,

    /// A named variation does not exist for the plugin type.
    #[error("variation '{id}' of plugin type '{plugin}' not found")]
    UnknownVariation {
        /// Plugin type id.
        plugin: String,
        /// Requested variation id.
        id: String,
    },

    /// The variation form rejected the submission.
    #[error("variation rejected: {0}")]
    Rejected(String),

    /// Output could not be rendered.
    #[error("failed to render JSON output: {0}")]
    Render(#[from] serde_json::Error),

    /// Filesystem or output failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path involved, or `-` for standard output.
        path: Utf8PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The log subscriber could not be installed.
    #[error("failed to install log subscriber: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}

impl CtlError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn stdout(source: std::io::Error) -> Self {
        Self::io("-", source)
    }
}
