//! Trait-based conversions between external error types and `SettingsError`.

use super::SettingsError;

/// JSON encoding or decoding failures surface as store errors; the engine
/// only serialises records on their way to or from a store.
impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Store {
            operation: format!(
                "decode JSON at line {}, column {}",
                e.line(),
                e.column()
            ),
            source: Box::new(e),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        Self::Store {
            operation: String::from("access the filesystem"),
            source: Box::new(e),
        }
    }
}
