//! Error types produced by the settings engine and its collaborators.

mod aggregate;
mod constructors;
mod conversions;
mod types;

pub use aggregate::AggregatedErrors;
pub use types::SettingsError;
