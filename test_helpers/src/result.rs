//! Conversions from crate results into `anyhow` results.

use std::fmt::Display;

/// Convert any result with a displayable error into an [`anyhow::Result`].
///
/// Shared crate errors (`Arc<SettingsError>`) are not `std::error::Error`
/// themselves, so tests stringify them at the boundary.
///
/// # Errors
///
/// Returns the stringified error when `result` is `Err`.
pub fn to_anyhow<T, E: Display>(result: Result<T, E>) -> anyhow::Result<T> {
    result.map_err(|err| anyhow::anyhow!(err.to_string()))
}
