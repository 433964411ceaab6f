//! Loading of packaged default values.

use camino::Utf8Path;
use figment::{
    Figment,
    providers::{Format, Json, Toml, Yaml},
};

use crate::nested::Tree;
use crate::{SettingsError, SettingsResult};

/// Load a packaged defaults document.
///
/// A missing file yields an empty tree; packaged defaults are optional.
///
/// # Errors
///
/// Returns [`SettingsError::Defaults`] when the file cannot be read or
/// parsed.
pub fn load_defaults(path: &Utf8Path) -> SettingsResult<Tree> {
    if !path.is_file() {
        return Ok(Tree::new());
    }
    let data = std::fs::read_to_string(path).map_err(|e| SettingsError::defaults(path, e))?;
    parse_defaults(path, &data)
}

/// Parse defaults according to the extension of `path`.
///
/// JSON and YAML are recognised by extension; anything else is read as TOML.
///
/// # Errors
///
/// Returns [`SettingsError::Defaults`] when `data` does not parse into a
/// table.
pub fn parse_defaults(path: &Utf8Path, data: &str) -> SettingsResult<Tree> {
    let ext = path.extension().map(str::to_ascii_lowercase);
    let figment = match ext.as_deref() {
        Some("json") => Figment::from(Json::string(data)),
        Some("yaml" | "yml") => Figment::from(Yaml::string(data)),
        _ => Figment::from(Toml::string(data)),
    };
    figment
        .extract::<Tree>()
        .map_err(|e| SettingsError::defaults(path, e))
}
