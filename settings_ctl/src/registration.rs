//! Plugin type registration documents.
//!
//! Each `<plugin>.toml` file in the registrations directory declares one
//! plugin type: the attributes of a [`PluginDefinition`], a `defaults`
//! table and an optional list of dotted `strict_parents` paths.
//!
//! ```toml
//! label = "Theme"
//! config_name = "theme.settings"
//! variation_allow = true
//! strict_parents = ["regions"]
//!
//! [defaults]
//! color = "red"
//! ```

use std::mem;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use figment::Figment;
use figment::providers::{Format, Toml};
use serde::Deserialize;
use settings_variants::definition::PluginDefinition;
use settings_variants::nested::{NestedPath, path};
use settings_variants::plugin::DeclaredHooks;
use settings_variants::registry::PluginDescriptor;
use tracing::debug;

use crate::error::CtlError;

const REGISTRATION_SUFFIX: &str = ".toml";

/// One parsed registration document.
#[derive(Clone, Debug, Deserialize)]
pub struct Registration {
    /// Plugin type attributes and defaults.
    #[serde(flatten)]
    pub definition: PluginDefinition,
    /// Dotted paths replaced wholesale instead of deep-merged.
    #[serde(default)]
    pub strict_parents: Vec<String>,
}

impl Registration {
    /// Parse a registration document named after plugin type `stem`.
    ///
    /// The plugin id defaults to `stem` when the document omits it.
    ///
    /// # Errors
    ///
    /// Returns [`CtlError::Registration`] when `data` is not a valid
    /// registration.
    pub fn parse(path: &Utf8Path, stem: &str, data: &str) -> Result<Self, CtlError> {
        let mut registration: Self = Figment::from(Toml::string(data))
            .extract()
            .map_err(|source| CtlError::Registration {
                path: path.to_path_buf(),
                source: Box::new(source),
            })?;
        if registration.definition.id.is_empty() {
            stem.clone_into(&mut registration.definition.id);
        }
        Ok(registration)
    }

    /// Strict parent paths split on `.`.
    #[must_use]
    pub fn strict_paths(&self) -> Vec<NestedPath> {
        self.strict_parents
            .iter()
            .map(|dotted| path(dotted.split('.')))
            .collect()
    }

    /// Turn the registration into a registry descriptor.
    ///
    /// The `defaults` table is handed to the registry as packaged defaults so
    /// it is only attached to plugin types that declare a config name.
    #[must_use]
    pub fn into_descriptor(mut self) -> PluginDescriptor {
        let strict = self.strict_paths();
        let defaults = mem::take(&mut self.definition.defaults);
        PluginDescriptor::new(self.definition)
            .with_defaults(defaults)
            .with_hooks(move |_: &PluginDefinition| DeclaredHooks::new(strict.clone()))
    }
}

/// Read every `*.toml` registration in `dir`, ordered by file name.
///
/// # Errors
///
/// Returns [`CtlError::Io`] when the directory cannot be read and
/// [`CtlError::Registration`] when a document is invalid.
pub fn load_registrations(dir: &Utf8Path) -> Result<Vec<Registration>, CtlError> {
    let handle =
        Dir::open_ambient_dir(dir, ambient_authority()).map_err(|err| CtlError::io(dir, err))?;
    let mut names = Vec::new();
    for entry_result in handle.entries().map_err(|err| CtlError::io(dir, err))? {
        let entry = entry_result.map_err(|err| CtlError::io(dir, err))?;
        let name = entry.file_name().map_err(|err| CtlError::io(dir, err))?;
        if name.ends_with(REGISTRATION_SUFFIX) {
            names.push(name);
        }
    }
    names.sort();

    let mut registrations = Vec::with_capacity(names.len());
    for name in names {
        let path: Utf8PathBuf = dir.join(&name);
        let data = handle
            .read_to_string(&name)
            .map_err(|err| CtlError::io(path.clone(), err))?;
        let stem = name.trim_end_matches(REGISTRATION_SUFFIX);
        let registration = Registration::parse(&path, stem, &data)?;
        debug!(plugin = %registration.definition.id, %path, "loaded plugin registration");
        registrations.push(registration);
    }
    Ok(registrations)
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, anyhow, ensure};
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn registrations_default_their_id_and_split_strict_paths() -> Result<()> {
        let data = "config_name = \"theme.settings\"\nvariation_allow = true\n\
                    strict_parents = [\"regions.header\"]\n[defaults]\ncolor = \"red\"\n";
        let registration = Registration::parse(Utf8Path::new("theme.toml"), "theme", data)?;
        ensure!(registration.definition.id == "theme");
        ensure!(registration.definition.variation_allow);
        ensure!(registration.definition.variation_conditions);
        ensure!(registration.definition.defaults.get("color") == Some(&json!("red")));
        ensure!(registration.strict_paths() == [vec!["regions", "header"]]);
        Ok(())
    }

    #[rstest]
    fn invalid_documents_name_their_path() -> Result<()> {
        let err = Registration::parse(Utf8Path::new("broken.toml"), "broken", "variation_allow = 3")
            .err()
            .ok_or_else(|| anyhow!("invalid registration accepted"))?;
        ensure!(
            matches!(&err, CtlError::Registration { path, .. } if path == "broken.toml"),
            "unexpected error {err}"
        );
        Ok(())
    }
}
