//! Directory-backed stores using `cap_std` for filesystem access.
//!
//! Layout under the store root:
//!
//! ```text
//! variations/<id>.json
//! config/<config_name>.json
//! ```

use std::io::{ErrorKind, Write as _};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::{Dir, OpenOptions};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::{ConfigStore, VariationQuery, VariationStore};
use crate::nested::Tree;
use crate::result_ext::StoreResultExt;
use crate::variation::VariationEntity;
use crate::{SettingsError, SettingsResult, SettingsResultExt};

const VARIATIONS_DIR: &str = "variations";
const CONFIG_DIR: &str = "config";
const RECORD_SUFFIX: &str = ".json";

/// Variation records and configuration documents stored as JSON files.
///
/// One instance serves as both the [`VariationStore`] and the
/// [`ConfigStore`].
#[derive(Debug)]
pub struct DirectoryStore {
    root: Utf8PathBuf,
    dir: Dir,
}

impl DirectoryStore {
    /// Open the store rooted at `root`, creating its directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SettingsError::Store`] when a directory cannot be
    /// created or opened.
    pub fn open(root: impl AsRef<Utf8Path>) -> SettingsResult<Self> {
        let path = root.as_ref();
        Dir::create_ambient_dir_all(path, ambient_authority())
            .store_context(|| format!("create store root '{path}'"))?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .store_context(|| format!("open store root '{path}'"))?;
        for sub in [VARIATIONS_DIR, CONFIG_DIR] {
            dir.create_dir_all(sub)
                .store_context(|| format!("create '{}'", path.join(sub)))?;
        }
        debug!(root = %path, "opened directory store");
        Ok(Self {
            root: path.to_path_buf(),
            dir,
        })
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn read_record<T: DeserializeOwned>(&self, sub: &str, name: &str) -> SettingsResult<Option<T>> {
        let relative = record_path(sub, name);
        match self.dir.read_to_string(&relative) {
            Ok(data) => serde_json::from_str(&data).into_settings().map(Some),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SettingsError::store(
                format!("read '{}'", self.root.join(&relative)),
                err,
            )),
        }
    }

    fn write_record<T: Serialize>(&self, sub: &str, name: &str, record: &T) -> SettingsResult<()> {
        let relative = record_path(sub, name);
        let content = serde_json::to_string_pretty(record).into_settings()?;
        let mut file = self
            .dir
            .open_with(
                &relative,
                OpenOptions::new().write(true).create(true).truncate(true),
            )
            .store_context(|| format!("open '{}'", self.root.join(&relative)))?;
        file.write_all(content.as_bytes())
            .store_context(|| format!("write '{}'", self.root.join(&relative)))?;
        info!(path = %self.root.join(&relative), "wrote settings record");
        Ok(())
    }

    fn remove_record(&self, sub: &str, name: &str) -> SettingsResult<()> {
        let relative = record_path(sub, name);
        match self.dir.remove_file(&relative) {
            Ok(()) => {
                info!(path = %self.root.join(&relative), "removed settings record");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SettingsError::store(
                format!("remove '{}'", self.root.join(&relative)),
                err,
            )),
        }
    }

    fn variation_ids(&self) -> SettingsResult<Vec<String>> {
        let listing = self.root.join(VARIATIONS_DIR);
        let mut ids = Vec::new();
        for entry_result in self
            .dir
            .read_dir(VARIATIONS_DIR)
            .store_context(|| format!("list '{listing}'"))?
        {
            let entry = entry_result.store_context(|| format!("list '{listing}'"))?;
            let file_name = entry
                .file_name()
                .store_context(|| format!("list '{listing}'"))?;
            if let Some(id) = file_name.strip_suffix(RECORD_SUFFIX) {
                ids.push(id.to_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

fn record_path(sub: &str, name: &str) -> Utf8PathBuf {
    Utf8Path::new(sub).join(format!("{name}{RECORD_SUFFIX}"))
}

impl VariationStore for DirectoryStore {
    fn load(&self, id: &str) -> SettingsResult<Option<VariationEntity>> {
        self.read_record(VARIATIONS_DIR, id)
    }

    fn load_by_properties(&self, query: &VariationQuery) -> SettingsResult<Vec<VariationEntity>> {
        let mut matches = Vec::new();
        for id in self.variation_ids()? {
            if let Some(entity) = self.read_record::<VariationEntity>(VARIATIONS_DIR, &id)?
                && query.matches(&entity)
            {
                matches.push(entity);
            }
        }
        Ok(matches)
    }

    fn save(&self, entity: &VariationEntity) -> SettingsResult<()> {
        self.write_record(VARIATIONS_DIR, &entity.id, entity)
    }

    fn delete(&self, id: &str) -> SettingsResult<()> {
        self.remove_record(VARIATIONS_DIR, id)
    }
}

impl ConfigStore for DirectoryStore {
    fn load(&self, name: &str) -> SettingsResult<Tree> {
        Ok(self.read_record(CONFIG_DIR, name)?.unwrap_or_default())
    }

    fn save(&self, name: &str, values: &Tree) -> SettingsResult<()> {
        self.write_record(CONFIG_DIR, name, values)
    }

    fn delete(&self, name: &str) -> SettingsResult<()> {
        self.remove_record(CONFIG_DIR, name)
    }
}
