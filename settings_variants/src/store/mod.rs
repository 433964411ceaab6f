//! Persistence seams for variation records and configuration documents.
//!
//! The engine never owns persistence; it talks to a [`VariationStore`] and a
//! [`ConfigStore`]. Each write is treated as an atomic single-record write.
//! Two backends ship with the crate: in-memory maps guarded by
//! `parking_lot` locks and a directory of JSON documents.

mod fs;
mod memory;

pub use fs::DirectoryStore;
pub use memory::{MemoryConfigStore, MemoryVariationStore};

use std::fmt;

use crate::SettingsResult;
use crate::nested::Tree;
use crate::variation::VariationEntity;

/// Property filter for [`VariationStore::load_by_properties`].
///
/// Unset fields match every record.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VariationQuery {
    /// Plugin type id.
    pub plugin: Option<String>,
    /// Parent variation id.
    pub parent: Option<String>,
    /// Enabled flag.
    pub status: Option<bool>,
}

impl VariationQuery {
    /// Match every variation of `plugin`.
    #[must_use]
    pub fn plugin(plugin: impl Into<String>) -> Self {
        Self {
            plugin: Some(plugin.into()),
            ..Self::default()
        }
    }

    /// Restrict to direct children of `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Restrict to enabled variations.
    #[must_use]
    pub const fn enabled(mut self) -> Self {
        self.status = Some(true);
        self
    }

    /// Whether `entity` satisfies every set filter.
    #[must_use]
    pub fn matches(&self, entity: &VariationEntity) -> bool {
        self.plugin.as_ref().is_none_or(|p| *p == entity.plugin)
            && self
                .parent
                .as_ref()
                .is_none_or(|p| entity.parent.as_ref() == Some(p))
            && self.status.is_none_or(|s| s == entity.status)
    }
}

/// Storage of variation records.
pub trait VariationStore: fmt::Debug + Send + Sync {
    /// Load the variation stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SettingsError::Store`] when the backend fails.
    fn load(&self, id: &str) -> SettingsResult<Option<VariationEntity>>;

    /// Load every variation matching `query`, in id order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SettingsError::Store`] when the backend fails.
    fn load_by_properties(&self, query: &VariationQuery) -> SettingsResult<Vec<VariationEntity>>;

    /// Insert or replace `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SettingsError::Store`] when the backend fails.
    fn save(&self, entity: &VariationEntity) -> SettingsResult<()>;

    /// Remove the variation stored under `id`; absent ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SettingsError::Store`] when the backend fails.
    fn delete(&self, id: &str) -> SettingsResult<()>;
}

/// Storage of named configuration documents.
pub trait ConfigStore: fmt::Debug + Send + Sync {
    /// Load the document `name`, or an empty tree when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SettingsError::Store`] when the backend fails.
    fn load(&self, name: &str) -> SettingsResult<Tree>;

    /// Insert or replace the document `name`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SettingsError::Store`] when the backend fails.
    fn save(&self, name: &str, values: &Tree) -> SettingsResult<()>;

    /// Remove the document `name`; absent documents are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SettingsError::Store`] when the backend fails.
    fn delete(&self, name: &str) -> SettingsResult<()>;
}
