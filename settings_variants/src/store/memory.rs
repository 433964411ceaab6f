//! In-memory stores backed by ordered maps.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{ConfigStore, VariationQuery, VariationStore};
use crate::SettingsResult;
use crate::nested::Tree;
use crate::variation::VariationEntity;

/// Variation records held in process memory.
#[derive(Debug, Default)]
pub struct MemoryVariationStore {
    records: RwLock<BTreeMap<String, VariationEntity>>,
}

impl MemoryVariationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `entities`.
    #[must_use]
    pub fn with_entities(entities: impl IntoIterator<Item = VariationEntity>) -> Self {
        let records = entities
            .into_iter()
            .map(|entity| (entity.id.clone(), entity))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl VariationStore for MemoryVariationStore {
    fn load(&self, id: &str) -> SettingsResult<Option<VariationEntity>> {
        Ok(self.records.read().get(id).cloned())
    }

    fn load_by_properties(&self, query: &VariationQuery) -> SettingsResult<Vec<VariationEntity>> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|entity| query.matches(entity))
            .cloned()
            .collect())
    }

    fn save(&self, entity: &VariationEntity) -> SettingsResult<()> {
        let mut stored = entity.clone();
        stored.skip_cascade = false;
        self.records.write().insert(stored.id.clone(), stored);
        Ok(())
    }

    fn delete(&self, id: &str) -> SettingsResult<()> {
        self.records.write().remove(id);
        Ok(())
    }
}

/// Configuration documents held in process memory.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    documents: RwLock<BTreeMap<String, Tree>>,
}

impl MemoryConfigStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `documents`.
    #[must_use]
    pub fn with_documents<N: Into<String>>(documents: impl IntoIterator<Item = (N, Tree)>) -> Self {
        Self {
            documents: RwLock::new(
                documents
                    .into_iter()
                    .map(|(name, values)| (name.into(), values))
                    .collect(),
            ),
        }
    }

    /// Whether the document `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.documents.read().contains_key(name)
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self, name: &str) -> SettingsResult<Tree> {
        Ok(self.documents.read().get(name).cloned().unwrap_or_default())
    }

    fn save(&self, name: &str, values: &Tree) -> SettingsResult<()> {
        self.documents
            .write()
            .insert(name.to_owned(), values.clone());
        Ok(())
    }

    fn delete(&self, name: &str) -> SettingsResult<()> {
        self.documents.write().remove(name);
        Ok(())
    }
}
