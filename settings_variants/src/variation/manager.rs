//! Inheritance-aware persistence of variations.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::VariationEntity;
use crate::plugin::SettingsPlugin;
use crate::registry::SettingsRegistry;
use crate::store::{VariationQuery, VariationStore};
use crate::{SettingsError, SettingsResult};

/// Outcome of [`VariationManager::save`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaveStatus {
    /// A new record was created.
    New,
    /// An existing record was replaced.
    Updated,
}

/// Builds plugin instances for variations and persists variations with
/// cascading updates across their inheritance trees.
#[derive(Clone, Debug)]
pub struct VariationManager {
    registry: Arc<SettingsRegistry>,
    store: Arc<dyn VariationStore>,
}

impl VariationManager {
    /// Create a manager over `registry` and `store`.
    #[must_use]
    pub const fn new(registry: Arc<SettingsRegistry>, store: Arc<dyn VariationStore>) -> Self {
        Self { registry, store }
    }

    /// Plugin type registry.
    #[must_use]
    pub fn registry(&self) -> &SettingsRegistry {
        &self.registry
    }

    /// Variation store.
    #[must_use]
    pub fn store(&self) -> &dyn VariationStore {
        self.store.as_ref()
    }

    /// Load the variation `id`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn load(&self, id: &str) -> SettingsResult<Option<VariationEntity>> {
        self.store.load(id)
    }

    /// Direct parent of `entity`, if it names one that exists.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn parent(&self, entity: &VariationEntity) -> SettingsResult<Option<VariationEntity>> {
        let Some(parent_id) = entity.parent_id() else {
            return Ok(None);
        };
        let parent = self.store.load(parent_id)?;
        if parent.is_none() {
            warn!(variation = %entity.id, parent = parent_id, "parent variation is missing");
        }
        Ok(parent)
    }

    /// Ancestors of `entity`, nearest first.
    ///
    /// The walk stops at a missing parent or where the chain loops.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn parents(&self, entity: &VariationEntity) -> SettingsResult<Vec<VariationEntity>> {
        let mut seen = BTreeSet::from([entity.id.clone()]);
        let mut parents = Vec::new();
        let mut next = self.parent(entity)?;
        while let Some(parent) = next {
            if !seen.insert(parent.id.clone()) {
                warn!(variation = %entity.id, at = %parent.id, "parent chain loops");
                break;
            }
            next = self.parent(&parent)?;
            parents.push(parent);
        }
        Ok(parents)
    }

    /// Ancestor `(id, label)` pairs of `entity`, nearest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn parent_ids(&self, entity: &VariationEntity) -> SettingsResult<Vec<(String, String)>> {
        Ok(self
            .parents(entity)?
            .into_iter()
            .map(|parent| (parent.id, parent.label))
            .collect())
    }

    /// Furthest ancestor of `entity`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn parent_root(&self, entity: &VariationEntity) -> SettingsResult<Option<VariationEntity>> {
        Ok(self.parents(entity)?.pop())
    }

    /// Every descendant of `entity` sharing its plugin type, parents before
    /// their children.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn children(&self, entity: &VariationEntity) -> SettingsResult<Vec<VariationEntity>> {
        let mut seen = BTreeSet::from([entity.id.clone()]);
        let mut children = Vec::new();
        self.collect_children(entity, &mut seen, &mut children)?;
        Ok(children)
    }

    fn collect_children(
        &self,
        entity: &VariationEntity,
        seen: &mut BTreeSet<String>,
        out: &mut Vec<VariationEntity>,
    ) -> SettingsResult<()> {
        let query = VariationQuery::plugin(entity.plugin.clone()).with_parent(entity.id.clone());
        for child in self.store.load_by_properties(&query)? {
            if !seen.insert(child.id.clone()) {
                continue;
            }
            out.push(child.clone());
            self.collect_children(&child, seen, out)?;
        }
        Ok(())
    }

    /// Descendant `(id, label)` pairs of `entity`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn children_ids(&self, entity: &VariationEntity) -> SettingsResult<Vec<(String, String)>> {
        Ok(self
            .children(entity)?
            .into_iter()
            .map(|child| (child.id, child.label))
            .collect())
    }

    /// Plugin instance of `entity`, extended by every ancestor's settings
    /// (furthest first, so nearer ancestors win).
    ///
    /// Returns `Ok(None)` when the plugin type belongs to an uninstalled
    /// provider.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingPlugin`] when the entity names no
    /// plugin type, and propagates lookup and store failures.
    pub fn plugin_for(&self, entity: &VariationEntity) -> SettingsResult<Option<SettingsPlugin>> {
        if entity.plugin.is_empty() {
            let variation = if entity.id.is_empty() {
                String::from("new")
            } else {
                entity.id.clone()
            };
            return Err(Arc::new(SettingsError::MissingPlugin { variation }));
        }
        let Some(mut plugin) = self.registry.create_variation_instance_for_provider(
            &entity.plugin,
            &entity.id,
            entity.settings.clone(),
            &entity.provider,
        )?
        else {
            return Ok(None);
        };
        for parent in self.parents(entity)?.iter().rev() {
            plugin.extend_config_values(&parent.settings);
        }
        Ok(Some(plugin))
    }

    /// Reject `entity` if it appears among its own ancestors.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::CircularParent`] naming the looping chain.
    pub fn check_circular(&self, entity: &VariationEntity) -> SettingsResult<()> {
        let mut chain = vec![entity.id.clone()];
        let mut seen = BTreeSet::new();
        let mut next = entity.parent_id().map(str::to_owned);
        while let Some(parent_id) = next {
            chain.push(parent_id.clone());
            if parent_id == entity.id {
                return Err(Arc::new(SettingsError::CircularParent {
                    variation: entity.id.clone(),
                    chain: chain.join(" -> "),
                }));
            }
            if !seen.insert(parent_id.clone()) {
                break;
            }
            next = self
                .store
                .load(&parent_id)?
                .and_then(|parent| parent.parent_id().map(str::to_owned));
        }
        Ok(())
    }

    /// Validate `entity` before it is persisted.
    ///
    /// New entities must not collide with a stored id; no entity may be its
    /// own ancestor.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::DuplicateId`] or
    /// [`SettingsError::CircularParent`].
    pub fn validate(&self, entity: &VariationEntity, is_new: bool) -> SettingsResult<()> {
        let id = if entity.id.is_empty() {
            entity.generate_id()
        } else {
            entity.id.clone()
        };
        if is_new && self.store.load(&id)?.is_some() {
            return Err(Arc::new(SettingsError::DuplicateId { id }));
        }
        if entity.id.is_empty() {
            let mut named = entity.clone();
            named.id = id;
            return self.check_circular(&named);
        }
        self.check_circular(entity)
    }

    /// Persist `entity` and notify its plugin type.
    ///
    /// An empty id is generated from the label first. Unless the entity is
    /// flagged as part of a cascade, every descendant is then re-saved once,
    /// flagged, so their resolved values follow the new ancestor values.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::CircularParent`] when the entity would become
    /// its own ancestor, and propagates store and hook failures.
    pub fn save(&self, entity: &mut VariationEntity) -> SettingsResult<SaveStatus> {
        if entity.id.is_empty() {
            entity.id = entity.generate_id();
        }
        self.check_circular(entity)?;
        let status = if self.store.load(&entity.id)?.is_some() {
            SaveStatus::Updated
        } else {
            SaveStatus::New
        };
        self.store.save(entity)?;
        info!(variation = %entity.id, plugin = %entity.plugin, ?status, "saved variation");
        if let Some(plugin) = self.plugin_for(entity)? {
            plugin.save()?;
        }
        if !entity.skip_cascade {
            for mut child in self.children(entity)? {
                debug!(variation = %entity.id, child = %child.id, "cascading save");
                child.skip_cascade = true;
                self.save(&mut child)?;
            }
        }
        Ok(status)
    }

    /// Remove `entity` and notify its plugin type.
    ///
    /// Direct children are re-parented to the deleted entity's parent and
    /// every descendant is re-saved once.
    ///
    /// # Errors
    ///
    /// Propagates store and hook failures.
    pub fn delete(&self, entity: &VariationEntity) -> SettingsResult<()> {
        let plugin = self.plugin_for(entity)?;
        self.store.delete(&entity.id)?;
        info!(variation = %entity.id, plugin = %entity.plugin, "deleted variation");
        if let Some(deleted) = plugin {
            deleted.delete()?;
        }
        if entity.skip_cascade {
            return Ok(());
        }
        let parent_id = entity.parent_id().map(str::to_owned);
        for mut child in self.children(entity)? {
            child.skip_cascade = true;
            if child.parent_id() == Some(entity.id.as_str()) {
                child.parent.clone_from(&parent_id);
            }
            debug!(variation = %entity.id, child = %child.id, "cascading delete");
            self.save(&mut child)?;
        }
        Ok(())
    }
}
