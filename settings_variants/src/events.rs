//! Reactions to configuration documents being saved or deleted.
//!
//! Every variation of a plugin type uses the type's config document as its
//! base, so a change to that document re-resolves all of them.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::SettingsResult;
use crate::definition::cache_tag_for;
use crate::nested::Tree;
use crate::store::VariationQuery;
use crate::variation::VariationManager;

/// Receives cache tags to invalidate.
pub trait CacheInvalidator: Send + Sync {
    /// Invalidate every cached item tagged with one of `tags`.
    fn invalidate_tags(&self, tags: &[String]);
}

/// Invalidator that records tags instead of acting on them.
#[derive(Debug, Default)]
pub struct TagLog {
    tags: Mutex<Vec<String>>,
}

impl TagLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags recorded so far, oldest first.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.tags.lock().clone()
    }
}

impl CacheInvalidator for TagLog {
    fn invalidate_tags(&self, tags: &[String]) {
        debug!(?tags, "invalidating cache tags");
        self.tags.lock().extend_from_slice(tags);
    }
}

/// Config document change handler.
#[derive(Clone)]
pub struct ConfigEvents {
    manager: VariationManager,
    invalidator: Arc<dyn CacheInvalidator>,
}

impl fmt::Debug for ConfigEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigEvents")
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}

impl ConfigEvents {
    /// Create a handler re-resolving variations through `manager`.
    #[must_use]
    pub fn new(manager: VariationManager, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        Self {
            manager,
            invalidator,
        }
    }

    /// Variation manager used to re-resolve variations.
    #[must_use]
    pub const fn manager(&self) -> &VariationManager {
        &self.manager
    }

    /// Write `values` as the config document `name` and run
    /// [`Self::on_config_save`].
    ///
    /// # Errors
    ///
    /// Propagates store, lookup and hook failures.
    pub fn save_config(&self, name: &str, values: &Tree) -> SettingsResult<()> {
        self.manager.registry().config_store().save(name, values)?;
        info!(config = name, "saved config document");
        self.on_config_save(name)?;
        Ok(())
    }

    /// Handle the config document `name` having been saved.
    ///
    /// Processed definitions are rebuilt first so edited defaults files are
    /// picked up. When a plugin type is backed by `name`, its core instance is
    /// notified, every variation of the type is re-saved without cascading, and the
    /// `config:<name>` tag is invalidated. Returns whether a plugin type owns
    /// the document.
    ///
    /// # Errors
    ///
    /// Propagates store, lookup and hook failures.
    pub fn on_config_save(&self, name: &str) -> SettingsResult<bool> {
        let registry = self.manager.registry();
        registry.clear_cached_definitions();
        let Some(definition) = registry.definition_by_config_name(name)? else {
            return Ok(false);
        };
        registry
            .create_instance(&definition.id, Tree::new(), None)?
            .save()?;
        let query = VariationQuery::plugin(definition.id.clone());
        for mut entity in self.manager.store().load_by_properties(&query)? {
            entity.skip_cascade = true;
            self.manager.save(&mut entity)?;
        }
        self.invalidator.invalidate_tags(&[cache_tag_for(name)]);
        Ok(true)
    }

    /// Handle the config document `name` having been deleted.
    ///
    /// Processed definitions are rebuilt first. When a plugin type is backed by
    /// `name`, its core instance is notified and every variation of the type is
    /// deleted without cascading.
    ///
    /// # Errors
    ///
    /// Propagates store, lookup and hook failures.
    pub fn on_config_delete(&self, name: &str) -> SettingsResult<bool> {
        let registry = self.manager.registry();
        registry.clear_cached_definitions();
        let Some(definition) = registry.definition_by_config_name(name)? else {
            return Ok(false);
        };
        registry
            .create_instance(&definition.id, Tree::new(), None)?
            .delete()?;
        let query = VariationQuery::plugin(definition.id.clone());
        for mut entity in self.manager.store().load_by_properties(&query)? {
            entity.skip_cascade = true;
            self.manager.delete(&entity)?;
        }
        self.invalidator.invalidate_tags(&[cache_tag_for(name)]);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, ensure};
    use parking_lot::Mutex;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use test_helpers::figment::{rewrite_document, with_documents};
    use test_helpers::result::to_anyhow;

    use super::*;
    use crate::definition::PluginDefinition;
    use crate::nested::into_tree;
    use crate::plugin::{SettingsHooks, SettingsPlugin};
    use crate::registry::{PluginDescriptor, SettingsRegistry};
    use crate::store::{MemoryConfigStore, MemoryVariationStore, VariationStore};
    use crate::variation::VariationEntity;

    #[derive(Debug, Default)]
    struct Calls(Mutex<Vec<String>>);

    impl SettingsHooks for Calls {
        fn on_save(&self, plugin: &SettingsPlugin) -> SettingsResult<()> {
            self.0.lock().push(format!("save {}", plugin.id()));
            Ok(())
        }

        fn on_delete(&self, plugin: &SettingsPlugin) -> SettingsResult<()> {
            self.0.lock().push(format!("delete {}", plugin.id()));
            Ok(())
        }
    }

    /// Records the effective `size` each hook call saw.
    #[derive(Debug, Default)]
    struct Sizes(Mutex<Vec<String>>);

    impl Sizes {
        fn record(&self, event: &str, plugin: &SettingsPlugin) {
            let size = plugin
                .value(&["size"])
                .map_or_else(|| "-".to_owned(), ToString::to_string);
            self.0.lock().push(format!("{event} {}={size}", plugin.id()));
        }
    }

    impl SettingsHooks for Sizes {
        fn on_save(&self, plugin: &SettingsPlugin) -> SettingsResult<()> {
            self.record("save", plugin);
            Ok(())
        }

        fn on_delete(&self, plugin: &SettingsPlugin) -> SettingsResult<()> {
            self.record("delete", plugin);
            Ok(())
        }
    }

    struct Harness {
        events: ConfigEvents,
        variations: Arc<MemoryVariationStore>,
        calls: Arc<Calls>,
        tags: Arc<TagLog>,
    }

    #[fixture]
    fn harness() -> Harness {
        let calls = Arc::new(Calls::default());
        let hooks: Arc<dyn SettingsHooks> = calls.clone();
        let mut registry = SettingsRegistry::new(Arc::new(MemoryConfigStore::new()));
        registry.register(
            PluginDescriptor::new(PluginDefinition::new("theme").with_config_name("theme.settings"))
                .with_defaults(into_tree(json!({"color": "red"})))
                .with_shared_hooks(hooks),
        );
        let variations = Arc::new(MemoryVariationStore::with_entities([
            VariationEntity::new("theme", "A").with_id("theme_a"),
            VariationEntity::new("theme", "B")
                .with_id("theme_b")
                .with_parent("theme_a"),
            VariationEntity::new("menu", "A").with_id("menu_a"),
        ]));
        let store: Arc<dyn VariationStore> = variations.clone();
        let tags = Arc::new(TagLog::new());
        Harness {
            events: ConfigEvents::new(
                VariationManager::new(Arc::new(registry), store),
                tags.clone(),
            ),
            variations,
            calls,
            tags,
        }
    }

    #[rstest]
    fn saved_config_resaves_each_variation_once(harness: Harness) -> Result<()> {
        let values = into_tree(json!({"color": "blue"}));
        to_anyhow(harness.events.save_config("theme.settings", &values))?;
        let calls = harness.calls.0.lock().clone();
        ensure!(
            calls == ["save theme", "save theme_a", "save theme_b"],
            "calls were {calls:?}"
        );
        ensure!(harness.tags.tags() == ["config:theme.settings"]);
        let stored = to_anyhow(
            harness
                .events
                .manager()
                .registry()
                .config_store()
                .load("theme.settings"),
        )?;
        ensure!(stored == values);
        Ok(())
    }

    #[rstest]
    fn deleted_config_removes_every_variation(harness: Harness) -> Result<()> {
        ensure!(to_anyhow(harness.events.on_config_delete("theme.settings"))?);
        ensure!(harness.variations.len() == 1, "theme variations survived");
        let remaining = to_anyhow(harness.variations.load("menu_a"))?;
        ensure!(remaining.is_some());
        let calls = harness.calls.0.lock().clone();
        ensure!(
            calls == ["delete theme", "delete theme_a", "delete theme_b"],
            "calls were {calls:?}"
        );
        Ok(())
    }

    #[rstest]
    fn unowned_documents_are_ignored(harness: Harness) -> Result<()> {
        ensure!(!to_anyhow(harness.events.on_config_save("other.settings"))?);
        ensure!(!to_anyhow(harness.events.on_config_delete("other.settings"))?);
        ensure!(harness.tags.tags().is_empty());
        ensure!(harness.calls.0.lock().is_empty(), "hooks ran for an unowned document");
        Ok(())
    }

    #[rstest]
    fn config_events_reread_edited_defaults_files() -> Result<()> {
        with_documents(&[("theme.toml", "size = 3")], |jail| {
            let sizes = Arc::new(Sizes::default());
            let hooks: Arc<dyn SettingsHooks> = sizes.clone();
            let mut registry = SettingsRegistry::new(Arc::new(MemoryConfigStore::new()));
            registry.register(
                PluginDescriptor::new(
                    PluginDefinition::new("theme").with_config_name("theme.settings"),
                )
                .with_defaults_file("theme.toml")
                .with_shared_hooks(hooks),
            );
            let store: Arc<dyn VariationStore> = Arc::new(MemoryVariationStore::with_entities([
                VariationEntity::new("theme", "A").with_id("theme_a"),
            ]));
            let events = ConfigEvents::new(
                VariationManager::new(Arc::new(registry), store),
                Arc::new(TagLog::new()),
            );
            let values = into_tree(json!({"color": "blue"}));

            to_anyhow(events.save_config("theme.settings", &values))?;
            rewrite_document(jail, "theme.toml", "size = 5")?;
            to_anyhow(events.save_config("theme.settings", &values))?;
            rewrite_document(jail, "theme.toml", "size = 7")?;
            ensure!(to_anyhow(events.on_config_delete("theme.settings"))?);

            let seen = sizes.0.lock().clone();
            ensure!(
                seen == [
                    "save theme=3",
                    "save theme_a=3",
                    "save theme=5",
                    "save theme_a=5",
                    "delete theme=7",
                    "delete theme_a=7",
                ],
                "hooks saw {seen:?}"
            );
            Ok(())
        })
    }
}
