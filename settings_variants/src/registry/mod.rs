//! Registration table of settings plugin types.
//!
//! Plugin types are registered explicitly at process start as
//! [`PluginDescriptor`]s. The registry processes each definition once
//! (applying the route default and attaching packaged default values), caches
//! the processed table until [`SettingsRegistry::clear_cached_definitions`]
//! is called, and instantiates [`SettingsPlugin`]s seeded with the persisted
//! config document of their type.

mod defaults;

pub use defaults::{load_defaults, parse_defaults};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use camino::Utf8PathBuf;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::definition::{DEFAULT_ROUTE_PREFIX, PluginDefinition};
use crate::nested::{Tree, merge_deep_strict};
use crate::plugin::{DefaultHooks, SettingsHooks, SettingsPlugin};
use crate::store::ConfigStore;
use crate::{SettingsError, SettingsResult};

/// Builds the hooks of a plugin type from its processed definition.
pub type HooksFactory = Arc<dyn Fn(&PluginDefinition) -> Arc<dyn SettingsHooks> + Send + Sync>;

/// Processed plugin type definitions keyed by id.
pub type DefinitionTable = BTreeMap<String, Arc<PluginDefinition>>;

/// Where the packaged default values of a plugin type come from.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DefaultsSource {
    /// Only the defaults embedded in the definition.
    #[default]
    None,
    /// Defaults supplied in code.
    Inline(Tree),
    /// Defaults read from a TOML, JSON or YAML document.
    File(Utf8PathBuf),
}

/// Registration entry for one plugin type.
#[derive(Clone)]
pub struct PluginDescriptor {
    definition: PluginDefinition,
    defaults: DefaultsSource,
    factory: HooksFactory,
}

impl PluginDescriptor {
    /// Register `definition` with [`DefaultHooks`] and no packaged defaults.
    #[must_use]
    pub fn new(definition: PluginDefinition) -> Self {
        Self {
            definition,
            defaults: DefaultsSource::None,
            factory: Arc::new(|_: &PluginDefinition| -> Arc<dyn SettingsHooks> {
                Arc::new(DefaultHooks)
            }),
        }
    }

    /// Attach packaged default values supplied in code.
    #[must_use]
    pub fn with_defaults(mut self, defaults: Tree) -> Self {
        self.defaults = DefaultsSource::Inline(defaults);
        self
    }

    /// Attach packaged default values read from `path` when processed.
    #[must_use]
    pub fn with_defaults_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.defaults = DefaultsSource::File(path.into());
        self
    }

    /// Use `factory` to build the hooks of each instance's plugin type.
    #[must_use]
    pub fn with_hooks<F, H>(mut self, factory: F) -> Self
    where
        F: Fn(&PluginDefinition) -> H + Send + Sync + 'static,
        H: SettingsHooks + 'static,
    {
        self.factory = Arc::new(
            move |definition: &PluginDefinition| -> Arc<dyn SettingsHooks> {
                Arc::new(factory(definition))
            },
        );
        self
    }

    /// Share one hooks value across every instance.
    #[must_use]
    pub fn with_shared_hooks(mut self, hooks: Arc<dyn SettingsHooks>) -> Self {
        self.factory = Arc::new(move |_: &PluginDefinition| Arc::clone(&hooks));
        self
    }

    /// Definition as registered, before processing.
    #[must_use]
    pub const fn definition(&self) -> &PluginDefinition {
        &self.definition
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("definition", &self.definition)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

/// Reports which provider modules are installed.
pub trait ModuleHandler: Send + Sync {
    /// Whether `module` is installed.
    fn module_exists(&self, module: &str) -> bool;
}

impl<S: std::hash::BuildHasher + Send + Sync> ModuleHandler
    for std::collections::HashSet<String, S>
{
    fn module_exists(&self, module: &str) -> bool {
        self.contains(module)
    }
}

impl ModuleHandler for BTreeSet<String> {
    fn module_exists(&self, module: &str) -> bool {
        self.contains(module)
    }
}

/// Registration table and instance factory for settings plugin types.
pub struct SettingsRegistry {
    descriptors: BTreeMap<String, PluginDescriptor>,
    processed: RwLock<Option<Arc<DefinitionTable>>>,
    config: Arc<dyn ConfigStore>,
    modules: Option<Arc<dyn ModuleHandler>>,
}

impl fmt::Debug for SettingsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsRegistry")
            .field("plugins", &self.descriptors.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl SettingsRegistry {
    /// Create an empty registry reading base config from `config`.
    #[must_use]
    pub fn new(config: Arc<dyn ConfigStore>) -> Self {
        Self {
            descriptors: BTreeMap::new(),
            processed: RwLock::new(None),
            config,
            modules: None,
        }
    }

    /// Report installed modules through `modules`.
    ///
    /// Without a handler, a module counts as installed when a registered
    /// plugin type names it as provider.
    #[must_use]
    pub fn with_modules(mut self, modules: Arc<dyn ModuleHandler>) -> Self {
        self.modules = Some(modules);
        self
    }

    /// Register a plugin type, replacing any earlier registration of its id.
    pub fn register(&mut self, descriptor: PluginDescriptor) -> &mut Self {
        let id = descriptor.definition.id.clone();
        if self.descriptors.insert(id.clone(), descriptor).is_some() {
            warn!(plugin = %id, "replacing settings plugin registration");
        }
        self.clear_cached_definitions();
        self
    }

    /// Config store backing base values.
    #[must_use]
    pub fn config_store(&self) -> &Arc<dyn ConfigStore> {
        &self.config
    }

    /// Processed definitions of every registered plugin type, by id.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Defaults`] when a packaged defaults document
    /// cannot be loaded.
    pub fn definitions(&self) -> SettingsResult<Arc<DefinitionTable>> {
        if let Some(table) = self.processed.read().as_ref() {
            return Ok(Arc::clone(table));
        }
        let mut built = DefinitionTable::new();
        for (id, descriptor) in &self.descriptors {
            built.insert(id.clone(), Arc::new(process_definition(descriptor)?));
        }
        let table = Arc::new(built);
        *self.processed.write() = Some(Arc::clone(&table));
        debug!(count = table.len(), "processed settings plugin definitions");
        Ok(table)
    }

    /// Processed definition of plugin type `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownPlugin`] when `id` is not registered.
    pub fn definition(&self, id: &str) -> SettingsResult<Arc<PluginDefinition>> {
        self.definitions()?
            .get(id)
            .cloned()
            .ok_or_else(|| SettingsError::unknown_plugin(id))
    }

    /// Whether plugin type `id` is registered.
    #[must_use]
    pub fn has_definition(&self, id: &str) -> bool {
        self.descriptors.contains_key(id)
    }

    /// Processed definition whose persisted config document is `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Defaults`] when processing fails.
    pub fn definition_by_config_name(
        &self,
        name: &str,
    ) -> SettingsResult<Option<Arc<PluginDefinition>>> {
        Ok(self
            .definitions()?
            .values()
            .find(|definition| definition.config_name() == Some(name))
            .cloned())
    }

    /// Drop the processed definition cache so defaults are re-read.
    pub fn clear_cached_definitions(&self) {
        *self.processed.write() = None;
    }

    /// Instantiate plugin type `id` seeded with its persisted config.
    ///
    /// `overrides` becomes the variation layer; an empty `variation_id`
    /// yields a core instance.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownPlugin`] when `id` is not registered,
    /// or a store error when the config document cannot be read.
    pub fn create_instance(
        &self,
        id: &str,
        overrides: Tree,
        variation_id: Option<&str>,
    ) -> SettingsResult<SettingsPlugin> {
        let definition = self.definition(id)?;
        let descriptor = self
            .descriptors
            .get(id)
            .ok_or_else(|| SettingsError::unknown_plugin(id))?;
        let config = match definition.config_name() {
            Some(name) => self.config.load(name)?,
            None => Tree::new(),
        };
        let hooks = (descriptor.factory)(definition.as_ref());
        Ok(SettingsPlugin::new(
            definition,
            hooks,
            config,
            overrides,
            variation_id.map(str::to_owned),
        ))
    }

    /// Instantiate the variation `variation_id` of plugin type `id`.
    ///
    /// # Errors
    ///
    /// See [`Self::create_instance`].
    pub fn create_variation_instance(
        &self,
        id: &str,
        variation_id: &str,
        overrides: Tree,
    ) -> SettingsResult<SettingsPlugin> {
        self.create_instance(id, overrides, Some(variation_id))
    }

    /// Instantiate a variation supplied by module `provider`.
    ///
    /// Returns `Ok(None)` when the plugin type is unknown and `provider` is
    /// not installed: the variation belongs to an absent optional module.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownPlugin`] when the plugin type is
    /// unknown although its provider is installed (or not named).
    pub fn create_variation_instance_for_provider(
        &self,
        id: &str,
        variation_id: &str,
        overrides: Tree,
        provider: &str,
    ) -> SettingsResult<Option<SettingsPlugin>> {
        match self.create_variation_instance(id, variation_id, overrides) {
            Ok(plugin) => Ok(Some(plugin)),
            Err(err) if err.is_unknown_plugin() => {
                if provider.is_empty() || self.module_exists(provider) {
                    return Err(err);
                }
                warn!(
                    plugin = id,
                    variation = variation_id,
                    provider,
                    "skipping settings of an uninstalled module"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Whether `module` is installed.
    #[must_use]
    pub fn module_exists(&self, module: &str) -> bool {
        self.modules.as_ref().map_or_else(
            || {
                self.descriptors
                    .values()
                    .any(|descriptor| descriptor.definition.provider == module)
            },
            |modules| modules.module_exists(module),
        )
    }
}

fn process_definition(descriptor: &PluginDescriptor) -> SettingsResult<PluginDefinition> {
    let mut definition = descriptor.definition.clone();
    if definition.route.is_empty() {
        definition.route = format!("{DEFAULT_ROUTE_PREFIX}/{}", definition.id);
    }
    if definition.config_name().is_some() {
        let packaged = match &descriptor.defaults {
            DefaultsSource::None => Tree::new(),
            DefaultsSource::Inline(tree) => tree.clone(),
            DefaultsSource::File(path) => load_defaults(path)?,
        };
        definition.defaults = merge_deep_strict(&definition.defaults, &packaged);
    } else if descriptor.defaults != DefaultsSource::None {
        warn!(
            plugin = %definition.id,
            "ignoring packaged defaults of a plugin type without a config name"
        );
    }
    Ok(definition)
}
