//! Resolution of the settings instance that applies to a request.
//!
//! A [`SettingsRepository`] is built per request for one plugin type. It
//! decides which variation (or the core configuration) is active, caching
//! its answers for the rest of the request.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::SettingsResult;
use crate::access::{Account, Operation, SettingsAccess, Superuser};
use crate::definition::PluginDefinition;
use crate::nested::Tree;
use crate::plugin::SettingsPlugin;
use crate::store::VariationQuery;
use crate::variation::{
    ConditionConfig, ConditionEvaluator, VariationEntity, VariationManager, sort_variations,
};

/// Config key selecting the variation layered onto the front-end core.
///
/// Scope keys live in the config document but never reach the value layers.
pub const SCOPE_FRONT_KEY: &str = "settings_scope_front";
/// Config key selecting the variation layered onto the back-end core.
pub const SCOPE_BACK_KEY: &str = "settings_scope_back";

/// Front- or back-end side of the site serving the request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scope {
    /// Public-facing pages.
    Front,
    /// Administrative pages.
    Back,
}

impl Scope {
    /// Config key holding the variation selected for this scope.
    #[must_use]
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::Front => SCOPE_FRONT_KEY,
            Self::Back => SCOPE_BACK_KEY,
        }
    }
}

/// What the repository knows about the current request.
#[derive(Clone)]
pub struct RequestContext {
    /// Variation bound to the request, for example by its route.
    pub bound_variation: Option<VariationEntity>,
    /// Whether the request only ever uses the core configuration.
    pub core_only: bool,
    /// Scope of the request.
    pub scope: Option<Scope>,
    /// Account issuing the request.
    pub account: Arc<dyn Account>,
    /// Visibility condition evaluator for the request.
    pub conditions: Arc<dyn ConditionEvaluator>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            bound_variation: None,
            core_only: false,
            scope: None,
            account: Arc::new(Superuser),
            conditions: Arc::new(|_: &ConditionConfig| true),
        }
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field(
                "bound_variation",
                &self.bound_variation.as_ref().map(|v| v.id.as_str()),
            )
            .field("core_only", &self.core_only)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl RequestContext {
    /// Bind `variation` to the request.
    #[must_use]
    pub fn with_bound_variation(mut self, variation: VariationEntity) -> Self {
        self.bound_variation = Some(variation);
        self
    }

    /// Flag the request as core-only.
    #[must_use]
    pub const fn core_only(mut self) -> Self {
        self.core_only = true;
        self
    }

    /// Set the request scope.
    #[must_use]
    pub const fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Set the requesting account.
    #[must_use]
    pub fn with_account(mut self, account: Arc<dyn Account>) -> Self {
        self.account = account;
        self
    }

    /// Set the visibility condition evaluator.
    #[must_use]
    pub fn with_conditions(mut self, conditions: Arc<dyn ConditionEvaluator>) -> Self {
        self.conditions = conditions;
        self
    }
}

/// Request-scoped resolver of the active settings instance of one plugin
/// type.
#[derive(Debug)]
pub struct SettingsRepository {
    definition: Arc<PluginDefinition>,
    manager: VariationManager,
    context: RequestContext,
    core: SettingsPlugin,
    active: Option<SettingsPlugin>,
    variations_checked: Option<Vec<SettingsPlugin>>,
    variations_all: Option<Vec<SettingsPlugin>>,
}

impl SettingsRepository {
    /// Create a repository for `plugin_id` under `context`.
    ///
    /// When the context carries a scope and the core config selects a
    /// variation for it, that variation's inherited and own values are
    /// layered onto the core instance.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SettingsError::UnknownPlugin`] when `plugin_id` is
    /// not registered, and propagates store failures.
    pub fn new(
        manager: VariationManager,
        plugin_id: &str,
        context: RequestContext,
    ) -> SettingsResult<Self> {
        let registry = manager.registry();
        let definition = registry.definition(plugin_id)?;
        let mut core = registry.create_instance(plugin_id, Tree::new(), None)?;
        if let Some(scope) = context.scope {
            apply_scope(&manager, &mut core, scope)?;
        }
        Ok(Self {
            definition,
            manager,
            context,
            core,
            active: None,
            variations_checked: None,
            variations_all: None,
        })
    }

    /// Plugin type id.
    #[must_use]
    pub fn plugin_id(&self) -> &str {
        &self.definition.id
    }

    /// Core instance.
    #[must_use]
    pub const fn get_core(&self) -> &SettingsPlugin {
        &self.core
    }

    /// Active instance for the request.
    ///
    /// Resolution order: a variation bound to the request for this plugin
    /// type; the core instance for core-only requests or when the type does
    /// not select variations by condition; otherwise the first available
    /// instance in listing order, which is the core instance when no
    /// variation qualifies.
    ///
    /// # Errors
    ///
    /// Propagates lookup and store failures.
    pub fn get_active(&mut self, check_access: bool) -> SettingsResult<&SettingsPlugin> {
        let active = match self.active.take() {
            Some(cached) => cached,
            None => self.resolve_active(check_access)?,
        };
        Ok(self.active.insert(active))
    }

    fn resolve_active(&mut self, check_access: bool) -> SettingsResult<SettingsPlugin> {
        if let Some(bound) = self.context.bound_variation.as_ref()
            && bound.plugin == self.definition.id
            && let Some(plugin) = self.manager.plugin_for(bound)?
        {
            debug!(plugin = %self.definition.id, variation = %bound.id, "using bound variation");
            return Ok(plugin);
        }
        if self.context.core_only || !self.definition.variation_conditions {
            debug!(plugin = %self.definition.id, "using core settings");
            return Ok(self.core.clone());
        }
        let first = self.get_all(check_access)?.into_iter().next();
        Ok(first.unwrap_or_else(|| self.core.clone()))
    }

    /// Instance `variation_id`, falling back to the active instance.
    ///
    /// Ids not starting with the core id are prefixed with `<core id>_`, so
    /// callers may pass the short form.
    ///
    /// # Errors
    ///
    /// Propagates lookup and store failures.
    pub fn get(&mut self, variation_id: &str, check_access: bool) -> SettingsResult<SettingsPlugin> {
        let core_id = self.core.id();
        let id = if variation_id.starts_with(core_id) {
            variation_id.to_owned()
        } else {
            format!("{core_id}_{variation_id}")
        };
        if let Some(found) = self
            .get_all(check_access)?
            .into_iter()
            .find(|plugin| plugin.id() == id)
        {
            return Ok(found);
        }
        self.get_active(check_access).cloned()
    }

    /// Same as [`Self::get_all`].
    ///
    /// # Errors
    ///
    /// Propagates lookup and store failures.
    pub fn get_available(&mut self, check_access: bool) -> SettingsResult<Vec<SettingsPlugin>> {
        self.get_all(check_access)
    }

    /// Variation instances in listing order followed by the core instance.
    ///
    /// # Errors
    ///
    /// Propagates lookup and store failures.
    pub fn get_all(&mut self, check_access: bool) -> SettingsResult<Vec<SettingsPlugin>> {
        let mut all = self.get_variations(check_access)?.to_vec();
        all.push(self.core.clone());
        Ok(all)
    }

    /// Instances of the enabled variations in listing order, filtered by view
    /// access when `check_access` is set. Empty when the type disallows
    /// variations.
    ///
    /// # Errors
    ///
    /// Propagates lookup and store failures.
    pub fn get_variations(&mut self, check_access: bool) -> SettingsResult<&[SettingsPlugin]> {
        if !self.definition.variation_allow {
            return Ok(&[]);
        }
        let cached = if check_access {
            self.variations_checked.take()
        } else {
            self.variations_all.take()
        };
        let plugins = match cached {
            Some(plugins) => plugins,
            None => self.load_variations(check_access)?,
        };
        let slot = if check_access {
            &mut self.variations_checked
        } else {
            &mut self.variations_all
        };
        Ok(slot.insert(plugins).as_slice())
    }

    fn load_variations(&self, check_access: bool) -> SettingsResult<Vec<SettingsPlugin>> {
        let mut plugins = Vec::new();
        for entity in self.get_variation_entities()? {
            if check_access
                && !SettingsAccess::check(
                    &entity,
                    &self.definition,
                    Operation::View,
                    self.context.account.as_ref(),
                    self.context.conditions.as_ref(),
                )
                .is_allowed()
            {
                continue;
            }
            if let Some(plugin) = self.manager.plugin_for(&entity)? {
                plugins.push(plugin);
            }
        }
        Ok(plugins)
    }

    /// Enabled variations of the plugin type in listing order.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn get_variation_entities(&self) -> SettingsResult<Vec<VariationEntity>> {
        let query = VariationQuery::plugin(self.definition.id.clone()).enabled();
        let mut entities = self.manager.store().load_by_properties(&query)?;
        sort_variations(&mut entities);
        Ok(entities)
    }
}

fn apply_scope(
    manager: &VariationManager,
    core: &mut SettingsPlugin,
    scope: Scope,
) -> SettingsResult<()> {
    if !core.allow_variations() || !core.allow_variation_scope() {
        return Ok(());
    }
    let Some(variation_id) = core.scope_selection(scope).map(str::to_owned) else {
        return Ok(());
    };
    let Some(entity) = manager.load(&variation_id)? else {
        return Ok(());
    };
    if !entity.status || entity.plugin != core.plugin_id() {
        return Ok(());
    }
    if let Some(scoped) = manager.plugin_for(&entity)? {
        debug!(plugin = %core.plugin_id(), variation = %variation_id, ?scope, "layering scoped variation");
        core.extend_config_values(&scoped.extended_variation_values());
    }
    Ok(())
}
