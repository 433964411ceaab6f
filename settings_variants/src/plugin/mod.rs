//! Settings plugin instances.
//!
//! A [`SettingsPlugin`] binds one plugin type definition and its hooks to a
//! [`SettingsValues`] engine seeded from the persisted layers. Instances are
//! built per operation by the registry and are never persisted themselves;
//! callers hand the values they compute to a store.

mod hooks;
mod values;

pub use hooks::{DeclaredHooks, DefaultHooks, RESERVED_CORE_KEY, SettingsHooks, ValueLayer};
pub use values::SettingsValues;

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::SettingsResult;
use crate::definition::PluginDefinition;
use crate::forms::FormErrors;
use crate::nested::{self, NestedPath, Tree, merge_deep_strict};
use crate::repository::Scope;

/// One settings plugin instance: the core configuration of a plugin type or
/// one of its variations.
#[derive(Clone, Debug)]
pub struct SettingsPlugin {
    definition: Arc<PluginDefinition>,
    hooks: Arc<dyn SettingsHooks>,
    values: SettingsValues,
    variation_id: Option<String>,
    scope_selections: Tree,
}

impl SettingsPlugin {
    /// Build an instance from the persisted `config` and `variation` layers.
    ///
    /// Each layer, the definition's defaults included, passes through
    /// [`SettingsHooks::prepare_values`] first. Scope selections are taken
    /// out of the config layer beforehand and kept apart from the values.
    #[must_use]
    pub fn new(
        definition: Arc<PluginDefinition>,
        hooks: Arc<dyn SettingsHooks>,
        mut config: Tree,
        variation: Tree,
        variation_id: Option<String>,
    ) -> Self {
        let scope_selections: Tree = [Scope::Front, Scope::Back]
            .into_iter()
            .filter_map(|scope| config.remove_entry(scope.config_key()))
            .collect();
        let values = SettingsValues::new(
            hooks.prepare_values(definition.defaults.clone(), ValueLayer::Defaults),
            hooks.prepare_values(config, ValueLayer::Config),
            hooks.prepare_values(variation, ValueLayer::Variation),
            hooks.strict_parents(),
        );
        Self {
            definition,
            hooks,
            values,
            variation_id: variation_id.filter(|id| !id.is_empty()),
            scope_selections,
        }
    }

    /// Instance id: the variation id for variations, the plugin type id
    /// otherwise.
    #[must_use]
    pub fn id(&self) -> &str {
        self.variation_id.as_deref().unwrap_or(&self.definition.id)
    }

    /// Plugin type id.
    #[must_use]
    pub fn plugin_id(&self) -> &str {
        &self.definition.id
    }

    /// Plugin type definition.
    #[must_use]
    pub fn definition(&self) -> &PluginDefinition {
        &self.definition
    }

    /// Shared handle to the plugin type definition.
    #[must_use]
    pub fn definition_arc(&self) -> Arc<PluginDefinition> {
        Arc::clone(&self.definition)
    }

    /// Plugin type hooks.
    #[must_use]
    pub fn hooks(&self) -> &dyn SettingsHooks {
        self.hooks.as_ref()
    }

    /// Variation id, when this instance represents a variation.
    #[must_use]
    pub fn variation_id(&self) -> Option<&str> {
        self.variation_id.as_deref()
    }

    /// Whether this instance represents a variation.
    #[must_use]
    pub const fn is_variation(&self) -> bool {
        self.variation_id.is_some()
    }

    /// Whether the plugin type allows variations.
    #[must_use]
    pub fn allow_variations(&self) -> bool {
        self.definition.variation_allow
    }

    /// Whether variations are selected through visibility conditions.
    #[must_use]
    pub fn allow_variation_conditions(&self) -> bool {
        self.definition.variation_conditions
    }

    /// Whether variations are selectable per front/back-end scope.
    #[must_use]
    pub fn allow_variation_scope(&self) -> bool {
        self.variation_scope_key().is_some()
    }

    /// Scope key declared by the plugin type.
    #[must_use]
    pub fn variation_scope_key(&self) -> Option<&str> {
        self.definition
            .variation_scope
            .as_deref()
            .filter(|key| !key.is_empty())
    }

    /// Variation the stored config selects for `scope`, if any.
    #[must_use]
    pub fn scope_selection(&self, scope: Scope) -> Option<&str> {
        self.scope_selections
            .get(scope.config_key())
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Cache tags invalidated whenever the backing config changes.
    #[must_use]
    pub fn cache_tags(&self) -> Vec<String> {
        self.definition.cache_tag().into_iter().collect()
    }

    /// Value engine.
    #[must_use]
    pub const fn engine(&self) -> &SettingsValues {
        &self.values
    }

    /// Effective values.
    #[must_use]
    pub const fn values(&self) -> &Tree {
        self.values.current()
    }

    /// Effective value at `path`.
    pub fn value<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        nested::get(self.values.current(), path)
    }

    /// Packaged default values.
    #[must_use]
    pub const fn default_values(&self) -> &Tree {
        self.values.defaults()
    }

    /// Default value at `path`.
    pub fn default_value<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        nested::get(self.values.defaults(), path)
    }

    /// Config values, including inherited values.
    #[must_use]
    pub const fn config_values(&self) -> &Tree {
        self.values.config()
    }

    /// Config value at `path`.
    pub fn config_value<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        nested::get(self.values.config(), path)
    }

    /// Variation payload.
    #[must_use]
    pub const fn variation_values(&self) -> &Tree {
        self.values.variation()
    }

    /// Variation value at `path`.
    pub fn variation_value<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        nested::get(self.values.variation(), path)
    }

    /// Whether the variation payload holds a value at `path`, `null` included.
    pub fn has_variation_value<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.variation_value(path).is_some()
    }

    /// Inherited values.
    #[must_use]
    pub const fn extended_values(&self) -> &Tree {
        self.values.extended()
    }

    /// Whether any inherited values are held.
    #[must_use]
    pub fn is_extended(&self) -> bool {
        !self.values.extended().is_empty()
    }

    /// Inherited values with the variation payload on top.
    ///
    /// This is what a descendant inherits from this instance.
    #[must_use]
    pub fn extended_variation_values(&self) -> Tree {
        self.values.extended_variation()
    }

    /// Inherited-plus-variation value at `path`.
    pub fn extended_variation_value<S: AsRef<str>>(&self, path: &[S]) -> Option<Value> {
        nested::get(&self.extended_variation_values(), path).cloned()
    }

    /// See [`SettingsValues::diff_values`].
    #[must_use]
    pub fn diff_values(&self) -> Tree {
        self.values.diff_values()
    }

    /// Value at `path` in [`Self::diff_values`].
    pub fn diff_value<S: AsRef<str>>(&self, path: &[S]) -> Option<Value> {
        nested::get(&self.diff_values(), path).cloned()
    }

    /// See [`SettingsValues::diff_config_values`].
    #[must_use]
    pub fn diff_config_values(&self) -> Tree {
        self.values.diff_config_values()
    }

    /// Value at `path` in [`Self::diff_config_values`].
    pub fn diff_config_value<S: AsRef<str>>(&self, path: &[S]) -> Option<Value> {
        nested::get(&self.diff_config_values(), path).cloned()
    }

    /// Paths replaced wholesale instead of deep-merged.
    #[must_use]
    pub fn strict_parents(&self) -> &[NestedPath] {
        self.values.strict_parents()
    }

    /// See [`SettingsValues::set_values`].
    pub fn set_values(&mut self, values: &Tree) -> &mut Self {
        self.values.set_values(values);
        self
    }

    /// See [`SettingsValues::extend_config_values`].
    pub fn extend_config_values(&mut self, source: &Tree) -> &mut Self {
        debug!(plugin = self.id(), keys = source.len(), "extending config values");
        self.values.extend_config_values(source);
        self
    }

    /// See [`SettingsValues::unextend_config_values`].
    pub fn unextend_config_values(&mut self) -> &mut Self {
        self.values.unextend_config_values();
        self
    }

    /// See [`SettingsValues::merge_strict_parent_values`].
    pub fn merge_strict_parent_values(&self, target: &mut Tree, values: &Tree) {
        self.values.merge_strict_parent_values(target, values);
    }

    /// See [`SettingsValues::merge_values_with_current`].
    #[must_use]
    pub fn merge_values_with_current(&self, layers: &[Tree]) -> Tree {
        self.values.merge_values_with_current(layers)
    }

    /// Run the plugin's extraction hook over a settings form submission and
    /// align the result with the effective values.
    #[must_use]
    pub fn extract_settings_form_values(&self, submitted: &Tree) -> Tree {
        let extracted = self.hooks.extract_form_values(submitted);
        self.values.extract_settings_form_values(&extracted)
    }

    /// Run the plugin's base extraction hook over a base form submission and
    /// align the result with the defaults.
    #[must_use]
    pub fn extract_base_settings_form_values(&self, submitted: &Tree) -> Tree {
        let extracted = self.hooks.extract_base_form_values(submitted);
        self.values.extract_base_settings_form_values(&extracted)
    }

    /// Validate a settings form submission.
    pub fn validate_settings_form(&self, values: &mut Tree, errors: &mut FormErrors) {
        self.hooks.validate_form(values, errors);
    }

    /// Validate a base form submission.
    pub fn validate_base_settings_form(&self, values: &mut Tree, errors: &mut FormErrors) {
        self.hooks.validate_base_form(values, errors);
    }

    /// Values written when the base settings are reset.
    #[must_use]
    pub fn reset_settings_form_values(&self, values: Tree) -> Tree {
        self.hooks.reset_form_values(values)
    }

    /// Copy of this instance with `values` layered over its variation payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use serde_json::json;
    /// use settings_variants::definition::PluginDefinition;
    /// use settings_variants::nested::into_tree;
    /// use settings_variants::plugin::{DefaultHooks, SettingsPlugin};
    ///
    /// let mut definition = PluginDefinition::new("theme");
    /// definition.defaults = into_tree(json!({"color": "red", "size": 1}));
    /// let plugin = SettingsPlugin::new(
    ///     Arc::new(definition),
    ///     Arc::new(DefaultHooks),
    ///     into_tree(json!({})),
    ///     into_tree(json!({"size": 2})),
    ///     None,
    /// );
    /// let inline = plugin.with_instance_values(&into_tree(json!({"color": "blue"})));
    /// assert_eq!(inline.value(&["color"]), Some(&json!("blue")));
    /// assert_eq!(inline.value(&["size"]), Some(&json!(2)));
    /// assert_eq!(plugin.value(&["color"]), Some(&json!("red")));
    /// ```
    #[must_use]
    pub fn with_instance_values(&self, values: &Tree) -> Self {
        let mut instance = self.clone();
        let variation = merge_deep_strict(self.values.variation(), values);
        instance.values.set_variation_values(variation);
        instance
    }

    /// Notify the plugin type that its backing record was saved.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`SettingsHooks::on_save`].
    pub fn save(&self) -> SettingsResult<()> {
        self.hooks.on_save(self)
    }

    /// Notify the plugin type that its backing record was deleted.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`SettingsHooks::on_delete`].
    pub fn delete(&self) -> SettingsResult<()> {
        self.hooks.on_delete(self)
    }
}

#[cfg(test)]
mod tests;
