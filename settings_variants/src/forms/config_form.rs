//! Base settings form of a plugin type.

use std::sync::Arc;

use serde_json::Value;

use crate::events::ConfigEvents;
use crate::nested::{NullPolicy, Tree, merge_deep_array_strict, merge_deep_strict};
use crate::plugin::SettingsPlugin;
use crate::repository::{SCOPE_BACK_KEY, SCOPE_FRONT_KEY};
use crate::store::VariationQuery;
use crate::variation::sort_variations;
use crate::{SettingsError, SettingsResult};

use super::FormErrors;

/// Values submitted through the base settings form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigSubmission {
    /// Base (non-variation) sub-form values.
    pub base: Tree,
    /// Settings sub-form values.
    pub instance: Tree,
    /// Variation selected for front-end requests.
    pub scope_front: Option<String>,
    /// Variation selected for back-end requests.
    pub scope_back: Option<String>,
}

/// Drives the base settings form of one plugin type against its persisted
/// config document.
#[derive(Debug)]
pub struct ConfigForm<'a> {
    events: &'a ConfigEvents,
    plugin: SettingsPlugin,
    config_name: String,
}

impl<'a> ConfigForm<'a> {
    /// Open the base form of `plugin_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownPlugin`] for an unregistered type and
    /// [`SettingsError::MissingConfigName`] when the type persists no config.
    pub fn new(events: &'a ConfigEvents, plugin_id: &str) -> SettingsResult<Self> {
        let plugin = events
            .manager()
            .registry()
            .create_instance(plugin_id, Tree::new(), None)?;
        let config_name = plugin
            .definition()
            .config_name()
            .map(str::to_owned)
            .ok_or_else(|| {
                Arc::new(SettingsError::MissingConfigName {
                    plugin: plugin_id.to_owned(),
                })
            })?;
        Ok(Self {
            events,
            plugin,
            config_name,
        })
    }

    /// Working core instance.
    #[must_use]
    pub const fn plugin(&self) -> &SettingsPlugin {
        &self.plugin
    }

    /// Config document edited by the form.
    #[must_use]
    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    /// `(id, label)` pairs of the variations selectable per scope.
    ///
    /// Empty unless the type allows variations and declares a scope key.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn scope_options(&self) -> SettingsResult<Vec<(String, String)>> {
        if !self.plugin.allow_variations() || !self.plugin.allow_variation_scope() {
            return Ok(Vec::new());
        }
        let query = VariationQuery::plugin(self.plugin.plugin_id()).enabled();
        let mut entities = self.events.manager().store().load_by_properties(&query)?;
        sort_variations(&mut entities);
        Ok(entities
            .into_iter()
            .map(|entity| (entity.id, entity.label))
            .collect())
    }

    /// Validate `submission`, letting the plugin type normalise it.
    ///
    /// While `processing_input` is set (the form is being rebuilt from a
    /// partial submission), the submitted values are folded into the working
    /// instance so later steps see them.
    pub fn validate(
        &mut self,
        submission: &mut ConfigSubmission,
        processing_input: bool,
    ) -> FormErrors {
        let mut errors = FormErrors::new();
        self.plugin
            .validate_base_settings_form(&mut submission.base, &mut errors);
        self.plugin
            .validate_settings_form(&mut submission.instance, &mut errors);
        if processing_input {
            let merged = self.merged_values(submission);
            self.plugin.set_values(&merged);
        }
        errors
    }

    /// Persist `submission` into the config document and return the written
    /// document.
    ///
    /// Values from both sub-forms are merged over the stored document, so a
    /// partial submission keeps everything else and defaults that were never
    /// submitted stay out of it. Scope selections are stored when the type
    /// allows variations. Config events then re-resolve every variation of
    /// the type.
    ///
    /// # Errors
    ///
    /// Propagates store, lookup and hook failures.
    pub fn submit(&mut self, submission: &ConfigSubmission) -> SettingsResult<Tree> {
        let registry = self.events.manager().registry();
        let stored = registry.config_store().load(&self.config_name)?;
        let layers = self.extracted_layers(submission);
        let submitted = merge_deep_array_strict(&layers, NullPolicy::Overwrite);
        let mut document = merge_deep_strict(&stored, &submitted);
        self.plugin.merge_strict_parent_values(&mut document, &submitted);
        if self.plugin.allow_variations() {
            for (key, selected) in [
                (SCOPE_FRONT_KEY, &submission.scope_front),
                (SCOPE_BACK_KEY, &submission.scope_back),
            ] {
                document.remove(key);
                if let Some(id) = selected.as_deref().filter(|id| !id.is_empty()) {
                    document.insert(key.to_owned(), Value::String(id.to_owned()));
                }
            }
        }
        self.events.save_config(&self.config_name, &document)?;
        self.reload()?;
        Ok(document)
    }

    /// Replace the config document with the plugin type's reset values and
    /// return them.
    ///
    /// # Errors
    ///
    /// Propagates store, lookup and hook failures.
    pub fn reset(&mut self) -> SettingsResult<Tree> {
        let values = self.plugin.reset_settings_form_values(Tree::new());
        self.events.save_config(&self.config_name, &values)?;
        self.reload()?;
        Ok(values)
    }

    fn extracted_layers(&self, submission: &ConfigSubmission) -> [Tree; 2] {
        [
            self.plugin
                .extract_base_settings_form_values(&submission.base),
            self.plugin.extract_settings_form_values(&submission.instance),
        ]
    }

    fn merged_values(&self, submission: &ConfigSubmission) -> Tree {
        self.plugin
            .merge_values_with_current(&self.extracted_layers(submission))
    }

    fn reload(&mut self) -> SettingsResult<()> {
        self.plugin = self.events.manager().registry().create_instance(
            self.plugin.plugin_id(),
            Tree::new(),
            None,
        )?;
        Ok(())
    }
}
