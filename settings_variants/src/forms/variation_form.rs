//! Add/edit form of a single variation.

use serde_json::Value;
use tracing::{debug, warn};

use crate::nested::{NestedPath, Tree, unset};
use crate::plugin::SettingsPlugin;
use crate::store::VariationQuery;
use crate::variation::{
    SaveStatus, VariationEntity, VariationManager, VisibilityRules, sort_variations,
};
use crate::{SettingsError, SettingsResult};

use super::FormErrors;

/// Values submitted through the variation form.
#[derive(Clone, Debug, PartialEq)]
pub struct VariationSubmission {
    /// Human-readable label.
    pub label: String,
    /// Enabled flag.
    pub status: bool,
    /// Variation to inherit from.
    pub parent: Option<String>,
    /// Ordering weight.
    pub weight: i32,
    /// Settings sub-form values.
    pub settings: Tree,
    /// Settings paths whose "use default" toggle is set.
    pub use_default: Vec<NestedPath>,
    /// Visibility conditions.
    pub visibility: VisibilityRules,
}

impl Default for VariationSubmission {
    fn default() -> Self {
        Self {
            label: String::new(),
            status: true,
            parent: None,
            weight: 0,
            settings: Tree::new(),
            use_default: Vec::new(),
            visibility: VisibilityRules::default(),
        }
    }
}

/// Drop every value whose path is toggled in `use_default`, then drop any
/// mapping left empty by the pruning.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use settings_variants::forms::prepare_default_user_input;
/// use settings_variants::nested::{into_tree, path};
///
/// let input = into_tree(json!({"color": "red", "font": {"size": 12}}));
/// let pruned = prepare_default_user_input(&input, &[path(["font", "size"])]);
/// assert_eq!(pruned, into_tree(json!({"color": "red"})));
/// ```
#[must_use]
pub fn prepare_default_user_input(values: &Tree, use_default: &[NestedPath]) -> Tree {
    prune(values, use_default, &mut Vec::new())
}

fn prune(values: &Tree, use_default: &[NestedPath], at: &mut Vec<String>) -> Tree {
    let mut kept = Tree::new();
    for (key, value) in values {
        at.push(key.clone());
        let toggled = use_default.iter().any(|path| path == at);
        if !toggled && let Some(pruned) = prune_value(value, use_default, at) {
            kept.insert(key.clone(), pruned);
        }
        at.pop();
    }
    kept
}

fn prune_value(value: &Value, use_default: &[NestedPath], at: &mut Vec<String>) -> Option<Value> {
    let Some(nested) = value.as_object() else {
        return Some(value.clone());
    };
    let pruned = prune(nested, use_default, at);
    (!pruned.is_empty()).then_some(Value::Object(pruned))
}

/// Remove every toggled `use_default` path from `values`.
#[must_use]
pub fn remove_default_values(values: &Tree, use_default: &[NestedPath]) -> Tree {
    let mut remaining = values.clone();
    for toggled in use_default {
        unset(&mut remaining, toggled);
    }
    remaining
}

/// Drives the add/edit form of one variation.
#[derive(Debug)]
pub struct VariationForm<'m> {
    manager: &'m VariationManager,
    entity: VariationEntity,
    plugin: SettingsPlugin,
    is_new: bool,
}

impl<'m> VariationForm<'m> {
    /// Open the form for `entity`.
    ///
    /// The entity counts as new when it has no id yet or its id is not
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingPlugin`] or
    /// [`SettingsError::UnknownPlugin`] when the entity's plugin type cannot
    /// be instantiated, and propagates store failures.
    pub fn new(manager: &'m VariationManager, entity: VariationEntity) -> SettingsResult<Self> {
        let is_new = entity.id.is_empty() || manager.load(&entity.id)?.is_none();
        let plugin = manager
            .plugin_for(&entity)?
            .ok_or_else(|| SettingsError::unknown_plugin(entity.plugin.clone()))?;
        Ok(Self {
            manager,
            entity,
            plugin,
            is_new,
        })
    }

    /// Entity being edited.
    #[must_use]
    pub const fn entity(&self) -> &VariationEntity {
        &self.entity
    }

    /// Working plugin instance.
    #[must_use]
    pub const fn plugin(&self) -> &SettingsPlugin {
        &self.plugin
    }

    /// Whether the form creates a new variation.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.is_new
    }

    /// `(id, label)` pairs of the enabled variations of the same type that
    /// may be chosen as parent, in listing order.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn parent_options(&self) -> SettingsResult<Vec<(String, String)>> {
        let query = VariationQuery::plugin(self.entity.plugin.clone()).enabled();
        let mut siblings = self.manager.store().load_by_properties(&query)?;
        sort_variations(&mut siblings);
        Ok(siblings
            .into_iter()
            .filter(|sibling| self.entity.id.is_empty() || sibling.id != self.entity.id)
            .map(|sibling| (sibling.id, sibling.label))
            .collect())
    }

    /// Rebuild the working plugin for a parent choice.
    ///
    /// Choosing `parent` extends the working plugin with the parent's
    /// effective values; clearing it drops inherited values. Either way the
    /// toggled "use default" inputs are pruned from `submission` first so the
    /// inherited values show through.
    ///
    /// # Errors
    ///
    /// Propagates lookup and store failures.
    pub fn apply_parent(
        &mut self,
        parent: Option<&str>,
        submission: &mut VariationSubmission,
    ) -> SettingsResult<()> {
        let chosen = parent.filter(|id| !id.is_empty());
        submission.parent = chosen.map(str::to_owned);
        match chosen {
            Some(parent_id) => {
                let Some(parent_entity) = self.manager.load(parent_id)? else {
                    warn!(variation = %self.entity.id, parent = parent_id, "chosen parent is missing");
                    return Ok(());
                };
                let Some(parent_plugin) = self.manager.plugin_for(&parent_entity)? else {
                    return Ok(());
                };
                submission.settings =
                    prepare_default_user_input(&submission.settings, &submission.use_default);
                self.plugin
                    .unextend_config_values()
                    .extend_config_values(parent_plugin.values());
                debug!(variation = %self.entity.id, parent = parent_id, "extended from parent");
            }
            None => {
                if self.plugin.is_extended() {
                    submission.settings =
                        prepare_default_user_input(&submission.settings, &submission.use_default);
                    self.plugin.unextend_config_values();
                    debug!(variation = %self.entity.id, "dropped inherited values");
                }
            }
        }
        Ok(())
    }

    /// Validate `submission`, letting the plugin type normalise its settings.
    ///
    /// A missing label, a duplicate id, a circular parent chain and plugin
    /// validation failures are all reported together.
    pub fn validate(&self, submission: &mut VariationSubmission) -> FormErrors {
        let mut errors = FormErrors::new();
        if submission.label.trim().is_empty() {
            errors.set_error("label", "Label field is required.");
        }
        let candidate = self.candidate(submission);
        if let Err(err) = self.manager.validate(&candidate, self.is_new) {
            let key = if matches!(err.as_ref(), SettingsError::CircularParent { .. }) {
                "parent"
            } else {
                super::FORM_KEY
            };
            errors.set_error(key, err.to_string());
        }
        self.plugin
            .validate_settings_form(&mut submission.settings, &mut errors);
        errors
    }

    /// Write `submission` onto the entity and persist it through the
    /// cascading manager.
    ///
    /// Toggled "use default" paths are removed before the plugin type
    /// extracts the settings payload, so the variation inherits them.
    ///
    /// # Errors
    ///
    /// Propagates validation, store and hook failures.
    pub fn save(&mut self, submission: &VariationSubmission) -> SettingsResult<SaveStatus> {
        let mut entity = self.candidate(submission);
        let submitted = remove_default_values(&submission.settings, &submission.use_default);
        entity.settings = self.plugin.extract_settings_form_values(&submitted);
        let status = self.manager.save(&mut entity)?;
        self.entity = entity;
        self.is_new = false;
        Ok(status)
    }

    fn candidate(&self, submission: &VariationSubmission) -> VariationEntity {
        let mut entity = self.entity.clone();
        entity.label.clone_from(&submission.label);
        entity.status = submission.status;
        entity.parent = submission
            .parent
            .clone()
            .filter(|parent| !parent.is_empty());
        entity.weight = submission.weight;
        entity.visibility = submission.visibility.clone();
        if entity.id.is_empty() {
            entity.id = entity.generate_id();
        }
        entity
    }
}
