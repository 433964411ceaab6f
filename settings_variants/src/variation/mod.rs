//! Persisted variation records.
//!
//! A [`VariationEntity`] names the plugin type it configures, carries its
//! own settings payload and may inherit from a parent variation. The
//! [`VariationManager`] builds plugin instances for entities and performs
//! cascading saves and deletes across inheritance trees.

mod manager;
mod visibility;

pub use manager::{SaveStatus, VariationManager};
pub use visibility::{ConditionConfig, ConditionEvaluator, VisibilityRules};

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::nested::Tree;

/// One named variation of a plugin type's settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariationEntity {
    /// Machine id; generated from the label when empty at save time.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Plugin type id this variation configures.
    pub plugin: String,
    /// Module providing the plugin type.
    pub provider: String,
    /// Variation payload; an empty tree inherits everything.
    pub settings: Tree,
    /// Parent variation id.
    pub parent: Option<String>,
    /// Ordering weight.
    pub weight: i32,
    /// Locked variations cannot be deleted.
    pub lock: bool,
    /// Enabled flag.
    pub status: bool,
    /// Visibility conditions.
    pub visibility: VisibilityRules,
    /// Set while the entity is saved as part of an ancestor's cascade so its
    /// own save does not cascade again.
    #[serde(skip)]
    pub skip_cascade: bool,
}

impl Default for VariationEntity {
    fn default() -> Self {
        Self {
            id: String::new(),
            label: String::new(),
            plugin: String::new(),
            provider: String::new(),
            settings: Tree::new(),
            parent: None,
            weight: 0,
            lock: false,
            status: true,
            visibility: VisibilityRules::default(),
            skip_cascade: false,
        }
    }
}

impl VariationEntity {
    /// Create an enabled variation of `plugin` labelled `label`, without an
    /// id yet.
    #[must_use]
    pub fn new(plugin: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    /// Set the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the parent variation id.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the settings payload.
    #[must_use]
    pub fn with_settings(mut self, settings: Tree) -> Self {
        self.settings = settings;
        self
    }

    /// Set the ordering weight.
    #[must_use]
    pub const fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    /// Set the enabled flag.
    #[must_use]
    pub const fn with_status(mut self, status: bool) -> Self {
        self.status = status;
        self
    }

    /// Parent id, treating an empty id as no parent.
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_deref().filter(|id| !id.is_empty())
    }

    /// Derive an id of the form `<plugin>_<slug>` from the label.
    ///
    /// # Examples
    ///
    /// ```
    /// use settings_variants::variation::VariationEntity;
    /// assert_eq!(VariationEntity::new("foo", "My Var! #1").generate_id(), "foo_my_var_1");
    /// ```
    #[must_use]
    pub fn generate_id(&self) -> String {
        format!("{}_{}", self.plugin, slug(&self.label))
    }

    /// Listing order: enabled first, then ascending weight, then label.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        other
            .status
            .cmp(&self.status)
            .then_with(|| self.weight.cmp(&other.weight))
            .then_with(|| self.label.cmp(&other.label))
    }
}

/// Sort `entities` into listing order.
pub fn sort_variations(entities: &mut [VariationEntity]) {
    entities.sort_by(VariationEntity::sort_cmp);
}

fn slug(label: &str) -> String {
    let kept: String = label
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    let mut out = String::with_capacity(kept.len());
    for c in kept.chars() {
        let mapped = if c.is_ascii_alphanumeric() { c } else { '_' };
        if mapped == '_' && out.ends_with('_') {
            continue;
        }
        out.push(mapped);
    }
    out
}
