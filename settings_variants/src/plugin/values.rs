//! Layered value engine behind every settings plugin instance.
//!
//! Five layers are tracked: packaged defaults, the persisted base config
//! (with a pristine snapshot), values inherited from ancestors ("extended"),
//! the variation payload, and the effective values derived from them all.

use crate::nested::{
    self, NestedPath, NullPolicy, Tree, diff_deep, intersect_key, intersect_key_deep,
    merge_deep_array_strict, merge_deep_strict,
};

/// Value layers of one plugin instance and the effective values they yield.
///
/// Every mutation recomputes the effective values, so [`Self::current`]
/// always reflects the layers held.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsValues {
    defaults: Tree,
    config: Tree,
    config_original: Tree,
    extended: Tree,
    variation: Tree,
    current: Tree,
    strict_parents: Vec<NestedPath>,
}

impl SettingsValues {
    /// Build the engine from its persisted layers and resolve the effective
    /// values.
    #[must_use]
    pub fn new(
        defaults: Tree,
        config: Tree,
        variation: Tree,
        strict_parents: Vec<NestedPath>,
    ) -> Self {
        let mut values = Self {
            defaults,
            config_original: config.clone(),
            config,
            extended: Tree::new(),
            variation,
            current: Tree::new(),
            strict_parents,
        };
        values.refresh();
        values
    }

    /// Recompute the effective values with `values` layered over config.
    ///
    /// Defaults back-fill every key the merge leaves absent (a `null` never
    /// hides a default), then the strict paths of config and of `values` are
    /// written verbatim, `values` last.
    pub fn set_values(&mut self, values: &Tree) -> &mut Self {
        self.current = resolve(&self.defaults, &self.config, values, &self.strict_parents);
        self
    }

    /// Layer `source` over the pristine config as inherited values.
    ///
    /// Only top-level keys known to the defaults are taken. Repeated calls
    /// accumulate, later sources winning, so chaining ancestors furthest
    /// first gives nearer ancestors precedence. Extending twice with the same
    /// source is a no-op.
    pub fn extend_config_values(&mut self, source: &Tree) -> &mut Self {
        let inherited = intersect_key(source, &self.defaults);
        self.extended = merge_deep_strict(&self.extended, &inherited);
        self.config = merge_deep_strict(&self.config_original, &self.extended);
        self.refresh();
        self
    }

    /// Drop every inherited value and restore the pristine config.
    pub fn unextend_config_values(&mut self) -> &mut Self {
        self.extended.clear();
        self.config.clone_from(&self.config_original);
        self.refresh();
        self
    }

    /// Replace the variation layer and recompute the effective values.
    pub fn set_variation_values(&mut self, variation: Tree) -> &mut Self {
        self.variation = variation;
        self.refresh();
        self
    }

    /// Copy every strict path present in `values` onto `target` verbatim.
    pub fn merge_strict_parent_values(&self, target: &mut Tree, values: &Tree) {
        apply_strict(target, values, &self.strict_parents);
    }

    /// Combine independently submitted `layers` with the effective values.
    ///
    /// The layers merge left to right, the result merges over the effective
    /// values, and strict paths from the merged layers take final precedence.
    #[must_use]
    pub fn merge_values_with_current(&self, layers: &[Tree]) -> Tree {
        let submitted = merge_deep_array_strict(layers, NullPolicy::Overwrite);
        let mut merged = merge_deep_strict(&self.current, &submitted);
        self.merge_strict_parent_values(&mut merged, &submitted);
        merged
    }

    /// Align already-extracted form values with the effective values.
    #[must_use]
    pub fn extract_settings_form_values(&self, values: &Tree) -> Tree {
        let mut merged = merge_deep_strict(
            &intersect_key_deep(&self.current, values),
            &intersect_key_deep(values, &self.current),
        );
        self.merge_strict_parent_values(&mut merged, values);
        merged
    }

    /// Align already-extracted base form values with the defaults.
    #[must_use]
    pub fn extract_base_settings_form_values(&self, values: &Tree) -> Tree {
        merge_deep_strict(
            &intersect_key_deep(&self.defaults, values),
            &intersect_key_deep(values, &self.defaults),
        )
    }

    /// Entries of the effective values that differ from stored state.
    ///
    /// Stored state is the pristine config, or the defaults when nothing is
    /// stored. Inherited values show up in the result.
    #[must_use]
    pub fn diff_values(&self) -> Tree {
        let to = if self.config_original.is_empty() {
            &self.defaults
        } else {
            &self.config_original
        };
        diff_deep(&intersect_key(&self.current, to), to)
    }

    /// Entries of the pristine config that differ from the defaults.
    #[must_use]
    pub fn diff_config_values(&self) -> Tree {
        diff_deep(&self.config_original, &self.defaults)
    }

    /// Effective values.
    #[must_use]
    pub const fn current(&self) -> &Tree {
        &self.current
    }

    /// Packaged default values.
    #[must_use]
    pub const fn defaults(&self) -> &Tree {
        &self.defaults
    }

    /// Config values, including any inherited values.
    #[must_use]
    pub const fn config(&self) -> &Tree {
        &self.config
    }

    /// Config values as loaded, before any extension.
    #[must_use]
    pub const fn config_original(&self) -> &Tree {
        &self.config_original
    }

    /// Inherited values.
    #[must_use]
    pub const fn extended(&self) -> &Tree {
        &self.extended
    }

    /// Variation payload.
    #[must_use]
    pub const fn variation(&self) -> &Tree {
        &self.variation
    }

    /// Inherited values with the variation payload layered on top.
    #[must_use]
    pub fn extended_variation(&self) -> Tree {
        merge_deep_strict(&self.extended, &self.variation)
    }

    /// Paths replaced wholesale instead of deep-merged.
    #[must_use]
    pub fn strict_parents(&self) -> &[NestedPath] {
        &self.strict_parents
    }

    fn refresh(&mut self) {
        self.current = resolve(
            &self.defaults,
            &self.config,
            &self.variation,
            &self.strict_parents,
        );
    }
}

fn resolve(defaults: &Tree, config: &Tree, values: &Tree, strict: &[NestedPath]) -> Tree {
    let layered = merge_deep_strict(config, values);
    let mut current = merge_deep_array_strict([defaults, &layered], NullPolicy::Skip);
    apply_strict(&mut current, config, strict);
    apply_strict(&mut current, values, strict);
    current
}

fn apply_strict(target: &mut Tree, values: &Tree, strict: &[NestedPath]) {
    for parents in strict {
        if let Some(value) = nested::get(values, parents) {
            nested::set(target, parents, value.clone());
        }
    }
}
