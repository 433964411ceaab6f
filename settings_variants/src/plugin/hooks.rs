//! Per-plugin-type behaviour plugged into the value engine.

use std::fmt;

use crate::SettingsResult;
use crate::forms::FormErrors;
use crate::nested::{NestedPath, Tree};

use super::SettingsPlugin;

/// Reserved key stripped from every layer before it reaches the engine.
pub const RESERVED_CORE_KEY: &str = "_core";

/// Identifies which persisted layer a set of values belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueLayer {
    /// Default values packaged with the plugin type.
    Defaults,
    /// Persisted base configuration.
    Config,
    /// Per-variation override payload.
    Variation,
}

/// Behaviour a settings plugin type contributes on top of the shared engine.
///
/// Every method has a default so a plugin type only overrides what it needs.
/// Form hooks receive submitted values in the tree shape the form pipeline
/// delivers and must return the same shape.
///
/// # Examples
///
/// ```
/// use settings_variants::nested::{path, NestedPath};
/// use settings_variants::plugin::SettingsHooks;
///
/// #[derive(Debug)]
/// struct ThemeHooks;
///
/// impl SettingsHooks for ThemeHooks {
///     fn strict_parents(&self) -> Vec<NestedPath> {
///         vec![path(["regions"])]
///     }
/// }
/// ```
pub trait SettingsHooks: fmt::Debug + Send + Sync {
    /// Paths whose values replace earlier layers wholesale instead of being
    /// deep-merged.
    fn strict_parents(&self) -> Vec<NestedPath> {
        Vec::new()
    }

    /// Prepare one layer of values before the engine stores it.
    fn prepare_values(&self, mut values: Tree, _layer: ValueLayer) -> Tree {
        values.remove(RESERVED_CORE_KEY);
        values
    }

    /// Extract the base (non-variation) sub-form values from a submission.
    fn extract_base_form_values(&self, submitted: &Tree) -> Tree {
        submitted.clone()
    }

    /// Extract the settings sub-form values from a submission.
    fn extract_form_values(&self, submitted: &Tree) -> Tree {
        submitted.clone()
    }

    /// Validate the base sub-form, normalising `values` in place.
    fn validate_base_form(&self, _values: &mut Tree, _errors: &mut FormErrors) {}

    /// Validate the settings sub-form, normalising `values` in place.
    fn validate_form(&self, _values: &mut Tree, _errors: &mut FormErrors) {}

    /// Adjust the values written when the base settings are reset.
    fn reset_form_values(&self, values: Tree) -> Tree {
        values
    }

    /// React to the backing config or variation being saved.
    ///
    /// # Errors
    ///
    /// Implementations may fail when derived artefacts cannot be rebuilt.
    fn on_save(&self, _plugin: &SettingsPlugin) -> SettingsResult<()> {
        Ok(())
    }

    /// React to the backing config or variation being deleted.
    ///
    /// # Errors
    ///
    /// Implementations may fail when derived artefacts cannot be removed.
    fn on_delete(&self, _plugin: &SettingsPlugin) -> SettingsResult<()> {
        Ok(())
    }
}

/// Hooks with no behaviour beyond the engine defaults.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultHooks;

impl SettingsHooks for DefaultHooks {}

/// Hooks that only declare strict parent paths.
///
/// Used for plugin types registered from data documents rather than code.
#[derive(Clone, Debug, Default)]
pub struct DeclaredHooks {
    strict_parents: Vec<NestedPath>,
}

impl DeclaredHooks {
    /// Create hooks declaring `strict_parents`.
    #[must_use]
    pub const fn new(strict_parents: Vec<NestedPath>) -> Self {
        Self { strict_parents }
    }
}

impl SettingsHooks for DeclaredHooks {
    fn strict_parents(&self) -> Vec<NestedPath> {
        self.strict_parents.clone()
    }
}
