//! Plugin type definitions.
//!
//! A [`PluginDefinition`] describes one settings plugin type: how it is
//! labelled, which persisted configuration document backs it, whether
//! variations are allowed and how they are selected, and the default values
//! that shape its configuration.

use serde::{Deserialize, Serialize};

use crate::nested::Tree;

/// Permission required to administer a plugin type when none is declared.
pub const DEFAULT_ADMIN_PERMISSION: &str = "administer site configuration";

/// Prefix used for generated administrative routes.
pub const DEFAULT_ROUTE_PREFIX: &str = "admin/config/settings";

/// Attributes of a registered settings plugin type.
///
/// Omitted attributes take the type-level defaults of [`Default`], so a
/// definition document only needs to name what differs.
///
/// # Examples
///
/// ```
/// use settings_variants::definition::PluginDefinition;
///
/// let definition: PluginDefinition = serde_json::from_str(r#"{"id": "theme"}"#)?;
/// assert!(definition.variation_conditions);
/// assert!(!definition.variation_allow);
/// assert_eq!(definition.variation_label, "variation");
/// # Ok::<_, serde_json::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginDefinition {
    /// Plugin type id.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Module providing this plugin type.
    pub provider: String,
    /// Name of the persisted configuration document backing the base values.
    pub config_name: Option<String>,
    /// Administrative route path.
    pub route: String,
    /// Optional menu title for the administrative route.
    pub menu_title: Option<String>,
    /// Permission required to update or delete variations.
    pub admin_permission: String,
    /// Whether named variations may be created.
    pub variation_allow: bool,
    /// Singular label for variations.
    pub variation_label: String,
    /// Plural label for variations.
    pub variation_label_plural: String,
    /// Whether variations are selected by visibility conditions.
    pub variation_conditions: bool,
    /// Whether variations can be reordered.
    pub variation_ordering: bool,
    /// Key enabling front/back-end scope selection of a variation.
    pub variation_scope: Option<String>,
    /// Default values, attached when the definition is processed.
    pub defaults: Tree,
}

impl Default for PluginDefinition {
    fn default() -> Self {
        Self {
            id: String::new(),
            label: String::new(),
            provider: String::new(),
            config_name: None,
            route: String::new(),
            menu_title: None,
            admin_permission: DEFAULT_ADMIN_PERMISSION.to_owned(),
            variation_allow: false,
            variation_label: String::from("variation"),
            variation_label_plural: String::from("variations"),
            variation_conditions: true,
            variation_ordering: true,
            variation_scope: None,
            defaults: Tree::new(),
        }
    }
}

impl PluginDefinition {
    /// Create a definition for `id` with every other attribute defaulted.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the persisted configuration document name.
    #[must_use]
    pub fn with_config_name(mut self, name: impl Into<String>) -> Self {
        self.config_name = Some(name.into());
        self
    }

    /// Set the providing module.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Non-empty persisted configuration name, if any.
    #[must_use]
    pub fn config_name(&self) -> Option<&str> {
        self.config_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Cache-invalidation tag emitted whenever the backing config changes.
    ///
    /// # Examples
    ///
    /// ```
    /// use settings_variants::definition::PluginDefinition;
    /// let d = PluginDefinition::new("theme").with_config_name("theme.settings");
    /// assert_eq!(d.cache_tag().as_deref(), Some("config:theme.settings"));
    /// ```
    #[must_use]
    pub fn cache_tag(&self) -> Option<String> {
        self.config_name().map(cache_tag_for)
    }
}

/// Cache tag for the configuration document `config_name`.
#[must_use]
pub fn cache_tag_for(config_name: &str) -> String {
    format!("config:{config_name}")
}
