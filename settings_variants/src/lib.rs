//! Layered settings with named variations.
//!
//! A settings plugin type declares default values. One persisted config
//! document per type overrides them, and any number of named variations
//! override that config again, optionally inheriting from a parent
//! variation. This crate provides the pieces that resolve those layers:
//!
//! - [`nested`]: deep get/set/merge/diff over JSON-shaped trees, including
//!   the strict merge mode used throughout.
//! - [`plugin`]: the value engine bound to one plugin instance, plus the
//!   [`plugin::SettingsHooks`] a plugin type implements.
//! - [`registry`]: explicit registration of plugin types and instance
//!   creation.
//! - [`variation`]: persisted variation records and the cascading
//!   [`variation::VariationManager`].
//! - [`repository`]: request-scoped resolution of the active instance.
//! - [`forms`]: base config and variation form orchestration.
//! - [`store`]: persistence seams with in-memory and directory backends.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use settings_variants::definition::PluginDefinition;
//! use settings_variants::nested::into_tree;
//! use settings_variants::registry::{PluginDescriptor, SettingsRegistry};
//! use settings_variants::store::MemoryConfigStore;
//!
//! # fn main() -> settings_variants::SettingsResult<()> {
//! let mut registry = SettingsRegistry::new(Arc::new(MemoryConfigStore::new()));
//! registry.register(
//!     PluginDescriptor::new(PluginDefinition::new("theme").with_config_name("theme.settings"))
//!         .with_defaults(into_tree(json!({"color": "red", "size": 1}))),
//! );
//! let plugin = registry.create_instance("theme", into_tree(json!({"size": 3})), None)?;
//! assert_eq!(plugin.value(&["color"]), Some(&json!("red")));
//! assert_eq!(plugin.value(&["size"]), Some(&json!(3)));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub mod access;
pub mod definition;
mod error;
pub mod events;
pub mod forms;
pub mod nested;
pub mod plugin;
pub mod registry;
pub mod repository;
mod result_ext;
pub mod store;
pub mod variation;

pub use error::{AggregatedErrors, SettingsError};
pub use result_ext::{SettingsResultExt, StoreResultExt};

/// Result type used by fallible settings operations.
///
/// Errors are shared so aggregated and cached failures can be handed out
/// without cloning the underlying sources.
pub type SettingsResult<T> = Result<T, Arc<SettingsError>>;
