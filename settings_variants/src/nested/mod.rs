//! Tree-shaped value utilities shared by every settings layer.
//!
//! Settings are stored as JSON object trees ([`Tree`]). Values are addressed
//! by ordered key sequences ([`NestedPath`]); a path names one key per level,
//! starting at the root object.
//!
//! The merge helpers follow a "strict" policy: objects merge recursively,
//! every other value (scalars and arrays) is replaced wholesale, and an empty
//! array or object never erases populated data.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use settings_variants::nested::{self, Tree};
//!
//! let base: Tree = serde_json::from_value(json!({"tags": ["a"], "nested": {"x": 1}}))?;
//! let overlay: Tree = serde_json::from_value(json!({"tags": [], "nested": {"y": 2}}))?;
//! let merged = nested::merge_deep_strict(&base, &overlay);
//! assert_eq!(merged.get("tags"), Some(&json!(["a"])));
//! assert_eq!(nested::get(&merged, &["nested", "y"]), Some(&json!(2)));
//! # Ok::<_, serde_json::Error>(())
//! ```

mod access;
mod diff;
mod merge;

pub use access::{get, leaf_paths, set, unset};
pub use diff::diff_deep;
pub use merge::{
    NullPolicy, intersect_key, intersect_key_deep, merge_deep_array_strict, merge_deep_strict,
};

use serde_json::{Map, Value};

/// A tree of settings values keyed by string.
pub type Tree = Map<String, Value>;

/// Ordered key sequence addressing a value inside a [`Tree`].
pub type NestedPath = Vec<String>;

/// Build a [`NestedPath`] from string-like segments.
///
/// # Examples
///
/// ```
/// use settings_variants::nested::path;
/// assert_eq!(path(["nested", "input"]), vec!["nested".to_owned(), "input".to_owned()]);
/// ```
pub fn path<I, S>(segments: I) -> NestedPath
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    segments.into_iter().map(Into::into).collect()
}

/// Convert a JSON value into a [`Tree`], treating non-objects as empty.
#[must_use]
pub fn into_tree(value: Value) -> Tree {
    match value {
        Value::Object(map) => map,
        _ => Tree::new(),
    }
}

#[cfg(test)]
mod tests;
