//! Path-level differences between two trees.

use serde_json::Value;

use super::Tree;

/// Return the entries of `from` whose values differ from `to`.
///
/// Objects present on both sides are compared recursively and only
/// contribute their differing descendants; keys missing from `to` are
/// reported with their `from` value.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use settings_variants::nested::{diff_deep, Tree};
///
/// let from: Tree = serde_json::from_value(json!({"a": 1, "n": {"x": 1, "y": 2}, "new": true}))?;
/// let to: Tree = serde_json::from_value(json!({"a": 1, "n": {"x": 1, "y": 3}}))?;
/// assert_eq!(
///     serde_json::Value::Object(diff_deep(&from, &to)),
///     json!({"n": {"y": 2}, "new": true})
/// );
/// # Ok::<_, serde_json::Error>(())
/// ```
#[must_use]
pub fn diff_deep(from: &Tree, to: &Tree) -> Tree {
    let mut out = Tree::new();
    for (key, value) in from {
        match (value, to.get(key)) {
            (Value::Object(inner), Some(Value::Object(other))) => {
                let nested = diff_deep(inner, other);
                if !nested.is_empty() {
                    out.insert(key.clone(), Value::Object(nested));
                }
            }
            (_, Some(other)) if other == value => {}
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    out
}
