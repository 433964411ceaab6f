//! Builders and checks for JSON-shaped settings trees.

use anyhow::{Result, anyhow, ensure};
use serde_json::{Map, Value};

/// Build a tree from a JSON literal.
///
/// Non-object values yield an empty tree.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use test_helpers::tree::tree;
///
/// let t = tree(json!({"color": "red"}));
/// assert_eq!(t.get("color"), Some(&json!("red")));
/// assert!(tree(json!(3)).is_empty());
/// ```
#[must_use]
pub fn tree(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Value stored at `path` inside `root`.
#[must_use]
pub fn lookup<'a>(root: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (last, parents) = path.split_last()?;
    let mut node = root;
    for key in parents {
        node = node.get(*key)?.as_object()?;
    }
    node.get(*last)
}

/// Check that `root` holds `expected` at `path`.
///
/// # Errors
///
/// Returns an error naming the path and the value found when they differ.
pub fn ensure_value(root: &Map<String, Value>, path: &[&str], expected: &Value) -> Result<()> {
    let found = lookup(root, path).ok_or_else(|| anyhow!("missing value at {}", path.join(".")))?;
    ensure!(
        found == expected,
        "value at {} is {found}, expected {expected}",
        path.join(".")
    );
    Ok(())
}

/// Check that `root` holds nothing at `path`.
///
/// # Errors
///
/// Returns an error naming the path and the value found when one exists.
pub fn ensure_absent(root: &Map<String, Value>, path: &[&str]) -> Result<()> {
    if let Some(found) = lookup(root, path) {
        return Err(anyhow!("unexpected value {found} at {}", path.join(".")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_walks_nested_objects() {
        let t = tree(json!({"a": {"b": {"c": 1}}}));
        assert_eq!(lookup(&t, &["a", "b", "c"]), Some(&json!(1)));
        assert_eq!(lookup(&t, &["a", "x"]), None);
        assert_eq!(lookup(&t, &[]), None);
    }

    #[test]
    fn ensure_value_reports_mismatch() {
        let t = tree(json!({"a": 1}));
        assert!(ensure_value(&t, &["a"], &json!(1)).is_ok());
        assert!(ensure_value(&t, &["a"], &json!(2)).is_err());
        assert!(ensure_absent(&t, &["a"]).is_err());
        assert!(ensure_absent(&t, &["b"]).is_ok());
    }
}
