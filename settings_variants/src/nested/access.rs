//! Path-addressed reads and writes over [`Tree`] values.

use serde_json::{Map, Value};

use super::{NestedPath, Tree};

/// Look up the value stored at `path`.
///
/// Returns `None` when any segment is absent, when an intermediate value is
/// not an object, or when `path` is empty. A stored JSON `null` is reported
/// as present (`Some(&Value::Null)`).
pub fn get<'a, S: AsRef<str>>(tree: &'a Tree, path: &[S]) -> Option<&'a Value> {
    let (last, parents) = path.split_last()?;
    let mut current = tree;
    for segment in parents {
        current = current.get(segment.as_ref())?.as_object()?;
    }
    current.get(last.as_ref())
}

/// Store `value` at `path`, creating intermediate objects as needed.
///
/// Intermediate values that are not objects are replaced by empty objects.
/// An empty `path` leaves `tree` untouched.
pub fn set<S: AsRef<str>>(tree: &mut Tree, path: &[S], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = tree;
    for segment in parents {
        let slot = current
            .entry(segment.as_ref().to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert(last.as_ref().to_owned(), value);
}

/// Remove and return the value stored at `path`.
pub fn unset<S: AsRef<str>>(tree: &mut Tree, path: &[S]) -> Option<Value> {
    let (last, parents) = path.split_last()?;
    let mut current = tree;
    for segment in parents {
        current = current.get_mut(segment.as_ref())?.as_object_mut()?;
    }
    current.remove(last.as_ref())
}

/// List the path of every non-object value (and every empty object) in
/// `tree`, depth first in key order.
#[must_use]
pub fn leaf_paths(tree: &Tree) -> Vec<NestedPath> {
    let mut paths = Vec::new();
    collect_leaf_paths(tree, &mut Vec::new(), &mut paths);
    paths
}

fn collect_leaf_paths(tree: &Tree, prefix: &mut NestedPath, out: &mut Vec<NestedPath>) {
    for (key, value) in tree {
        prefix.push(key.clone());
        match value {
            Value::Object(child) if !child.is_empty() => collect_leaf_paths(child, prefix, out),
            _ => out.push(prefix.clone()),
        }
        prefix.pop();
    }
}
