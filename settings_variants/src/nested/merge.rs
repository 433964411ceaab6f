//! Strict deep-merge and key-intersection mechanics.

use serde_json::Value;

use super::Tree;

/// How `null` values in an overlay layer are treated while merging.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NullPolicy {
    /// `null` is an ordinary value and overwrites the base.
    #[default]
    Overwrite,
    /// `null` counts as absent: it never overwrites and is never inserted.
    Skip,
}

/// Merge `overlay` over `base`, returning the merged tree.
///
/// Behaviour:
/// - Objects are merged recursively.
/// - Scalars and arrays in `overlay` replace the value in `base` wholesale.
/// - An empty array or empty object in `overlay` does not replace a populated
///   value in `base`, so a form that omits a multi-value field cannot wipe
///   stored selections.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use settings_variants::nested::{merge_deep_strict, Tree};
///
/// let base: Tree = serde_json::from_value(json!({"a": 1, "b": {"x": 1}, "list": [1, 2]}))?;
/// let overlay: Tree = serde_json::from_value(json!({"b": {"y": 2}, "list": [3], "c": 3}))?;
/// let merged = merge_deep_strict(&base, &overlay);
/// assert_eq!(
///     serde_json::Value::Object(merged),
///     json!({"a": 1, "b": {"x": 1, "y": 2}, "list": [3], "c": 3})
/// );
/// # Ok::<_, serde_json::Error>(())
/// ```
#[must_use]
pub fn merge_deep_strict(base: &Tree, overlay: &Tree) -> Tree {
    let mut merged = base.clone();
    merge_tree(&mut merged, overlay, NullPolicy::Overwrite);
    merged
}

/// Merge `layers` left to right using the strict rules of
/// [`merge_deep_strict`].
///
/// The first layer is taken as-is. With [`NullPolicy::Skip`], `null` values
/// in later layers are treated as absent, letting a defaults layer seed keys
/// that a later layer only holds a `null` stand-in for.
#[must_use]
pub fn merge_deep_array_strict<'a, I>(layers: I, nulls: NullPolicy) -> Tree
where
    I: IntoIterator<Item = &'a Tree>,
{
    let mut layers = layers.into_iter();
    let Some(first) = layers.next() else {
        return Tree::new();
    };
    let mut merged = first.clone();
    for layer in layers {
        merge_tree(&mut merged, layer, nulls);
    }
    merged
}

fn merge_tree(target: &mut Tree, overlay: &Tree, nulls: NullPolicy) {
    for (key, value) in overlay {
        match target.get_mut(key) {
            Some(existing) => merge_value(existing, value, nulls),
            None => {
                if let Some(inserted) = admit(value, nulls) {
                    target.insert(key.clone(), inserted);
                }
            }
        }
    }
}

fn merge_value(target: &mut Value, overlay: &Value, nulls: NullPolicy) {
    if let Value::Object(overlay_map) = overlay
        && let Value::Object(target_map) = target
    {
        merge_tree(target_map, overlay_map, nulls);
        return;
    }
    if overlay.is_null() && nulls == NullPolicy::Skip {
        return;
    }
    if is_empty_container(overlay) && !is_blank(target) {
        return;
    }
    if let Some(replacement) = admit(overlay, nulls) {
        *target = replacement;
    }
}

/// Prepare an overlay value for insertion, dropping `null`s under
/// [`NullPolicy::Skip`].
fn admit(value: &Value, nulls: NullPolicy) -> Option<Value> {
    match (value, nulls) {
        (Value::Null, NullPolicy::Skip) => None,
        (Value::Object(map), NullPolicy::Skip) => Some(Value::Object(
            map.iter()
                .filter_map(|(k, v)| admit(v, nulls).map(|kept| (k.clone(), kept)))
                .collect(),
        )),
        _ => Some(value.clone()),
    }
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn is_blank(value: &Value) -> bool {
    value.is_null() || is_empty_container(value)
}

/// Keep the top-level entries of `a` whose keys also exist in `b`.
#[must_use]
pub fn intersect_key(a: &Tree, b: &Tree) -> Tree {
    a.iter()
        .filter(|(key, _)| b.contains_key(key.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Keep the entries of `a` whose keys also exist in `b`, recursing wherever
/// both sides hold objects.
///
/// The result is idempotent:
/// `intersect_key_deep(&intersect_key_deep(a, b), b) == intersect_key_deep(a, b)`.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use settings_variants::nested::{intersect_key_deep, Tree};
///
/// let a: Tree = serde_json::from_value(json!({"keep": 1, "drop": 2, "n": {"k": 1, "x": 2}}))?;
/// let b: Tree = serde_json::from_value(json!({"keep": 0, "n": {"k": 0}}))?;
/// assert_eq!(
///     serde_json::Value::Object(intersect_key_deep(&a, &b)),
///     json!({"keep": 1, "n": {"k": 1}})
/// );
/// # Ok::<_, serde_json::Error>(())
/// ```
#[must_use]
pub fn intersect_key_deep(a: &Tree, b: &Tree) -> Tree {
    let mut out = Tree::new();
    for (key, value) in a {
        let Some(other) = b.get(key) else {
            continue;
        };
        let kept = match (value, other) {
            (Value::Object(inner), Value::Object(other_inner)) => {
                Value::Object(intersect_key_deep(inner, other_inner))
            }
            _ => value.clone(),
        };
        out.insert(key.clone(), kept);
    }
    out
}
