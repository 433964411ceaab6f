//! Unit tests for nested tree access, merging, intersection and diffing.

use anyhow::{Result, ensure};
use rstest::rstest;
use serde_json::{Value, json};

use super::*;

fn tree(value: Value) -> Tree {
    into_tree(value)
}

#[rstest]
#[case(&["a"], Some(json!(1)))]
#[case(&["n", "deep", "x"], Some(json!("v")))]
#[case(&["n", "missing"], None)]
#[case(&["a", "below_scalar"], None)]
#[case(&["nil"], Some(Value::Null))]
fn get_reports_existence(#[case] path: &[&str], #[case] expected: Option<Value>) {
    let source = tree(json!({"a": 1, "n": {"deep": {"x": "v"}}, "nil": null}));
    assert_eq!(get(&source, path).cloned(), expected);
}

#[test]
fn get_with_empty_path_is_absent() {
    let source = tree(json!({"a": 1}));
    let empty: [&str; 0] = [];
    assert!(get(&source, &empty).is_none());
}

#[test]
fn set_creates_and_replaces_intermediates() {
    let mut target = tree(json!({"scalar": 1}));
    set(&mut target, &["a", "b", "c"], json!(true));
    set(&mut target, &["scalar", "inner"], json!("x"));
    assert_eq!(
        Value::Object(target),
        json!({"a": {"b": {"c": true}}, "scalar": {"inner": "x"}})
    );
}

#[test]
fn unset_removes_only_the_addressed_value() {
    let mut target = tree(json!({"n": {"keep": 1, "drop": 2}}));
    assert_eq!(unset(&mut target, &["n", "drop"]), Some(json!(2)));
    assert_eq!(unset(&mut target, &["n", "absent"]), None);
    assert_eq!(Value::Object(target), json!({"n": {"keep": 1}}));
}

#[rstest]
#[case::empty_list_keeps_base(json!({"v": [1, 2]}), json!({"v": []}), json!({"v": [1, 2]}))]
#[case::empty_map_keeps_base(json!({"v": "x"}), json!({"v": {}}), json!({"v": "x"}))]
#[case::list_replaces(json!({"v": [1, 2]}), json!({"v": [3]}), json!({"v": [3]}))]
#[case::false_overwrites(json!({"v": true}), json!({"v": false}), json!({"v": false}))]
#[case::zero_overwrites(json!({"v": 5}), json!({"v": 0}), json!({"v": 0}))]
#[case::null_overwrites(json!({"v": 5}), json!({"v": null}), json!({"v": null}))]
#[case::empty_list_over_blank(json!({"v": null}), json!({"v": []}), json!({"v": []}))]
#[case::objects_recurse(
    json!({"n": {"a": 1, "b": 2}}),
    json!({"n": {"b": 3, "c": 4}}),
    json!({"n": {"a": 1, "b": 3, "c": 4}})
)]
fn merge_deep_strict_rules(#[case] base: Value, #[case] overlay: Value, #[case] expected: Value) {
    let merged = merge_deep_strict(&tree(base), &tree(overlay));
    assert_eq!(Value::Object(merged), expected);
}

#[test]
fn merge_array_skips_nulls_when_requested() {
    let defaults = tree(json!({"a": 1, "n": {"x": "d", "y": "d"}}));
    let layer = tree(json!({"a": null, "n": {"x": null, "y": "set"}, "fresh": {"z": null}}));
    let merged = merge_deep_array_strict([&defaults, &layer], NullPolicy::Skip);
    assert_eq!(
        Value::Object(merged),
        json!({"a": 1, "n": {"x": "d", "y": "set"}, "fresh": {}})
    );
}

#[test]
fn merge_array_applies_layers_left_to_right() {
    let layers = [
        tree(json!({"a": 1, "b": 1})),
        tree(json!({"b": 2, "c": 2})),
        tree(json!({"c": 3})),
    ];
    let merged = merge_deep_array_strict(&layers, NullPolicy::Overwrite);
    assert_eq!(Value::Object(merged), json!({"a": 1, "b": 2, "c": 3}));
}

#[test]
fn merge_array_of_nothing_is_empty() {
    let layers: [Tree; 0] = [];
    assert!(merge_deep_array_strict(&layers, NullPolicy::Overwrite).is_empty());
}

#[test]
fn intersect_key_is_shallow() {
    let a = tree(json!({"keep": {"x": 1, "y": 2}, "drop": 1}));
    let b = tree(json!({"keep": {"x": 0}}));
    assert_eq!(
        Value::Object(intersect_key(&a, &b)),
        json!({"keep": {"x": 1, "y": 2}})
    );
}

#[rstest]
#[case(json!({"a": 1, "b": {"c": 1, "d": 2}}), json!({"b": {"c": null}, "z": 0}))]
#[case(json!({"a": {"b": {"c": 1}}}), json!({"a": {"b": 1}}))]
#[case(json!({}), json!({"a": 1}))]
fn intersect_key_deep_is_idempotent(#[case] left: Value, #[case] right: Value) -> Result<()> {
    let (a, b) = (tree(left), tree(right));
    let once = intersect_key_deep(&a, &b);
    let twice = intersect_key_deep(&once, &b);
    ensure!(once == twice, "intersection not idempotent: {once:?} vs {twice:?}");
    for path in leaf_paths(&once) {
        ensure!(
            get(&a, &path).is_some(),
            "path {path:?} missing from left side"
        );
        let top = path.first().map(String::as_str).unwrap_or_default();
        ensure!(b.contains_key(top), "key {top} missing from right side");
    }
    Ok(())
}

#[test]
fn diff_deep_reports_only_changed_paths() {
    let from = tree(json!({"same": 1, "changed": 2, "n": {"same": "a", "changed": "b"}, "extra": []}));
    let to = tree(json!({"same": 1, "changed": 3, "n": {"same": "a", "changed": "c"}}));
    assert_eq!(
        Value::Object(diff_deep(&from, &to)),
        json!({"changed": 2, "n": {"changed": "b"}, "extra": []})
    );
}

#[test]
fn diff_deep_of_identical_trees_is_empty() {
    let same = tree(json!({"n": {"deep": {"x": [1, 2]}}}));
    assert!(diff_deep(&same, &same).is_empty());
}

#[test]
fn leaf_paths_walks_depth_first() {
    let source = tree(json!({"a": 1, "n": {"b": 2, "e": {}}}));
    assert_eq!(
        leaf_paths(&source),
        vec![path(["a"]), path(["n", "b"]), path(["n", "e"])]
    );
}
