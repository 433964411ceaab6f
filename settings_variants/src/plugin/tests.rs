//! Unit tests for the value engine and plugin instances.

use std::sync::Arc;

use anyhow::{Result, ensure};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::nested::{into_tree, leaf_paths, path};
use crate::repository::{SCOPE_BACK_KEY, SCOPE_FRONT_KEY};

fn tree(value: Value) -> Tree {
    into_tree(value)
}

#[derive(Debug)]
struct RegionHooks;

impl SettingsHooks for RegionHooks {
    fn strict_parents(&self) -> Vec<NestedPath> {
        vec![path(["regions"])]
    }
}

fn definition() -> Arc<PluginDefinition> {
    let mut definition = PluginDefinition::new("theme").with_config_name("theme.settings");
    definition.defaults = tree(json!({
        "color": "red",
        "size": 10,
        "regions": {"0": "header", "1": "footer"},
        "nested": {"a": 1, "b": 2},
    }));
    Arc::new(definition)
}

fn plugin(config: Value, variation: Value, variation_id: Option<&str>) -> SettingsPlugin {
    SettingsPlugin::new(
        definition(),
        Arc::new(RegionHooks),
        tree(config),
        tree(variation),
        variation_id.map(str::to_owned),
    )
}

#[fixture]
fn core_plugin() -> SettingsPlugin {
    plugin(json!({"color": "blue", "nested": {"a": 5}}), json!({}), None)
}

#[rstest]
fn effective_values_layer_variation_over_config_over_defaults() {
    let plugin = plugin(
        json!({"color": "blue", "nested": {"a": 5}}),
        json!({"size": 12, "nested": {"b": 7}}),
        Some("theme_dark"),
    );
    assert_eq!(
        Value::Object(plugin.values().clone()),
        json!({
            "color": "blue",
            "size": 12,
            "regions": {"0": "header", "1": "footer"},
            "nested": {"a": 5, "b": 7},
        })
    );
}

#[rstest]
#[case(json!({}), json!({}))]
#[case(json!({"color": null, "nested": null}), json!({"size": null}))]
#[case(json!({"nested": {"a": null}}), json!({"nested": {"b": null}, "extra": 1}))]
fn every_default_path_survives_set_values(
    #[case] config: Value,
    #[case] values: Value,
) -> Result<()> {
    let mut plugin = plugin(config, json!({}), None);
    plugin.set_values(&tree(values));
    for default_path in leaf_paths(plugin.default_values()) {
        ensure!(
            plugin.value(&default_path).is_some(),
            "default path {default_path:?} missing from {:?}",
            plugin.values()
        );
    }
    Ok(())
}

#[rstest]
fn strict_paths_take_caller_values_verbatim(#[from(core_plugin)] mut core: SettingsPlugin) {
    core.set_values(&tree(json!({"regions": {"5": "sidebar"}})));
    assert_eq!(core.value(&["regions"]), Some(&json!({"5": "sidebar"})));
}

#[rstest]
fn strict_paths_from_config_are_not_merged_with_defaults() {
    let plugin = plugin(json!({"regions": {"2": "aside"}}), json!({}), None);
    assert_eq!(plugin.value(&["regions"]), Some(&json!({"2": "aside"})));
}

#[rstest]
fn reserved_core_key_is_stripped_from_every_layer() {
    let plugin = plugin(
        json!({"_core": {"hash": "x"}}),
        json!({"_core": {"hash": "y"}}),
        Some("theme_a"),
    );
    assert!(plugin.value(&["_core"]).is_none());
    assert!(!plugin.has_variation_value(&["_core"]));
}

#[rstest]
fn scope_selections_stay_out_of_the_values() {
    let plugin = plugin(
        json!({"color": "blue", SCOPE_FRONT_KEY: "theme_a", SCOPE_BACK_KEY: ""}),
        json!({}),
        None,
    );
    assert_eq!(plugin.scope_selection(Scope::Front), Some("theme_a"));
    assert_eq!(plugin.scope_selection(Scope::Back), None);
    assert!(plugin.value(&[SCOPE_FRONT_KEY]).is_none());
    assert_eq!(Value::Object(plugin.diff_config_values()), json!({"color": "blue"}));
    assert!(!plugin.diff_values().contains_key(SCOPE_BACK_KEY));
}

#[rstest]
fn extend_then_unextend_restores_config(#[from(core_plugin)] mut core: SettingsPlugin) {
    let snapshot = core.config_values().clone();
    core.extend_config_values(&tree(json!({"color": "green", "unknown": true})));
    assert_eq!(core.config_value(&["color"]), Some(&json!("green")));
    assert!(core.config_value(&["unknown"]).is_none());
    assert!(core.is_extended());

    core.unextend_config_values();
    assert_eq!(core.config_values(), &snapshot);
    assert!(!core.is_extended());
    assert_eq!(core.value(&["color"]), Some(&json!("blue")));
}

#[rstest]
fn extend_is_idempotent(#[from(core_plugin)] mut core: SettingsPlugin) {
    let source = tree(json!({"size": 20, "nested": {"b": 9}}));
    core.extend_config_values(&source);
    let once = core.values().clone();
    core.extend_config_values(&source);
    assert_eq!(core.values(), &once);
}

#[rstest]
fn nearer_ancestor_wins_when_extensions_chain(#[from(core_plugin)] mut core: SettingsPlugin) {
    core.extend_config_values(&tree(json!({"color": "far", "size": 1})));
    core.extend_config_values(&tree(json!({"color": "near"})));
    assert_eq!(core.value(&["color"]), Some(&json!("near")));
    assert_eq!(core.value(&["size"]), Some(&json!(1)));
}

#[rstest]
fn grandparent_values_survive_into_the_extended_variation_values() {
    let mut grandchild = plugin(json!({}), json!({"nested": {"b": 9}}), Some("theme_c"));
    grandchild.extend_config_values(&tree(json!({"color": "far", "size": 4})));
    grandchild.extend_config_values(&tree(json!({"color": "near"})));
    assert_eq!(
        Value::Object(grandchild.extended_variation_values()),
        json!({"color": "near", "size": 4, "nested": {"b": 9}})
    );
}

#[rstest]
fn variation_payload_beats_inherited_values() {
    let mut child = plugin(json!({}), json!({"color": "own"}), Some("theme_child"));
    child.extend_config_values(&tree(json!({"color": "inherited", "size": 3})));
    assert_eq!(child.value(&["color"]), Some(&json!("own")));
    assert_eq!(child.value(&["size"]), Some(&json!(3)));
    assert_eq!(
        Value::Object(child.extended_variation_values()),
        json!({"color": "own", "size": 3})
    );
}

#[rstest]
fn merge_values_with_current_keeps_untouched_fields(#[from(core_plugin)] core: SettingsPlugin) {
    let base = tree(json!({"color": "black"}));
    let instance = tree(json!({"nested": {"b": 4}, "regions": {"9": "x"}}));
    let merged = core.merge_values_with_current(&[base, instance]);
    assert_eq!(merged.get("color"), Some(&json!("black")));
    assert_eq!(merged.get("size"), Some(&json!(10)));
    assert_eq!(merged.get("nested"), Some(&json!({"a": 5, "b": 4})));
    assert_eq!(merged.get("regions"), Some(&json!({"9": "x"})));
}

#[rstest]
fn extract_settings_form_values_drops_unknown_keys(#[from(core_plugin)] core: SettingsPlugin) {
    let submitted = tree(json!({
        "color": "white",
        "nested": {"a": 6, "ghost": 1},
        "regions": {"3": "main"},
        "op": "Save",
    }));
    let extracted = core.extract_settings_form_values(&submitted);
    assert_eq!(
        Value::Object(extracted),
        json!({"color": "white", "nested": {"a": 6}, "regions": {"3": "main"}})
    );
}

#[rstest]
fn extract_base_values_align_with_defaults(#[from(core_plugin)] core: SettingsPlugin) {
    let submitted = tree(json!({"size": 4, "settings_scope_front": "theme_a"}));
    assert_eq!(
        Value::Object(core.extract_base_settings_form_values(&submitted)),
        json!({"size": 4})
    );
}

#[rstest]
fn diff_values_reflect_extension() {
    let mut core = plugin(json!({"color": "blue", "size": 10}), json!({}), None);
    assert!(core.diff_values().is_empty());
    core.extend_config_values(&tree(json!({"color": "green"})));
    assert_eq!(Value::Object(core.diff_values()), json!({"color": "green"}));
    assert_eq!(core.diff_value(&["color"]), Some(json!("green")));
}

#[rstest]
fn diff_values_fall_back_to_defaults_without_config() {
    let plugin = plugin(json!({}), json!({"size": 11}), Some("theme_a"));
    assert_eq!(Value::Object(plugin.diff_values()), json!({"size": 11}));
}

#[rstest]
fn diff_config_values_ignore_extension(#[from(core_plugin)] mut core: SettingsPlugin) {
    core.extend_config_values(&tree(json!({"size": 99})));
    assert_eq!(
        Value::Object(core.diff_config_values()),
        json!({"color": "blue", "nested": {"a": 5}})
    );
    assert!(core.diff_config_value(&["size"]).is_none());
}

#[rstest]
#[case(None, "theme", false)]
#[case(Some(""), "theme", false)]
#[case(Some("theme_dark"), "theme_dark", true)]
fn identity_follows_variation_id(
    #[case] variation_id: Option<&str>,
    #[case] expected_id: &str,
    #[case] is_variation: bool,
) {
    let plugin = plugin(json!({}), json!({}), variation_id);
    assert_eq!(plugin.id(), expected_id);
    assert_eq!(plugin.plugin_id(), "theme");
    assert_eq!(plugin.is_variation(), is_variation);
}

#[rstest]
fn cache_tags_name_the_config_document(#[from(core_plugin)] core: SettingsPlugin) {
    assert_eq!(core.cache_tags(), vec![String::from("config:theme.settings")]);
}
