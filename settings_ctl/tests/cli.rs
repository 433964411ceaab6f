//! Command-line behaviour against a throwaway store directory.

use std::fs;

use anyhow::{Context, Result, anyhow, ensure};
use camino::Utf8PathBuf;
use clap::Parser;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use settings_ctl::cli::Cli;
use settings_ctl::error::CtlError;
use tempfile::TempDir;
use test_helpers::tree::{ensure_absent, ensure_value, tree};

const THEME_REGISTRATION: &str = r#"
label = "Theme"
config_name = "theme.settings"
variation_allow = true
variation_scope = "theme"

[defaults]
color = "red"
size = 1
"#;

struct Site {
    _dir: TempDir,
    root: Utf8PathBuf,
    defaults: Utf8PathBuf,
}

impl Site {
    fn run(&self, args: &[&str]) -> Result<String, CtlError> {
        let mut argv = vec![
            "settings-ctl",
            "--root",
            self.root.as_str(),
            "--defaults",
            self.defaults.as_str(),
        ];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).map_err(|err| CtlError::Rejected(err.to_string()))?;
        let mut out = Vec::new();
        settings_ctl::run(&cli, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn ok(&self, args: &[&str]) -> Result<String> {
        self.run(args)
            .map_err(|err| anyhow!("{} failed: {err}", args.join(" ")))
    }

    fn json(&self, args: &[&str]) -> Result<Value> {
        let out = self.ok(args)?;
        serde_json::from_str(&out).with_context(|| format!("parse output {out:?}"))
    }
}

#[fixture]
fn site() -> Result<Site> {
    let dir = TempDir::new().context("create temp dir")?;
    let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .map_err(|path| anyhow!("non UTF-8 temp path {}", path.display()))?;
    let defaults = base.join("defaults");
    fs::create_dir_all(&defaults).context("create registrations dir")?;
    fs::write(defaults.join("theme.toml"), THEME_REGISTRATION).context("write registration")?;
    Ok(Site {
        _dir: dir,
        root: base.join("store"),
        defaults,
    })
}

#[fixture]
fn seeded(site: Result<Site>) -> Result<Site> {
    let seeded_site = site?;
    seeded_site.ok(&["save", "theme", "--label", "Dark", "--settings", r#"{"color":"black"}"#])?;
    seeded_site.ok(&[
        "save", "theme", "--label", "Light", "--parent", "theme_dark", "--weight", "1",
    ])?;
    Ok(seeded_site)
}

#[rstest]
fn saved_variations_are_listed_in_order(seeded: Result<Site>) -> Result<()> {
    let site = seeded?;
    let listing = site.ok(&["list", "theme"])?;
    ensure!(
        listing == "theme_dark\tDark\tenabled\t0\t-\ntheme_light\tLight\tenabled\t1\ttheme_dark\n",
        "listing was {listing:?}"
    );
    Ok(())
}

#[rstest]
fn saving_an_existing_label_updates_it(seeded: Result<Site>) -> Result<()> {
    let site = seeded?;
    let out = site.ok(&["save", "theme", "--label", "Dark", "--enabled", "false"])?;
    ensure!(out == "updated theme_dark\n", "save printed {out:?}");
    let listing = site.ok(&["list", "theme"])?;
    ensure!(
        listing.lines().last() == Some("theme_dark\tDark\tdisabled\t0\t-"),
        "listing was {listing:?}"
    );
    Ok(())
}

#[rstest]
fn children_resolve_inherited_values(seeded: Result<Site>) -> Result<()> {
    let site = seeded?;
    let report = tree(site.json(&["active", "theme", "--variation", "theme_light"])?);
    ensure_value(&report, &["id"], &json!("theme_light"))?;
    ensure_value(&report, &["variation"], &json!(true))?;
    ensure_value(&report, &["values", "color"], &json!("black"))?;
    ensure_value(&report, &["values", "size"], &json!(1))?;
    Ok(())
}

#[rstest]
fn diff_reports_overridden_values(seeded: Result<Site>) -> Result<()> {
    let site = seeded?;
    let diff = tree(site.json(&["diff", "theme", "--variation", "theme_dark"])?);
    ensure_value(&diff, &["color"], &json!("black"))?;
    ensure_absent(&diff, &["size"])?;
    Ok(())
}

#[rstest]
fn config_scope_selects_a_variation(seeded: Result<Site>) -> Result<()> {
    let site = seeded?;
    let written = tree(site.json(&[
        "config",
        "theme",
        "--settings",
        r#"{"color":"green"}"#,
        "--scope-front",
        "theme_dark",
    ])?);
    ensure_value(&written, &["color"], &json!("green"))?;
    ensure_value(&written, &["settings_scope_front"], &json!("theme_dark"))?;

    let front = tree(site.json(&["active", "theme", "--core-only", "--scope", "front"])?);
    ensure_value(&front, &["id"], &json!("theme"))?;
    ensure_value(&front, &["variation"], &json!(false))?;
    ensure_value(&front, &["values", "color"], &json!("black"))?;

    let back = tree(site.json(&["active", "theme", "--core-only", "--scope", "back"])?);
    ensure_value(&back, &["values", "color"], &json!("green"))?;

    let diff = tree(site.json(&["diff", "theme"])?);
    ensure_value(&diff, &["color"], &json!("green"))?;
    Ok(())
}

#[rstest]
fn config_keeps_the_stored_scope_when_omitted(seeded: Result<Site>) -> Result<()> {
    let site = seeded?;
    site.ok(&["config", "theme", "--scope-back", "theme_light"])?;
    let written = tree(site.json(&["config", "theme", "--settings", r#"{"size":3}"#])?);
    ensure_value(&written, &["settings_scope_back"], &json!("theme_light"))?;
    ensure_value(&written, &["size"], &json!(3))?;
    Ok(())
}

#[rstest]
fn config_reset_clears_the_document(seeded: Result<Site>) -> Result<()> {
    let site = seeded?;
    site.ok(&["config", "theme", "--settings", r#"{"color":"green"}"#])?;
    let written = site.json(&["config", "theme", "--reset"])?;
    ensure!(written == json!({}), "reset wrote {written}");
    let diff = site.json(&["diff", "theme"])?;
    ensure!(diff == json!({}), "diff after reset was {diff}");
    Ok(())
}

#[rstest]
fn circular_parents_are_rejected(seeded: Result<Site>) -> Result<()> {
    let site = seeded?;
    let err = site
        .run(&["save", "theme", "--label", "Dark", "--parent", "theme_light"])
        .err()
        .ok_or_else(|| anyhow!("circular parent accepted"))?;
    ensure!(matches!(err, CtlError::Rejected(_)), "unexpected error {err}");
    ensure!(err.to_string().contains("parent:"), "message was {err}");
    let listing = site.ok(&["list", "theme"])?;
    ensure!(listing.contains("theme_dark\tDark\tenabled\t0\t-"), "listing was {listing:?}");
    Ok(())
}

#[rstest]
fn unknown_variations_are_reported(seeded: Result<Site>) -> Result<()> {
    let site = seeded?;
    let err = site
        .run(&["active", "theme", "--variation", "theme_missing"])
        .err()
        .ok_or_else(|| anyhow!("missing variation resolved"))?;
    ensure!(
        matches!(&err, CtlError::UnknownVariation { id, .. } if id == "theme_missing"),
        "unexpected error {err}"
    );
    Ok(())
}

#[rstest]
fn settings_must_be_a_json_object(site: Result<Site>) -> Result<()> {
    let empty = site?;
    let err = empty
        .run(&["save", "theme", "--label", "Odd", "--settings", "[1]"])
        .err()
        .ok_or_else(|| anyhow!("array settings accepted"))?;
    ensure!(matches!(err, CtlError::SettingsNotObject), "unexpected error {err}");
    Ok(())
}

#[rstest]
fn unknown_plugin_types_fail(site: Result<Site>) -> Result<()> {
    let empty = site?;
    let err = empty
        .run(&["list", "menu"])
        .err()
        .ok_or_else(|| anyhow!("unknown plugin type listed"))?;
    ensure!(matches!(err, CtlError::Settings(_)), "unexpected error {err}");
    Ok(())
}
