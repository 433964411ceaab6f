//! Command-line interface definitions for `settings-ctl`.

use camino::Utf8PathBuf;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use settings_variants::repository::Scope;

/// Parsed CLI arguments for `settings-ctl`.
#[derive(Debug, Parser)]
#[command(name = "settings-ctl")]
#[command(about = "Inspect and edit layered settings variations")]
#[command(version)]
pub struct Cli {
    /// Directory holding the variation records and config documents.
    #[arg(long, env = "SETTINGS_CTL_ROOT", value_name = "dir")]
    pub root: Utf8PathBuf,
    /// Directory of `<plugin>.toml` plugin type registrations.
    #[arg(long, env = "SETTINGS_CTL_DEFAULTS", value_name = "dir")]
    pub defaults: Utf8PathBuf,
    /// Raise log verbosity (repeat for more detail).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Operations offered by `settings-ctl`.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the variations of a plugin type in listing order.
    List(PluginArg),
    /// Print the instance a request would resolve to.
    Active(ActiveArgs),
    /// Print the values that differ from stored state.
    Diff(DiffArgs),
    /// Create or update a variation.
    Save(SaveArgs),
    /// Write or reset the base config of a plugin type.
    Config(ConfigArgs),
}

/// Plugin type selection.
#[derive(Debug, Clone, ClapArgs)]
pub struct PluginArg {
    /// Plugin type id.
    pub plugin: String,
}

/// Request scope accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScopeArg {
    /// Public-facing requests.
    Front,
    /// Administrative requests.
    Back,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Front => Self::Front,
            ScopeArg::Back => Self::Back,
        }
    }
}

/// Arguments of `active`.
#[derive(Debug, Clone, ClapArgs)]
pub struct ActiveArgs {
    /// Plugin type id.
    pub plugin: String,
    /// Scope of the simulated request.
    #[arg(long, value_enum)]
    pub scope: Option<ScopeArg>,
    /// Only consider the core configuration.
    #[arg(long = "core-only")]
    pub is_core_only: bool,
    /// Variation bound to the simulated request.
    #[arg(long, value_name = "id")]
    pub variation: Option<String>,
}

/// Arguments of `diff`.
#[derive(Debug, Clone, ClapArgs)]
pub struct DiffArgs {
    /// Plugin type id.
    pub plugin: String,
    /// Variation to diff; the core config is diffed against the defaults
    /// when omitted.
    #[arg(long, value_name = "id")]
    pub variation: Option<String>,
}

/// Arguments of `save`.
#[derive(Debug, Clone, ClapArgs)]
pub struct SaveArgs {
    /// Plugin type id.
    pub plugin: String,
    /// Variation label.
    #[arg(long)]
    pub label: String,
    /// Id of an existing variation to update; derived from the label when
    /// omitted.
    #[arg(long, value_name = "id")]
    pub id: Option<String>,
    /// Parent variation id; pass an empty string to clear it.
    #[arg(long, value_name = "id")]
    pub parent: Option<String>,
    /// Ordering weight.
    #[arg(long, allow_negative_numbers = true)]
    pub weight: Option<i32>,
    /// Enabled flag.
    #[arg(long, value_name = "bool")]
    pub enabled: Option<bool>,
    /// Settings payload as a JSON object.
    #[arg(long, value_name = "json")]
    pub settings: Option<String>,
    /// Settings path (dot separated) that should inherit instead of being
    /// stored; repeat for several.
    #[arg(long = "use-default", value_name = "path")]
    pub use_default: Vec<String>,
}

/// Arguments of `config`.
#[derive(Debug, Clone, ClapArgs)]
pub struct ConfigArgs {
    /// Plugin type id.
    pub plugin: String,
    /// Settings to merge into the base config, as a JSON object.
    #[arg(long, value_name = "json", conflicts_with = "is_reset")]
    pub settings: Option<String>,
    /// Variation applied to front-end requests; pass an empty string to
    /// clear the selection.
    #[arg(long, value_name = "id")]
    pub scope_front: Option<String>,
    /// Variation applied to back-end requests; pass an empty string to clear
    /// the selection.
    #[arg(long, value_name = "id")]
    pub scope_back: Option<String>,
    /// Replace the base config with the plugin type's reset values.
    #[arg(long = "reset")]
    pub is_reset: bool,
}
