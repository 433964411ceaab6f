//! Administrative command-line tooling for layered settings variations.
//!
//! `settings-ctl` opens a directory-backed store, registers the plugin types
//! described by TOML registration documents and runs one command against
//! them: listing variations, resolving the active instance of a simulated
//! request, printing diffs, saving variations and writing base config.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod registration;

use std::io::Write;

use crate::cli::Cli;
use crate::commands::Workspace;
use crate::error::CtlError;

/// Run the command described by `cli`, writing its report to `out`.
///
/// # Errors
///
/// Returns a [`CtlError`] when the store or registrations cannot be opened
/// or the command fails.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<(), CtlError> {
    let workspace = Workspace::open(&cli.root, &cli.defaults)?;
    workspace.execute(&cli.command, out)
}
