//! CLI entrypoint for `settings-ctl`.

use std::io;

use clap::Parser;
use settings_ctl::cli::Cli;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    settings_ctl::logging::init(cli.verbose)?;
    let mut stdout = io::stdout().lock();
    settings_ctl::run(&cli, &mut stdout)?;
    Ok(())
}
