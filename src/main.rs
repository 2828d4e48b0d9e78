//! # Scoretable command-line entry point
//!
//! Every invocation loads the working table named by `--table`, runs one
//! command against it and writes it back:
//!
//! ```bash
//! scoretable add --table rows.csv --values 3,1,0,1,0,1,0,1,0,1,0,1,5
//! scoretable correct --table rows.csv --all
//! scoretable calculate --table rows.csv --rows 1,2
//! scoretable export --table rows.csv --output scored.xlsx
//! ```
//!
//! Settings (model, normalization bounds, persisted defaults) come from
//! `--config`, or `config.json` in the platform config directory.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Command results go to stdout

mod cli;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use scoretable::config::{default_config_path, load_app_config};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let settings = load_app_config(&config_path);

    scoretable::logging::init(settings.log_dir.as_deref())
        .context("Failed to initialize logging")?;
    tracing::debug!(config = %config_path.display(), "settings loaded");

    cli::run_command(cli, &settings)
}
