mod banner;
mod cli;
mod commands;
mod http;
mod logging;
mod shutdown;

use anyhow::Result;
use clap::Parser;
use sign_core::AppSettings;
use tracing::{info, warn};

use cli::{Args, Command};

fn main() -> Result<()> {
    let args = Args::parse();

    // Config comes first since it carries the log level; report the outcome
    // once logging is up.
    let loaded = AppSettings::load(&args.config);
    let mut settings = match &loaded {
        Ok(settings) => settings.clone(),
        Err(_) => AppSettings::default(),
    };
    args.apply_overrides(&mut settings);

    logging::init(&settings.logging)?;

    match loaded {
        Ok(_) => info!("Loaded config from {:?}", args.config),
        Err(e) if e.is_not_found() => {
            warn!("Config file {:?} not found, using defaults", args.config)
        }
        Err(e) => warn!("Failed to load config: {}, using defaults", e),
    }

    match args.selected_command() {
        Command::Serve => commands::serve::run(&settings),
        Command::Check => commands::check::run(&settings),
    }
}
