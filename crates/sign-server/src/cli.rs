use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sign_core::AppSettings;

#[derive(Parser)]
#[command(name = "sign-server")]
#[command(about = "HTTP signing service backed by a native module")]
#[command(version)]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Listen host (overrides the config file)
    #[arg(long, env = "SIGN_SERVER_HOST")]
    pub host: Option<String>,

    /// Listen port (overrides the config file)
    #[arg(long, env = "SIGN_SERVER_PORT")]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Load the module, report what was resolved, then unload
    Check,
}

impl Args {
    pub fn selected_command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }

    /// Apply command-line overrides on top of file settings.
    pub fn apply_overrides(&self, settings: &mut AppSettings) {
        if let Some(host) = &self.host {
            settings.sign_service.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.sign_service.port = port;
        }
    }
}
