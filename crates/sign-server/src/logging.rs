//! Console and file logging.
//!
//! Each event is printed as
//!
//! ```text
//! info: sign_core::service
//!       [2024-05-01 12:00:00] Signing completed token_len=64
//! ```

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use sign_core::LoggingConfig;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, fmt as subscriber_fmt};

const INDENT: &str = "      ";

/// Map a configured level name to a filter.
///
/// Accepts tracing names and the `Information`/`Warning`/`Critical`/`None`
/// spellings, case-insensitively.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" | "information" => Some(LevelFilter::INFO),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "error" | "critical" => Some(LevelFilter::ERROR),
        "off" | "none" => Some(LevelFilter::OFF),
        _ => None,
    }
}

fn level_tag(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "trce",
        Level::DEBUG => "dbug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "fail",
    }
}

/// Two-line console format: level tag and target, then timestamp and message.
pub struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let tag = level_tag(meta.level());

        if writer.has_ansi_escapes() {
            match *meta.level() {
                Level::TRACE | Level::DEBUG => write!(writer, "{}", tag.bright_black())?,
                Level::INFO => write!(writer, "{}", tag.green())?,
                Level::WARN => write!(writer, "{}", tag.yellow())?,
                Level::ERROR => write!(writer, "{}", tag.red())?,
            }
        } else {
            write!(writer, "{}", tag)?;
        }
        writeln!(writer, ": {}", meta.target())?;

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        write!(writer, "{}[{}] ", INDENT, timestamp)?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = parse_level(&config.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(level.unwrap_or(LevelFilter::INFO).into())
    });

    let console = subscriber_fmt::layer()
        .with_ansi(io::stdout().is_terminal())
        .event_format(ConsoleFormat);

    let file = if config.enable_file_logging {
        let file = open_log_file(&config.log_file_path)?;
        Some(
            subscriber_fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .event_format(ConsoleFormat),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .context("Failed to initialize logging")?;

    if level.is_none() {
        tracing::warn!("Unknown log level '{}', using Information", config.level);
    }
    if config.enable_file_logging {
        tracing::info!("Logging to {}", config.log_file_path.display());
    }
    Ok(())
}
