//! Logging setup for cluster-testdata.
//!
//! Output goes to stderr. On an interactive terminal the format carries a
//! timestamp, level, target and line number; otherwise it is a plain line
//! format (no ANSI, no timestamp) so syslog/journald capture stays readable.

use std::io::IsTerminal;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::cli::Options;

/// Resolved logging settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    /// Level applied to this crate's targets.
    pub level: Level,
    /// When set, no subscriber is installed.
    pub silent: bool,
}

impl LogSettings {
    /// Combine CLI flags with the optional `loglevel` configuration key.
    ///
    /// The configuration always overrides the command line. An override that
    /// resolves to debug also cancels `--silent`. `loglevel` is validated by
    /// [`crate::config::load`]; an unparseable value here leaves the CLI level.
    pub fn resolve(options: &Options, loglevel: Option<&str>) -> Self {
        let mut settings = Self {
            level: if options.debug {
                Level::DEBUG
            } else {
                Level::INFO
            },
            silent: options.silent,
        };

        if let Some(level) = loglevel.and_then(parse_level) {
            settings.level = level;
            if level == Level::DEBUG {
                settings.silent = false;
            }
        }

        settings
    }

    /// `EnvFilter` directive: dependencies at warn, this crate at `level`.
    pub fn directive(&self) -> String {
        format!(
            "warn,{}={}",
            env!("CARGO_CRATE_NAME"),
            self.level.as_str().to_ascii_lowercase()
        )
    }
}

/// Parse a level name. Accepts the names found in existing
/// configuration files (`WARNING`, `CRITICAL`, `FATAL`) as well as tracing's own.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" | "critical" | "fatal" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize logging. Does nothing in silent mode.
pub fn init(settings: &LogSettings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if settings.silent {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.directive()));

    if std::io::stderr().is_terminal() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_line_number(true),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .without_time(),
            )
            .try_init()?;
    }

    Ok(())
}
