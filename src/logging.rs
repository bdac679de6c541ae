//! Tracing subscriber setup.
//!
//! The filter comes from `RUST_LOG` when it is set. Otherwise it is built
//! from the `[logging]` section: the base level followed by the optional
//! per-target directives.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::{ParlorError, Result};

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Filter directives for a logging section.
///
/// The level is case-insensitive and `warning` is accepted for `warn`.
pub fn filter_directives(config: &LoggingConfig) -> Result<String> {
    let level = match config.level.trim().to_lowercase().as_str() {
        "warning" => "warn".to_string(),
        level if LEVELS.contains(&level) => level.to_string(),
        _ => {
            return Err(ParlorError::Config(format!(
                "unknown log level: {}",
                config.level
            )))
        }
    };

    let extra = config.filter.trim();
    let directives = if extra.is_empty() {
        level
    } else {
        format!("{level},{extra}")
    };

    EnvFilter::try_new(&directives)
        .map_err(|e| ParlorError::Config(format!("invalid log filter {directives:?}: {e}")))?;
    Ok(directives)
}

fn env_or(directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

fn open_log_file(path: &str, append: bool) -> Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    Ok(file)
}

/// Install the global subscriber.
///
/// Logs go to the console and, when `config.file` is set, to that file too.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = env_or(&filter_directives(config)?);

    let file_layer = if config.file.is_empty() {
        None
    } else {
        let file = open_log_file(&config.file, config.append)?;
        Some(
            fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_target(true),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    Ok(())
}

/// Install a console-only subscriber.
///
/// Used when `init` fails. An invalid level falls back to `info`.
pub fn init_console_only(config: &LoggingConfig) {
    let directives = filter_directives(config).unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(env_or(&directives))
        .with(fmt::layer().with_target(true))
        .init();
}
