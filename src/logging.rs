// src/logging.rs
//! Subscriber setup: console (compact or JSON) plus an optional plain-text log file.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

pub const ENV_LOG_JSON: &str = "MODERATOR_LOG_JSON";
const DEFAULT_FILTER: &str = "mention_moderator=info,warn";

/// Open `path` for appending, creating parent directories.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

/// Plain-text layer appending to `path`. No ANSI colors.
pub fn file_layer<S>(path: &Path) -> Result<impl Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let file = open_log_file(path)?;
    Ok(fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file)))
}

/// Install the global subscriber. `RUST_LOG` wins over the default filter;
/// `MODERATOR_LOG_JSON=1` switches the console to JSON lines.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(ENV_LOG_JSON)
        .ok()
        .is_some_and(|v| v == "1");

    let (compact, json_layer) = if json {
        (None, Some(fmt::layer().json()))
    } else {
        (Some(fmt::layer().compact()), None)
    };
    // sits directly on the registry; the filter still applies to every layer
    let file = log_file.map(file_layer::<Registry>).transpose()?;

    tracing_subscriber::registry()
        .with(file)
        .with(filter)
        .with(compact)
        .with(json_layer)
        .try_init()
        .context("installing tracing subscriber")?;
    Ok(())
}
