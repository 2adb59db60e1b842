//! Diagnostic logging.
//!
//! Diagnostics go through `tracing` and are separate from the query log,
//! which is a transcript of what the user saw. The filter comes from
//! `SQLVIS_LOG` (falling back to `warn`); output goes to stderr or, with
//! `--trace-file`, to that file.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "SQLVIS_LOG";

/// Install the global subscriber. Keep the guard alive until exit so
/// buffered events are written.
pub fn init(trace_file: Option<&Path>) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let (writer, guard, ansi) = match trace_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening trace file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (writer, guard, false)
        }
        None => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
            (writer, guard, console::colors_enabled_stderr())
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;
    Ok(guard)
}
