//! CLI command implementations

pub mod auth;
pub mod config;
pub mod delete;
pub mod finish;
pub mod logs;
pub mod match_cmd;
pub mod matches;
pub mod process;
pub mod reconcile;
pub mod show;
pub mod unmatch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use conciliador_core::{ConciliadorContext, LogEvent, LoggingService};

use crate::output;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (never blocks a command)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Data directory from `CONCILIADOR_DIR` or `~/.conciliador`
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("CONCILIADOR_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".conciliador"))
        .context("Could not find home directory; set CONCILIADOR_DIR")
}

/// Get or create the conciliador context
pub fn get_context() -> Result<ConciliadorContext> {
    let data_dir = get_data_dir()?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    ConciliadorContext::new(&data_dir).context("Failed to initialize conciliador context")
}

/// Run `f` behind a spinner unless output is JSON
pub fn with_spinner<T>(msg: &str, json: bool, f: impl FnOnce() -> Result<T>) -> Result<T> {
    if json {
        return f();
    }
    let pb = output::spinner(msg);
    let result = f();
    pb.finish_and_clear();
    result
}
