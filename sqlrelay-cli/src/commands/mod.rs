//! CLI command implementations

pub mod apply;
pub mod check;
pub mod history;
pub mod plan;
pub mod setup;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use sqlrelay_core::config::{Config, Credentials};
use sqlrelay_core::{LoggingService, MigrationScript, RelayContext, RunRecord};

/// Get the app directory from environment or default
pub fn get_app_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SQLRELAY_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".sqlrelay")
    }
}

/// Load the config, falling back to defaults on error
pub fn get_config() -> Config {
    Config::load(&get_app_dir()).unwrap_or_default()
}

/// Get or create the relay context (config + credentials + RPC client)
pub fn get_context() -> Result<RelayContext> {
    let app_dir = get_app_dir();
    std::fs::create_dir_all(&app_dir)
        .with_context(|| format!("Failed to create app directory: {:?}", app_dir))?;

    let credentials = Credentials::from_env()?;

    RelayContext::new(&app_dir, credentials).context("Failed to initialize sqlrelay context")
}

/// Get the logging service for run history
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    LoggingService::new(&get_app_dir()).ok()
}

/// Record a run, ignoring any errors (logging should never break the app)
pub fn log_run(logger: &Option<LoggingService>, record: &RunRecord) {
    if let Some(l) = logger {
        let _ = l.record(record);
    }
}

/// Read a script from a file path, or from stdin when piped
pub fn read_script(file: Option<&Path>) -> Result<MigrationScript> {
    if let Some(path) = file {
        return Ok(MigrationScript::load(path)?);
    }

    if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read SQL from stdin")?;
        return Ok(MigrationScript::from_sql("<stdin>", buffer));
    }

    anyhow::bail!("No script provided. Pass a file path or pipe SQL on stdin.");
}
