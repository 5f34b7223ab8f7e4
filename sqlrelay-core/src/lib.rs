//! sqlrelay Core - applying SQL migration scripts over a remote RPC endpoint
//!
//! This crate implements the core logic following hexagonal architecture:
//!
//! - **domain**: Script loading, statement splitting/classification, reports
//! - **ports**: Trait definitions for external dependencies (StatementExecutor)
//! - **services**: Business logic orchestration (apply, check, run history)
//! - **adapters**: Concrete implementations (HTTP RPC client)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::RpcClient;
use config::{Config, Credentials};
use services::ApplyService;

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{
    Action, ApplyReport, MigrationScript, Statement, StatementOutcome, StatementReport,
};
pub use services::{ApplyOptions, CheckReport, CheckService, LoggingService, RunRecord};

/// Main context for sqlrelay operations
///
/// The primary entry point for applying migrations. It resolves the
/// configuration and credentials into an RPC-backed apply service.
pub struct RelayContext {
    pub config: Config,
    pub apply_service: ApplyService,
}

impl RelayContext {
    /// Create a new context from the app directory and credentials
    pub fn new(app_dir: &Path, credentials: Credentials) -> Result<Self> {
        let config = Config::load(app_dir)?;

        let endpoint = config.require_endpoint()?;
        let client = RpcClient::new(
            endpoint,
            &config.rpc_path,
            &credentials.service_key,
            config.timeout(),
        )?;

        let apply_service = ApplyService::new(Arc::new(client));

        Ok(Self {
            config,
            apply_service,
        })
    }
}
