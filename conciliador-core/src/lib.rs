//! Conciliador Core - manual bank reconciliation client
//!
//! This crate implements the client side of the reconciliation workflow
//! following hexagonal architecture:
//!
//! - **domain**: Movements, reconciliations, selections and the session state machine
//! - **ports**: Trait definitions for the remote API and the front end (ReconciliationApi, SessionView)
//! - **services**: Session controller, reconciliation actions, event log
//! - **adapters**: Concrete implementations (reqwest client, token store)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adapters::auth::{AuthenticatedClient, TokenStore};
use adapters::http_api::HttpReconciliationApi;
use config::Config;
use ports::ReconciliationApi;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result as CoreResult};
pub use domain::{
    Direction, ManualReconciliationRequest, MatchesOverview, Movement, Origin,
    ReconciliationDetail, SessionState,
};
pub use services::{
    events, ActionOutcome, LogEntry, LogEvent, LoggingService, ReconciliationService,
    ReconciliationSessionController, SessionAction,
};

/// Bearer token taken from the environment instead of the token store
pub const TOKEN_ENV: &str = "CONCILIADOR_TOKEN";

/// Main context for Conciliador operations
///
/// Holds the configuration, the token store and the API client every
/// command works through.
pub struct ConciliadorContext {
    pub data_dir: PathBuf,
    pub config: Config,
    pub tokens: TokenStore,
    pub api: Arc<dyn ReconciliationApi>,
    pub reconciliation_service: ReconciliationService,
}

impl ConciliadorContext {
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let tokens = TokenStore::new(data_dir);

        let mut client =
            AuthenticatedClient::new(&config.base_url, config.timeout_seconds, tokens.clone())?;
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            client = client.with_token(token);
        }

        let api: Arc<dyn ReconciliationApi> = Arc::new(HttpReconciliationApi::new(client));
        let reconciliation_service = ReconciliationService::new(Arc::clone(&api));

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            config,
            tokens,
            api,
            reconciliation_service,
        })
    }

    /// Interactive session controller for one reconciliation
    pub fn session_controller(
        &self,
        reconciliation_id: i64,
        view: Arc<dyn ports::SessionView>,
    ) -> ReconciliationSessionController {
        ReconciliationSessionController::new(reconciliation_id, Arc::clone(&self.api), view)
    }
}
