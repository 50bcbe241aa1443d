//! Reconciliation service - the detail-page actions outside manual pairing

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::{Error, MatchesOverview, ReconciliationDetail};
use crate::ports::ReconciliationApi;

/// Outcome of an action that only returns a server message
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    pub reconciliation_id: i64,
    pub message: String,
}

/// Service for reading and changing a reconciliation as a whole
pub struct ReconciliationService {
    api: Arc<dyn ReconciliationApi>,
}

impl ReconciliationService {
    pub fn new(api: Arc<dyn ReconciliationApi>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> Arc<dyn ReconciliationApi> {
        Arc::clone(&self.api)
    }

    pub fn detail(&self, reconciliation_id: i64) -> Result<ReconciliationDetail> {
        self.api
            .get_detail(reconciliation_id)
            .with_context(|| format!("Failed to load reconciliation #{}", reconciliation_id))
    }

    /// Run the server's automatic matching
    pub fn process(&self, reconciliation_id: i64) -> Result<ActionResult> {
        let body = self
            .api
            .process(reconciliation_id)
            .with_context(|| format!("Failed to process reconciliation #{}", reconciliation_id))?;
        Ok(ActionResult {
            reconciliation_id,
            message: body.message.unwrap_or_default(),
        })
    }

    /// Mark the reconciliation finished. Refused when it already is.
    pub fn finish(&self, reconciliation_id: i64) -> Result<ActionResult> {
        let detail = self.detail(reconciliation_id)?;
        if detail.conciliacion.is_finished() {
            return Err(Error::invalid_transition(format!(
                "reconciliation #{} is already finished",
                reconciliation_id
            ))
            .into());
        }

        let body = self
            .api
            .finish(reconciliation_id)
            .with_context(|| format!("Failed to finish reconciliation #{}", reconciliation_id))?;
        Ok(ActionResult {
            reconciliation_id,
            message: body.message.unwrap_or_default(),
        })
    }

    pub fn delete(&self, reconciliation_id: i64) -> Result<ActionResult> {
        let body = self
            .api
            .delete(reconciliation_id)
            .with_context(|| format!("Failed to delete reconciliation #{}", reconciliation_id))?;
        Ok(ActionResult {
            reconciliation_id,
            message: body.message.unwrap_or_default(),
        })
    }

    /// Automatic matches and manual groups
    pub fn matches(&self, reconciliation_id: i64) -> Result<MatchesOverview> {
        self.api
            .get_matches(reconciliation_id)
            .with_context(|| format!("Failed to load matches of reconciliation #{}", reconciliation_id))
    }

    /// Undo one automatic match; its movements become unreconciled again
    pub fn remove_match(&self, match_id: i64) -> Result<String> {
        let body = self
            .api
            .delete_match(match_id)
            .with_context(|| format!("Failed to remove match #{}", match_id))?;
        Ok(body.message.unwrap_or_default())
    }
}

/// True when `error` (or its cause) is a 401 from the API
pub fn is_unauthorized(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<Error>(), Some(Error::Unauthorized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::{AuthenticatedClient, TokenStore};
    use crate::adapters::http_api::HttpReconciliationApi;
    use crate::adapters::mock_api::{MockConfig, MockReconciliationServer};
    use tempfile::tempdir;

    fn service(server: &MockReconciliationServer, dir: &std::path::Path) -> ReconciliationService {
        let store = TokenStore::new(dir);
        store.set("valid_token", 30).unwrap();
        let client = AuthenticatedClient::new(&server.base_url(), 5, store).unwrap();
        ReconciliationService::new(Arc::new(HttpReconciliationApi::new(client)))
    }

    #[test]
    fn test_finish_open_reconciliation() {
        let server = MockReconciliationServer::start(MockConfig::default()).unwrap();
        let dir = tempdir().unwrap();
        let service = service(&server, dir.path());

        let result = service.finish(42).unwrap();
        assert!(result.message.contains("finalizada"));
        assert_eq!(
            server
                .requests_to("POST", "/api/conciliaciones/42/terminar_conciliacion")
                .len(),
            1
        );
    }

    #[test]
    fn test_missing_reconciliation_keeps_server_text() {
        let server = MockReconciliationServer::start(MockConfig::default()).unwrap();
        let dir = tempdir().unwrap();
        let service = service(&server, dir.path());

        let err = service.process(7).unwrap_err();
        assert!(format!("{:#}", err).contains("no encontrada"));
        assert!(!is_unauthorized(&err));
    }

    #[test]
    fn test_unauthorized_is_detectable_through_context() {
        let server = MockReconciliationServer::start(MockConfig {
            fail_auth: true,
            ..Default::default()
        })
        .unwrap();
        let dir = tempdir().unwrap();
        let service = service(&server, dir.path());

        let err = service.matches(42).unwrap_err();
        assert!(is_unauthorized(&err));
    }

    #[test]
    fn test_remove_match() {
        let server = MockReconciliationServer::start(MockConfig::default()).unwrap();
        let dir = tempdir().unwrap();
        let service = service(&server, dir.path());

        assert!(service.remove_match(5).unwrap().contains("#5"));
        assert!(service.remove_match(6).is_err());
    }
}
