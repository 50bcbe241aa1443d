//! HTTP implementation of the reconciliation API port

use serde_json::json;

use crate::adapters::auth::AuthenticatedClient;
use crate::domain::result::Result;
use crate::domain::{ApiMessage, ManualReconciliationRequest, MatchesOverview, ReconciliationDetail};
use crate::ports::ReconciliationApi;

/// Reconciliation API over the authenticated HTTP client
#[derive(Debug)]
pub struct HttpReconciliationApi {
    client: AuthenticatedClient,
}

impl HttpReconciliationApi {
    pub fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    fn reconciliation_path(reconciliation_id: i64, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("/api/conciliaciones/{}", reconciliation_id)
        } else {
            format!("/api/conciliaciones/{}/{}", reconciliation_id, suffix)
        }
    }
}

impl ReconciliationApi for HttpReconciliationApi {
    fn get_detail(&self, reconciliation_id: i64) -> Result<ReconciliationDetail> {
        self.client
            .get(&Self::reconciliation_path(reconciliation_id, ""))
    }

    fn confirm_manual(
        &self,
        reconciliation_id: i64,
        request: &ManualReconciliationRequest,
    ) -> Result<ApiMessage> {
        self.client.post(
            &Self::reconciliation_path(reconciliation_id, "conciliar-manual"),
            request,
        )
    }

    fn process(&self, reconciliation_id: i64) -> Result<ApiMessage> {
        self.client
            .post(&Self::reconciliation_path(reconciliation_id, "procesar"), &json!({}))
    }

    fn finish(&self, reconciliation_id: i64) -> Result<ApiMessage> {
        self.client.post(
            &Self::reconciliation_path(reconciliation_id, "terminar_conciliacion"),
            &json!({}),
        )
    }

    fn delete(&self, reconciliation_id: i64) -> Result<ApiMessage> {
        self.client
            .delete(&Self::reconciliation_path(reconciliation_id, "eliminar"))
    }

    fn get_matches(&self, reconciliation_id: i64) -> Result<MatchesOverview> {
        self.client
            .get(&Self::reconciliation_path(reconciliation_id, "matches_y_manuales"))
    }

    fn delete_match(&self, match_id: i64) -> Result<ApiMessage> {
        self.client
            .delete(&format!("/api/conciliaciones/match/{}/eliminar", match_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::TokenStore;
    use crate::adapters::mock_api::{MockConfig, MockReconciliationServer};
    use crate::domain::{Error, Origin};
    use tempfile::tempdir;

    fn api_for(server: &MockReconciliationServer, dir: &std::path::Path) -> HttpReconciliationApi {
        let store = TokenStore::new(dir);
        store.set("valid_token", 30).unwrap();
        let client = AuthenticatedClient::new(&server.base_url(), 5, store).unwrap();
        HttpReconciliationApi::new(client)
    }

    #[test]
    fn test_get_detail() {
        let server = MockReconciliationServer::start(MockConfig::default()).unwrap();
        let dir = tempdir().unwrap();
        let api = api_for(&server, dir.path());

        let detail = api.get_detail(42).unwrap();
        assert_eq!(detail.conciliacion.id, 42);
        assert_eq!(detail.movimientos_no_conciliados.for_origin(Origin::Banco).len(), 3);
    }

    #[test]
    fn test_missing_reconciliation_maps_detail() {
        let server = MockReconciliationServer::start(MockConfig::default()).unwrap();
        let dir = tempdir().unwrap();
        let api = api_for(&server, dir.path());

        let err = api.get_detail(7).unwrap_err();
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("no encontrada"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unauthorized_clears_token() {
        let server = MockReconciliationServer::start(MockConfig {
            fail_auth: true,
            ..Default::default()
        })
        .unwrap();
        let dir = tempdir().unwrap();
        let api = api_for(&server, dir.path());

        let err = api.process(42).unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        assert!(TokenStore::new(dir.path()).get().unwrap().is_none());
    }

    #[test]
    fn test_request_without_token_is_rejected() {
        let server = MockReconciliationServer::start(MockConfig::default()).unwrap();
        let dir = tempdir().unwrap();
        let client =
            AuthenticatedClient::new(&server.base_url(), 5, TokenStore::new(dir.path())).unwrap();
        let api = HttpReconciliationApi::new(client);

        assert!(matches!(api.get_detail(42), Err(Error::Unauthorized)));
    }

    #[test]
    fn test_token_override() {
        let server = MockReconciliationServer::start(MockConfig::default()).unwrap();
        let dir = tempdir().unwrap();
        let client = AuthenticatedClient::new(&server.base_url(), 5, TokenStore::new(dir.path()))
            .unwrap()
            .with_token("valid_from_env");
        let api = HttpReconciliationApi::new(client);

        assert!(api.get_detail(42).is_ok());
    }

    #[test]
    fn test_process_finish_delete_and_matches() {
        let server = MockReconciliationServer::start(MockConfig::default()).unwrap();
        let dir = tempdir().unwrap();
        let api = api_for(&server, dir.path());

        assert!(api.process(42).unwrap().is_success());
        assert!(api.finish(42).unwrap().is_success());

        let matches = api.get_matches(42).unwrap();
        assert_eq!(matches.matches.len(), 1);
        assert_eq!(matches.conciliaciones_manuales.len(), 1);

        assert!(api.delete_match(5).unwrap().is_success());
        assert!(matches!(api.delete_match(999), Err(Error::Api { status: 404, .. })));
        assert!(api.delete(42).unwrap().is_success());

        let paths: Vec<String> = server.requests().into_iter().map(|r| r.path).collect();
        assert!(paths.contains(&"/api/conciliaciones/42/procesar".to_string()));
        assert!(paths.contains(&"/api/conciliaciones/42/terminar_conciliacion".to_string()));
        assert!(paths.contains(&"/api/conciliaciones/match/5/eliminar".to_string()));
        assert!(paths.contains(&"/api/conciliaciones/42/eliminar".to_string()));
    }

    #[test]
    fn test_connection_refused_is_transport_error() {
        let dir = tempdir().unwrap();
        // Port 9 (discard) is not listening on loopback in test environments
        let client =
            AuthenticatedClient::new("http://127.0.0.1:9", 2, TokenStore::new(dir.path())).unwrap();
        let api = HttpReconciliationApi::new(client);

        assert!(matches!(api.get_detail(42), Err(Error::Transport(_))));
    }
}
