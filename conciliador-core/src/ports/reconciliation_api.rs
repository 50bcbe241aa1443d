//! Reconciliation API port
//!
//! Defines the interface to the server that owns reconciliation state.
//! The session controller and the reconciliation service depend on this
//! trait only; the HTTP adapter and the test doubles implement it.

use crate::domain::result::Result;
use crate::domain::{ApiMessage, ManualReconciliationRequest, MatchesOverview, ReconciliationDetail};

/// Remote authority for reconciliations
///
/// Every method is a single authenticated request. Implementations map a
/// 401 to `Error::Unauthorized`, other non-2xx answers to `Error::Api`
/// carrying the server's text, and connection problems to
/// `Error::Transport`.
pub trait ReconciliationApi: Send + Sync {
    /// `GET /api/conciliaciones/{id}`
    fn get_detail(&self, reconciliation_id: i64) -> Result<ReconciliationDetail>;

    /// `POST /api/conciliaciones/{id}/conciliar-manual`
    fn confirm_manual(
        &self,
        reconciliation_id: i64,
        request: &ManualReconciliationRequest,
    ) -> Result<ApiMessage>;

    /// `POST /api/conciliaciones/{id}/procesar` - run automatic matching
    fn process(&self, reconciliation_id: i64) -> Result<ApiMessage>;

    /// `POST /api/conciliaciones/{id}/terminar_conciliacion`
    fn finish(&self, reconciliation_id: i64) -> Result<ApiMessage>;

    /// `DELETE /api/conciliaciones/{id}/eliminar`
    fn delete(&self, reconciliation_id: i64) -> Result<ApiMessage>;

    /// `GET /api/conciliaciones/{id}/matches_y_manuales`
    fn get_matches(&self, reconciliation_id: i64) -> Result<MatchesOverview>;

    /// `DELETE /api/conciliaciones/match/{match_id}/eliminar`
    fn delete_match(&self, match_id: i64) -> Result<ApiMessage>;
}
