//! Session controller - drives a [`ReconciliationSession`] against the API
//!
//! The controller owns the session state, the API port and the view port.
//! Front ends forward user gestures (toggles, "select all", confirm buttons)
//! and the controller turns every outcome into view notifications. Errors
//! from `handle` never escape: validation failures become alerts, submit
//! failures become alerts plus a re-enabled submit control, and a 401
//! becomes `session_expired`.

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Direction, ManualReconciliationRequest, Origin, ReconciliationDetail, ReconciliationSession,
    SessionState,
};
use crate::ports::{ReconciliationApi, SessionView};

/// Shown when the server rejects a submission without saying why
pub const MANUAL_RECONCILIATION_FAILED: &str = "Error while performing the manual reconciliation.";

/// Confirm gestures a front end can forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    ConfirmBank,
    ConfirmLedger,
    ConfirmReconciliation,
}

/// What happened in response to a [`SessionAction`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    BankConfirmed(Direction),
    LedgerConfirmed(ManualReconciliationRequest),
    /// The server accepted the pairing; the view was asked to reload
    Submitted {
        request: ManualReconciliationRequest,
        message: String,
    },
    /// A local rule refused the action; the message was alerted
    Rejected(String),
    /// The submission failed; the message was alerted and a retry is possible
    SubmitFailed(String),
    /// The API answered 401; the view was told the session expired
    SessionExpired,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ActionOutcome::BankConfirmed(_)
                | ActionOutcome::LedgerConfirmed(_)
                | ActionOutcome::Submitted { .. }
        )
    }
}

pub struct ReconciliationSessionController {
    api: Arc<dyn ReconciliationApi>,
    view: Arc<dyn SessionView>,
    session: ReconciliationSession,
    detail: Option<ReconciliationDetail>,
}

impl ReconciliationSessionController {
    pub fn new(
        reconciliation_id: i64,
        api: Arc<dyn ReconciliationApi>,
        view: Arc<dyn SessionView>,
    ) -> Self {
        Self {
            api,
            view,
            session: ReconciliationSession::new(reconciliation_id),
            detail: None,
        }
    }

    pub fn reconciliation_id(&self) -> i64 {
        self.session.reconciliation_id()
    }

    pub fn session(&self) -> &ReconciliationSession {
        &self.session
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    /// Last detail fetched by [`load`](Self::load)
    pub fn detail(&self) -> Option<&ReconciliationDetail> {
        self.detail.as_ref()
    }

    /// Fetch the detail, reset selections and state, and render it.
    ///
    /// This is also how a front end honours `SessionView::reload`.
    pub fn load(&mut self) -> Result<&ReconciliationDetail> {
        let detail = match self.api.get_detail(self.session.reconciliation_id()) {
            Ok(detail) => detail,
            Err(Error::Unauthorized) => {
                self.view.session_expired();
                return Err(Error::Unauthorized);
            }
            Err(e) => return Err(e),
        };

        self.session.reset(&detail);
        self.view.render(&detail);
        self.view.set_submit_enabled(true);
        let detail = self.detail.insert(detail);
        Ok(&*detail)
    }

    /// Check or uncheck one movement
    pub fn toggle(&mut self, origin: Origin, id: i64, checked: bool) {
        self.session.registry_mut().toggle(origin, id, checked);
    }

    /// Toggle with the origin given as text; unknown tags are alerted
    pub fn toggle_tagged(&mut self, tag: &str, id: i64, checked: bool) -> Result<()> {
        self.session
            .registry_mut()
            .toggle_tagged(tag, id, checked)
            .map_err(|e| {
                self.view.alert(&e.user_message());
                e
            })
    }

    pub fn select_all(&mut self, origin: Origin, checked: bool) {
        self.session.registry_mut().select_all(origin, checked);
    }

    pub fn handle(&mut self, action: SessionAction) -> ActionOutcome {
        match action {
            SessionAction::ConfirmBank => match self.session.confirm_bank_selection() {
                Ok(direction) => {
                    self.view.show_tab(Origin::Auxiliar);
                    ActionOutcome::BankConfirmed(direction)
                }
                Err(e) => self.reject(e),
            },
            SessionAction::ConfirmLedger => match self.session.confirm_ledger_selection() {
                Ok(request) => ActionOutcome::LedgerConfirmed(request),
                Err(e) => self.reject(e),
            },
            SessionAction::ConfirmReconciliation => self.submit(),
        }
    }

    fn reject(&self, error: Error) -> ActionOutcome {
        let message = error.user_message();
        self.view.alert(&message);
        ActionOutcome::Rejected(message)
    }

    fn submit(&mut self) -> ActionOutcome {
        let request = match self.session.begin_submit() {
            Ok(request) => request,
            Err(e) => return self.reject(e),
        };

        self.view.set_submit_enabled(false);
        let result = self
            .api
            .confirm_manual(self.session.reconciliation_id(), &request);

        match result {
            Ok(body) if body.is_success() => {
                // Submitting -> Submitted cannot fail here
                let _ = self.session.finish_submit(true);
                self.view.reload();
                ActionOutcome::Submitted {
                    request,
                    message: body.message.unwrap_or_default(),
                }
            }
            Ok(body) => {
                let message = body
                    .failure_text()
                    .unwrap_or(MANUAL_RECONCILIATION_FAILED)
                    .to_string();
                self.submit_failed(message)
            }
            Err(Error::Unauthorized) => {
                let _ = self.session.finish_submit(false);
                self.view.set_submit_enabled(true);
                self.view.session_expired();
                ActionOutcome::SessionExpired
            }
            Err(Error::Api { message, .. }) => self.submit_failed(message),
            Err(e) => self.submit_failed(format!("Error: {}", e.user_message())),
        }
    }

    fn submit_failed(&mut self, message: String) -> ActionOutcome {
        let _ = self.session.finish_submit(false);
        self.view.alert(&message);
        self.view.set_submit_enabled(true);
        ActionOutcome::SubmitFailed(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::{AuthenticatedClient, TokenStore};
    use crate::adapters::http_api::HttpReconciliationApi;
    use crate::adapters::mock_api::{MockConfig, MockReconciliationServer};
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    #[derive(Debug, Clone, PartialEq)]
    enum ViewEvent {
        Render(i64),
        Alert(String),
        ShowTab(Origin),
        SubmitEnabled(bool),
        Reload,
        SessionExpired,
    }

    #[derive(Default)]
    struct RecordingView {
        events: Mutex<Vec<ViewEvent>>,
    }

    impl RecordingView {
        fn push(&self, event: ViewEvent) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<ViewEvent> {
            self.events.lock().unwrap().clone()
        }

        fn alerts(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    ViewEvent::Alert(msg) => Some(msg),
                    _ => None,
                })
                .collect()
        }

        fn count(&self, wanted: &ViewEvent) -> usize {
            self.events().iter().filter(|e| *e == wanted).count()
        }
    }

    impl SessionView for RecordingView {
        fn render(&self, detail: &ReconciliationDetail) {
            self.push(ViewEvent::Render(detail.conciliacion.id));
        }
        fn alert(&self, message: &str) {
            self.push(ViewEvent::Alert(message.to_string()));
        }
        fn show_tab(&self, origin: Origin) {
            self.push(ViewEvent::ShowTab(origin));
        }
        fn set_submit_enabled(&self, enabled: bool) {
            self.push(ViewEvent::SubmitEnabled(enabled));
        }
        fn reload(&self) {
            self.push(ViewEvent::Reload);
        }
        fn session_expired(&self) {
            self.push(ViewEvent::SessionExpired);
        }
    }

    struct Fixture {
        server: MockReconciliationServer,
        view: Arc<RecordingView>,
        controller: ReconciliationSessionController,
        dir: TempDir,
    }

    fn fixture(config: MockConfig) -> Fixture {
        let server = MockReconciliationServer::start(config).unwrap();
        let dir = tempdir().unwrap();
        let store = TokenStore::new(dir.path());
        store.set("valid_session", 30).unwrap();
        let client = AuthenticatedClient::new(&server.base_url(), 5, store).unwrap();
        let api: Arc<dyn ReconciliationApi> = Arc::new(HttpReconciliationApi::new(client));
        let view = Arc::new(RecordingView::default());
        let mut controller = ReconciliationSessionController::new(42, api, view.clone());
        controller.load().unwrap();
        Fixture {
            server,
            view,
            controller,
            dir,
        }
    }

    fn select_and_confirm(controller: &mut ReconciliationSessionController) {
        controller.toggle(Origin::Banco, 1, true);
        controller.toggle(Origin::Banco, 2, true);
        assert_eq!(
            controller.handle(SessionAction::ConfirmBank),
            ActionOutcome::BankConfirmed(Direction::Entrada)
        );
        controller.toggle(Origin::Auxiliar, 10, true);
        assert!(matches!(
            controller.handle(SessionAction::ConfirmLedger),
            ActionOutcome::LedgerConfirmed(_)
        ));
    }

    #[test]
    fn test_load_renders_and_resets() {
        let fx = fixture(MockConfig::default());
        assert_eq!(fx.controller.state(), &SessionState::Idle);
        assert_eq!(fx.controller.session().registry().rendered(Origin::Banco), &[1, 2, 3]);
        assert_eq!(fx.view.count(&ViewEvent::Render(42)), 1);
    }

    #[test]
    fn test_successful_submission_posts_selection_and_reloads_once() {
        let mut fx = fixture(MockConfig {
            manual_response: Some((200, r#"{"message":"ok"}"#.to_string())),
            ..Default::default()
        });
        select_and_confirm(&mut fx.controller);

        let outcome = fx.controller.handle(SessionAction::ConfirmReconciliation);
        assert!(matches!(outcome, ActionOutcome::Submitted { ref message, .. } if message == "ok"));
        assert_eq!(fx.controller.state(), &SessionState::Submitted);

        let posts = fx
            .server
            .requests_to("POST", "/api/conciliaciones/42/conciliar-manual");
        assert_eq!(posts.len(), 1);
        assert_eq!(
            posts[0].json_body().unwrap(),
            serde_json::json!({"id_banco": [1, 2], "id_auxiliar": [10]})
        );

        assert_eq!(fx.view.count(&ViewEvent::Reload), 1);
        assert!(fx.view.alerts().is_empty());
    }

    #[test]
    fn test_rejected_submission_alerts_detail_without_reload() {
        let mut fx = fixture(MockConfig {
            manual_response: Some((400, r#"{"detail":"ids ya conciliados"}"#.to_string())),
            ..Default::default()
        });
        select_and_confirm(&mut fx.controller);

        let outcome = fx.controller.handle(SessionAction::ConfirmReconciliation);
        assert!(matches!(outcome, ActionOutcome::SubmitFailed(_)));

        let alerts = fx.view.alerts();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("ids ya conciliados"));
        assert_eq!(fx.view.count(&ViewEvent::Reload), 0);

        // Control disabled during the request, re-enabled after
        let events = fx.view.events();
        let toggles: Vec<&ViewEvent> = events
            .iter()
            .filter(|e| matches!(e, ViewEvent::SubmitEnabled(_)))
            .collect();
        assert_eq!(
            toggles,
            vec![
                &ViewEvent::SubmitEnabled(true),
                &ViewEvent::SubmitEnabled(false),
                &ViewEvent::SubmitEnabled(true)
            ]
        );

        // Retry needs no re-selection
        assert!(matches!(
            fx.controller.state(),
            SessionState::ReadyToSubmit { .. }
        ));
        fx.controller.handle(SessionAction::ConfirmReconciliation);
        assert_eq!(
            fx.server
                .requests_to("POST", "/api/conciliaciones/42/conciliar-manual")
                .len(),
            2
        );
    }

    #[test]
    fn test_body_without_message_uses_error_text() {
        let mut fx = fixture(MockConfig {
            manual_response: Some((200, r#"{"error":"sin coincidencia"}"#.to_string())),
            ..Default::default()
        });
        select_and_confirm(&mut fx.controller);

        let outcome = fx.controller.handle(SessionAction::ConfirmReconciliation);
        assert_eq!(outcome, ActionOutcome::SubmitFailed("sin coincidencia".to_string()));
        assert_eq!(fx.view.count(&ViewEvent::Reload), 0);
    }

    #[test]
    fn test_empty_failure_body_uses_generic_message() {
        let mut fx = fixture(MockConfig {
            manual_response: Some((200, "{}".to_string())),
            ..Default::default()
        });
        select_and_confirm(&mut fx.controller);

        let outcome = fx.controller.handle(SessionAction::ConfirmReconciliation);
        assert_eq!(
            outcome,
            ActionOutcome::SubmitFailed(MANUAL_RECONCILIATION_FAILED.to_string())
        );
    }

    #[test]
    fn test_mixed_bank_directions_alert_and_stay_idle() {
        let mut fx = fixture(MockConfig::default());
        fx.controller.select_all(Origin::Banco, true);

        let outcome = fx.controller.handle(SessionAction::ConfirmBank);
        assert!(matches!(outcome, ActionOutcome::Rejected(_)));
        assert_eq!(fx.controller.state(), &SessionState::Idle);
        assert_eq!(fx.view.alerts().len(), 1);
        assert_eq!(fx.view.count(&ViewEvent::ShowTab(Origin::Auxiliar)), 0);
    }

    #[test]
    fn test_bank_confirm_switches_to_ledger_tab() {
        let mut fx = fixture(MockConfig::default());
        fx.controller.toggle(Origin::Banco, 3, true);

        assert_eq!(
            fx.controller.handle(SessionAction::ConfirmBank),
            ActionOutcome::BankConfirmed(Direction::Salida)
        );
        assert_eq!(fx.view.count(&ViewEvent::ShowTab(Origin::Auxiliar)), 1);
    }

    #[test]
    fn test_submit_without_confirmation_never_reaches_network() {
        let mut fx = fixture(MockConfig::default());
        fx.controller.toggle(Origin::Banco, 1, true);

        let outcome = fx.controller.handle(SessionAction::ConfirmReconciliation);
        assert!(matches!(outcome, ActionOutcome::Rejected(_)));
        assert!(fx
            .server
            .requests_to("POST", "/api/conciliaciones/42/conciliar-manual")
            .is_empty());
    }

    #[test]
    fn test_unknown_tag_is_alerted() {
        let mut fx = fixture(MockConfig::default());
        assert!(fx.controller.toggle_tagged("caja", 1, true).is_err());
        assert_eq!(fx.view.alerts().len(), 1);
        assert!(fx.controller.session().registry().selections().banco.is_empty());
    }

    #[test]
    fn test_confirm_after_submission_requires_reload() {
        let mut fx = fixture(MockConfig::default());
        select_and_confirm(&mut fx.controller);
        fx.controller.handle(SessionAction::ConfirmReconciliation);

        let outcome = fx.controller.handle(SessionAction::ConfirmBank);
        assert!(matches!(outcome, ActionOutcome::Rejected(_)));

        fx.controller.load().unwrap();
        assert_eq!(fx.controller.state(), &SessionState::Idle);
    }

    #[test]
    fn test_load_unauthorized_notifies_view() {
        let server = MockReconciliationServer::start(MockConfig::default()).unwrap();
        let dir = tempdir().unwrap();
        let client =
            AuthenticatedClient::new(&server.base_url(), 5, TokenStore::new(dir.path())).unwrap();
        let view = Arc::new(RecordingView::default());
        let mut controller =
            ReconciliationSessionController::new(42, Arc::new(HttpReconciliationApi::new(client)), view.clone());

        assert!(matches!(controller.load(), Err(Error::Unauthorized)));
        assert_eq!(view.count(&ViewEvent::SessionExpired), 1);
    }

    #[test]
    fn test_expired_token_during_submit() {
        let mut fx = fixture(MockConfig::default());
        select_and_confirm(&mut fx.controller);

        // Token removed behind the controller's back, as after a server-side logout
        TokenStore::new(fx.dir.path()).remove().unwrap();

        let outcome = fx.controller.handle(SessionAction::ConfirmReconciliation);
        assert_eq!(outcome, ActionOutcome::SessionExpired);
        assert_eq!(fx.view.count(&ViewEvent::SessionExpired), 1);
        assert_eq!(fx.view.count(&ViewEvent::Reload), 0);
    }
}
