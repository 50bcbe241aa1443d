//! Manual reconciliation session - the two-phase selection state machine
//!
//! ```text
//! Idle --confirm bank--> BankChosen --confirm ledger--> ReadyToSubmit
//!                                                           |
//!                       ReadyToSubmit <--failure-- Submitting --success--> Submitted
//! ```
//!
//! This type holds no I/O. The controller in `services::session` performs
//! the request between [`ReconciliationSession::begin_submit`] and
//! [`ReconciliationSession::finish_submit`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::movement::{Direction, Origin};
use super::reconciliation::ReconciliationDetail;
use super::result::{Error, Result};
use super::selection::{MovementLookup, SelectionRegistry};

/// Body of `POST /api/conciliaciones/{id}/conciliar-manual`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualReconciliationRequest {
    pub id_banco: Vec<i64>,
    pub id_auxiliar: Vec<i64>,
}

/// Where the session stands in the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    BankChosen {
        direction: Direction,
        bank_ids: Vec<i64>,
    },
    ReadyToSubmit {
        direction: Direction,
        bank_ids: Vec<i64>,
        ledger_ids: Vec<i64>,
    },
    /// A request is in flight; nothing else may be confirmed
    Submitting {
        direction: Direction,
        bank_ids: Vec<i64>,
        ledger_ids: Vec<i64>,
    },
    /// The server accepted the pairing; only a reload leaves this state
    Submitted,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::BankChosen { .. } => "bank_chosen",
            SessionState::ReadyToSubmit { .. } => "ready_to_submit",
            SessionState::Submitting { .. } => "submitting",
            SessionState::Submitted => "submitted",
        }
    }

    /// Direction recorded by the bank confirmation, if any
    pub fn direction(&self) -> Option<Direction> {
        match self {
            SessionState::BankChosen { direction, .. }
            | SessionState::ReadyToSubmit { direction, .. }
            | SessionState::Submitting { direction, .. } => Some(*direction),
            SessionState::Idle | SessionState::Submitted => None,
        }
    }
}

/// Selection registry plus workflow state for one loaded reconciliation
#[derive(Debug, Clone)]
pub struct ReconciliationSession {
    reconciliation_id: i64,
    registry: SelectionRegistry,
    state: SessionState,
}

impl ReconciliationSession {
    pub fn new(reconciliation_id: i64) -> Self {
        Self {
            reconciliation_id,
            registry: SelectionRegistry::new(),
            state: SessionState::Idle,
        }
    }

    /// Session initialized from a freshly fetched detail
    pub fn from_detail(detail: &ReconciliationDetail) -> Self {
        let mut session = Self::new(detail.conciliacion.id);
        session.reset(detail);
        session
    }

    /// Discard all client state and start over from `detail`
    pub fn reset(&mut self, detail: &ReconciliationDetail) {
        let pending = &detail.movimientos_no_conciliados;
        self.registry.init(
            MovementLookup::new(pending.banco.iter().cloned()),
            MovementLookup::new(pending.auxiliar.iter().cloned()),
        );
        self.state = SessionState::Idle;
    }

    pub fn reconciliation_id(&self) -> i64 {
        self.reconciliation_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn registry(&self) -> &SelectionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SelectionRegistry {
        &mut self.registry
    }

    fn ensure_not_busy(&self) -> Result<()> {
        match self.state {
            SessionState::Submitting { .. } => Err(Error::SubmissionInFlight),
            SessionState::Submitted => Err(Error::invalid_transition(
                "the reconciliation was already submitted; reload before selecting again",
            )),
            _ => Ok(()),
        }
    }

    /// Resolve the directions of `ids` against the lookup for `origin`
    fn directions(&self, origin: Origin, ids: &[i64]) -> Result<HashSet<Direction>> {
        let lookup = self.registry.lookup(origin);
        let mut directions = HashSet::new();
        for id in ids {
            let movement = lookup.get(*id).ok_or_else(|| {
                Error::validation(format!(
                    "Movement {} is not in the unreconciled {} list.",
                    id,
                    origin.label()
                ))
            })?;
            directions.insert(movement.es);
        }
        Ok(directions)
    }

    /// Idle/BankChosen/ReadyToSubmit -> BankChosen.
    ///
    /// Fails without changing state when nothing is selected or the
    /// selected bank movements mix directions.
    pub fn confirm_bank_selection(&mut self) -> Result<Direction> {
        self.ensure_not_busy()?;

        let bank_ids = self.registry.selections().banco;
        if bank_ids.is_empty() {
            return Err(Error::validation("Select at least one bank movement."));
        }

        let directions = self.directions(Origin::Banco, &bank_ids)?;
        let direction = match directions.len() {
            1 => directions.into_iter().next(),
            _ => None,
        }
        .ok_or_else(|| {
            Error::validation("Select only movements of the same type (E or S).")
        })?;

        self.state = SessionState::BankChosen {
            direction,
            bank_ids,
        };
        Ok(direction)
    }

    /// BankChosen/ReadyToSubmit -> ReadyToSubmit.
    ///
    /// Every selected ledger movement must carry the bank-side direction.
    pub fn confirm_ledger_selection(&mut self) -> Result<ManualReconciliationRequest> {
        self.ensure_not_busy()?;

        let (direction, bank_ids) = match &self.state {
            SessionState::BankChosen { direction, bank_ids }
            | SessionState::ReadyToSubmit {
                direction, bank_ids, ..
            } => (*direction, bank_ids.clone()),
            _ => {
                return Err(Error::validation(
                    "Confirm the bank movements before choosing ledger movements.",
                ))
            }
        };

        let ledger_ids = self.registry.selections().auxiliar;
        if ledger_ids.is_empty() {
            return Err(Error::validation("Select at least one ledger movement."));
        }

        let directions = self.directions(Origin::Auxiliar, &ledger_ids)?;
        if directions.iter().any(|d| *d != direction) {
            return Err(Error::validation(format!(
                "Ledger movements must have the same type as the bank movements ({}).",
                direction
            )));
        }

        let request = ManualReconciliationRequest {
            id_banco: bank_ids.clone(),
            id_auxiliar: ledger_ids.clone(),
        };
        self.state = SessionState::ReadyToSubmit {
            direction,
            bank_ids,
            ledger_ids,
        };
        Ok(request)
    }

    /// ReadyToSubmit -> Submitting. Returns the payload to send.
    pub fn begin_submit(&mut self) -> Result<ManualReconciliationRequest> {
        self.ensure_not_busy()?;

        let (direction, bank_ids, ledger_ids) = match &self.state {
            SessionState::ReadyToSubmit {
                direction,
                bank_ids,
                ledger_ids,
            } => (*direction, bank_ids.clone(), ledger_ids.clone()),
            _ => {
                return Err(Error::validation(
                    "Select at least one bank movement and one ledger movement.",
                ))
            }
        };

        // Both sides were checked non-empty on confirmation
        let request = ManualReconciliationRequest {
            id_banco: bank_ids.clone(),
            id_auxiliar: ledger_ids.clone(),
        };
        self.state = SessionState::Submitting {
            direction,
            bank_ids,
            ledger_ids,
        };
        Ok(request)
    }

    /// Submitting -> Submitted on success, back to ReadyToSubmit on failure
    pub fn finish_submit(&mut self, accepted: bool) -> Result<()> {
        let state = std::mem::replace(&mut self.state, SessionState::Idle);
        match state {
            SessionState::Submitting {
                direction,
                bank_ids,
                ledger_ids,
            } => {
                self.state = if accepted {
                    SessionState::Submitted
                } else {
                    SessionState::ReadyToSubmit {
                        direction,
                        bank_ids,
                        ledger_ids,
                    }
                };
                Ok(())
            }
            other => {
                let name = other.name();
                self.state = other;
                Err(Error::invalid_transition(format!(
                    "no submission in flight (state: {})",
                    name
                )))
            }
        }
    }
}
