//! Core domain entities
//!
//! Pure data structures and the selection workflow - no I/O here.

mod movement;
mod reconciliation;
pub mod result;
pub mod selection;
pub mod session;

pub use movement::{Direction, Movement, Origin};
pub use reconciliation::{
    AutomaticMatch, ManualReconciliationGroup, MatchCriterion, MatchRecord, MatchesOverview,
    Reconciliation, ReconciliationDetail, ReconciliationStats, UnreconciledMovements,
};
pub use result::{ApiMessage, Error, Result};
pub use selection::{MovementLookup, SelectionRegistry, Selections};
pub use session::{ManualReconciliationRequest, ReconciliationSession, SessionState};
