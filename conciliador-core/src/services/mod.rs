//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod logging;
mod reconciliation;
mod session;

pub use logging::{events, LogEntry, LogEvent, LoggingService};
pub use reconciliation::{is_unauthorized, ActionResult, ReconciliationService};
pub use session::{
    ActionOutcome, ReconciliationSessionController, SessionAction, MANUAL_RECONCILIATION_FAILED,
};
