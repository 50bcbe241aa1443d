//! Session view port
//!
//! What the session controller needs from whatever front end shows the
//! reconciliation (the CLI today). Calls are notifications; the view never
//! feeds decisions back into the state machine.

use crate::domain::{Origin, ReconciliationDetail};

pub trait SessionView: Send + Sync {
    /// Show the freshly loaded detail
    fn render(&self, detail: &ReconciliationDetail);

    /// Blocking user-facing message (validation or submit failure)
    fn alert(&self, message: &str);

    /// Bring the given movement list to the front
    fn show_tab(&self, origin: Origin);

    /// Enable or disable the "confirm reconciliation" control
    fn set_submit_enabled(&self, enabled: bool);

    /// The server accepted a change; all client state must be rebuilt
    fn reload(&self);

    /// The API answered 401; the stored token is already gone
    fn session_expired(&self);
}
