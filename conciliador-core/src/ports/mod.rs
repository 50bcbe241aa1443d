//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod reconciliation_api;
mod session_view;

pub use reconciliation_api::ReconciliationApi;
pub use session_view::SessionView;
