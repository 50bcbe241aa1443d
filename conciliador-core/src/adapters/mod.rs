//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Blocking reqwest client for the ReconciliationApi port
//! - File-backed bearer token store

pub mod auth;
pub mod http_api;

#[cfg(test)]
pub mod mock_api;
