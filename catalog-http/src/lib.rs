//! The HTTP Service of the item catalog
//!
//! CRUD over the in-memory item store plus a price endpoint driven by the
//! `new-pricing-strategy` feature flag.

pub mod client;
pub mod service;

pub use client::http_client;
pub use service::app_state::AppState;
pub use service::http_service::{self, HttpService};
