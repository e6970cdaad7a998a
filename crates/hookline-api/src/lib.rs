//! Webhook server for Hookline.
//!
//! Receives git provider deliveries at `/webhook/{namespace}/{config}` and
//! hands the canonical event to the registered plugins.

pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;
