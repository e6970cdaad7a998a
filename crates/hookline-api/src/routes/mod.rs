//! API routes.

pub mod health;
pub mod webhooks;

use crate::AppState;
use axum::Router;

/// Build the server router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/webhook", webhooks::router())
        .merge(health::router())
        .with_state(state)
}
