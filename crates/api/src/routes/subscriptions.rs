//! Route definitions for subscriptions, mounted at `/subscriptions`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::subscriptions;
use crate::state::AppState;

/// ```text
/// POST   /            -> create_subscription (dealer)
/// GET    /me          -> current_subscription (dealer)
/// DELETE /{id}        -> cancel_subscription (dealer)
/// POST   /webhook     -> billing_webhook (signature-verified)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(subscriptions::create_subscription))
        .route("/me", get(subscriptions::current_subscription))
        .route("/{id}", delete(subscriptions::cancel_subscription))
        .route("/webhook", post(subscriptions::billing_webhook))
}
