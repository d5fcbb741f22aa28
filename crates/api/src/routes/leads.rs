//! Route definitions for leads, mounted at `/leads`.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::leads;
use crate::state::AppState;

/// ```text
/// POST   /                -> create_lead
/// GET    /                -> list_leads (dealer)
/// GET    /analytics       -> lead_analytics (dealer)
/// PUT    /{id}/status     -> update_lead_status (dealer)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(leads::list_leads).post(leads::create_lead))
        .route("/analytics", get(leads::lead_analytics))
        .route("/{id}/status", put(leads::update_lead_status))
}
