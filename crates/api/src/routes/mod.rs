pub mod account;
pub mod health;
pub mod leads;
pub mod listings;
pub mod search;
pub mod subscriptions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /listings                                        list (public), create (dealer)
/// /listings/mine                                   dealer's own listings
/// /listings/{id}                                   get (public), update, archive (dealer)
///
/// /leads                                           submit (public), list (dealer)
/// /leads/analytics                                 dealer lead analytics
/// /leads/{id}/status                               update lead status (dealer)
///
/// /subscriptions                                   subscribe (dealer)
/// /subscriptions/me                                current subscription (dealer)
/// /subscriptions/{id}                              cancel (dealer)
/// /subscriptions/webhook                           billing webhook (signed, public)
///
/// /search                                          natural-language search (public)
/// /search/suggestions                              query suggestions (public)
///
/// /account/features                                feature flags (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/listings", listings::router())
        .nest("/leads", leads::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/search", search::router())
        .nest("/account", account::router())
}
