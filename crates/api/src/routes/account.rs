use axum::routing::get;
use axum::Router;

use crate::handlers::account;
use crate::state::AppState;

/// Account routes mounted at `/account`.
pub fn router() -> Router<AppState> {
    Router::new().route("/features", get(account::feature_flags))
}
