use axum::routing::{get, post};
use axum::Router;

use crate::handlers::search;
use crate::state::AppState;

/// Search routes mounted at `/search`.
///
/// ```text
/// POST   /               -> natural_language_search
/// GET    /suggestions    -> search_suggestions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(search::natural_language_search))
        .route("/suggestions", get(search::search_suggestions))
}
