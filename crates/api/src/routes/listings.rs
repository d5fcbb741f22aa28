//! Route definitions for property listings, mounted at `/listings`.

use axum::routing::get;
use axum::Router;

use crate::handlers::listings;
use crate::state::AppState;

/// ```text
/// GET    /          -> list_listings
/// POST   /          -> create_listing (dealer)
/// GET    /mine      -> my_listings (dealer)
/// GET    /{id}      -> get_listing
/// PUT    /{id}      -> update_listing (dealer, owner)
/// DELETE /{id}      -> archive_listing (dealer, owner)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(listings::list_listings).post(listings::create_listing),
        )
        .route("/mine", get(listings::my_listings))
        .route(
            "/{id}",
            get(listings::get_listing)
                .put(listings::update_listing)
                .delete(listings::archive_listing),
        )
}
