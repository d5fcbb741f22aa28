//! Handlers for the caller's own account.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/account/features
///
/// Dashboard capabilities for the caller. Non-dealers and dealers without an
/// active plan get the all-false set.
pub async fn feature_flags(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let flags = state.quota.feature_flags(&auth.requester()).await?;

    Ok(Json(DataResponse { data: flags }))
}
