//! Handlers for natural-language search and query suggestions.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use estate_core::translator;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::query::{QueryParams, SuggestionParams};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 5, max = 500, message = "Query must be between 5 and 500 characters"))]
    pub query: String,
    /// Free-form hints forwarded to the NLP service. Must be a JSON object.
    pub context: Option<serde_json::Value>,
}

/// POST /api/v1/search
///
/// Translate a free-text query into filters and run it against published
/// listings. Always answers, falling back to local parsing when the NLP
/// service is unavailable.
pub async fn natural_language_search(
    State(state): State<AppState>,
    Json(input): Json<SearchRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let context = match input.context {
        None | Some(serde_json::Value::Null) => None,
        Some(ctx @ serde_json::Value::Object(_)) => Some(ctx),
        Some(_) => return Err(AppError::BadRequest("Context must be an object".into())),
    };

    let outcome = state
        .search
        .search(input.query.trim(), context.as_ref())
        .await?;

    Ok(Json(DataResponse { data: outcome }))
}

/// GET /api/v1/search/suggestions?q=
pub async fn search_suggestions(
    QueryParams(params): QueryParams<SuggestionParams>,
) -> impl IntoResponse {
    Json(DataResponse {
        data: translator::suggestions(&params.q),
    })
}
