//! Handlers for buyer inquiries (leads).
//!
//! Submitting a lead is public; everything else is dealer-scoped.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use estate_core::lead::NewLead;
use estate_core::types::DbId;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::rbac::RequireDealer;
use crate::query::{LeadListParams, QueryParams};
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLeadRequest {
    #[serde(alias = "property_id")]
    pub listing_id: DbId,
    #[serde(alias = "user_name")]
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[serde(alias = "user_email")]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(alias = "user_phone")]
    #[validate(length(min = 7, max = 20, message = "A valid phone number is required"))]
    pub phone: String,
    #[validate(length(max = 1000))]
    pub message: Option<String>,
}

impl From<CreateLeadRequest> for NewLead {
    fn from(r: CreateLeadRequest) -> Self {
        NewLead {
            listing_id: r.listing_id,
            name: r.name.trim().to_string(),
            email: r.email.trim().to_lowercase(),
            phone: r.phone.trim().to_string(),
            message: r
                .message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLeadStatusRequest {
    #[validate(length(min = 1, max = 50))]
    pub status: String,
}

/// POST /api/v1/leads
///
/// Submit an inquiry against a listing. The listing's dealer receives it.
pub async fn create_lead(
    State(state): State<AppState>,
    Json(input): Json<CreateLeadRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let lead = state.leads.create(&NewLead::from(input)).await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: lead })))
}

/// GET /api/v1/leads
///
/// The dealer's leads, newest first, optionally for one listing.
pub async fn list_leads(
    RequireDealer(dealer): RequireDealer,
    State(state): State<AppState>,
    QueryParams(params): QueryParams<LeadListParams>,
) -> AppResult<impl IntoResponse> {
    let pagination = params.pagination();
    let page = state
        .leads
        .list(dealer.user_id, params.listing_id, pagination)
        .await?;

    Ok(Json(PaginatedResponse::new(page, pagination)))
}

/// PUT /api/v1/leads/{id}/status
pub async fn update_lead_status(
    RequireDealer(dealer): RequireDealer,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateLeadStatusRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let lead = state
        .leads
        .update_status(id, dealer.user_id, &input.status)
        .await?;

    Ok(Json(DataResponse { data: lead }))
}

/// GET /api/v1/leads/analytics
pub async fn lead_analytics(
    RequireDealer(dealer): RequireDealer,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let analytics = state.leads.analytics(dealer.user_id).await?;

    Ok(Json(DataResponse { data: analytics }))
}
