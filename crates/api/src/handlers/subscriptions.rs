//! Handlers for dealer subscriptions and the billing webhook.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use estate_core::services::CreateSubscription;
use estate_core::subscription::SubscriptionPlan;
use estate_core::types::DbId;
use estate_gateway::webhook::SIGNATURE_HEADER;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireDealer;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubscriptionRequest {
    pub plan: SubscriptionPlan,
    #[serde(alias = "paymentMethodId")]
    #[validate(length(min = 1, message = "A payment method is required"))]
    pub payment_method_id: String,
    /// Billing email when the token carries none.
    #[validate(email)]
    pub email: Option<String>,
}

/// POST /api/v1/subscriptions
///
/// Subscribe to a plan. Rejected while another subscription is active.
pub async fn create_subscription(
    RequireDealer(dealer): RequireDealer,
    State(state): State<AppState>,
    Json(input): Json<CreateSubscriptionRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let email = dealer
        .email
        .clone()
        .or(input.email)
        .ok_or_else(|| AppError::BadRequest("A contact email is required".into()))?;

    let subscription = state
        .subscriptions
        .create(&CreateSubscription {
            user_id: dealer.user_id,
            email,
            plan: input.plan,
            payment_method_id: input.payment_method_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: subscription })))
}

/// GET /api/v1/subscriptions/me
///
/// The dealer's most recent subscription, or `null`.
pub async fn current_subscription(
    RequireDealer(dealer): RequireDealer,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let subscription = state.subscriptions.current(dealer.user_id).await?;

    Ok(Json(DataResponse { data: subscription }))
}

/// DELETE /api/v1/subscriptions/{id}
pub async fn cancel_subscription(
    RequireDealer(dealer): RequireDealer,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let subscription = state.subscriptions.cancel(id, dealer.user_id).await?;

    Ok(Json(DataResponse { data: subscription }))
}

/// POST /api/v1/subscriptions/webhook
///
/// Billing gateway callback. The raw body is verified against the
/// `Stripe-Signature` header before anything is decoded. Events for unknown
/// subscriptions and kinds we do not handle are acknowledged.
pub async fn billing_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".into()))?;

    let event = state
        .webhooks
        .construct_event(&body, signature)
        .map_err(|e| {
            tracing::warn!(error = %e, "Rejected billing webhook");
            AppError::BadRequest(format!("Webhook Error: {e}"))
        })?;

    match event {
        Some(event) => {
            state.subscriptions.reconcile(&event).await?;
        }
        None => tracing::debug!("Ignoring billing webhook"),
    }

    Ok(Json(json!({ "received": true })))
}
