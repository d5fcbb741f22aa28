//! Handlers for property listings.
//!
//! Reads are public (drafts only reach their dealer); writes require the
//! `dealer` role and ownership.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use estate_core::listing::{ListingPatch, ListingStatus, NewListing, PropertyType, SizeUnit};
use estate_core::types::{DbId, Decimal};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::MaybeAuthUser;
use crate::middleware::rbac::RequireDealer;
use crate::query::{ListingListParams, PaginationParams, QueryParams};
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateListingRequest {
    #[validate(length(min = 10, max = 200, message = "Title must be between 10 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 50, max = 5000, message = "Description must be between 50 and 5000 characters"))]
    pub description: String,
    pub price: Decimal,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[serde(alias = "pincode")]
    #[validate(length(equal = 6, message = "Postal code must be 6 characters"))]
    pub postal_code: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    pub size: Decimal,
    pub size_unit: SizeUnit,
    #[validate(range(min = 0))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub bathrooms: Option<i32>,
    pub property_type: PropertyType,
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl From<CreateListingRequest> for NewListing {
    fn from(r: CreateListingRequest) -> Self {
        NewListing {
            title: r.title.trim().to_string(),
            description: r.description.trim().to_string(),
            price: r.price,
            location: r.location.trim().to_string(),
            city: r.city.trim().to_string(),
            state: r.state.trim().to_string(),
            postal_code: r.postal_code.trim().to_string(),
            latitude: r.latitude,
            longitude: r.longitude,
            size: r.size,
            size_unit: r.size_unit,
            bedrooms: r.bedrooms,
            bathrooms: r.bathrooms,
            property_type: r.property_type,
            amenities: r.amenities,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateListingRequest {
    #[validate(length(min = 10, max = 200, message = "Title must be between 10 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 50, max = 5000, message = "Description must be between 50 and 5000 characters"))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: Option<String>,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: Option<String>,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: Option<String>,
    #[serde(alias = "pincode")]
    #[validate(length(equal = 6, message = "Postal code must be 6 characters"))]
    pub postal_code: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    pub size: Option<Decimal>,
    pub size_unit: Option<SizeUnit>,
    #[validate(range(min = 0))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub bathrooms: Option<i32>,
    pub property_type: Option<PropertyType>,
    pub amenities: Option<Vec<String>>,
    pub status: Option<ListingStatus>,
}

impl From<UpdateListingRequest> for ListingPatch {
    fn from(r: UpdateListingRequest) -> Self {
        let trimmed = |v: Option<String>| v.map(|v| v.trim().to_string());
        ListingPatch {
            title: trimmed(r.title),
            description: trimmed(r.description),
            price: r.price,
            location: trimmed(r.location),
            city: trimmed(r.city),
            state: trimmed(r.state),
            postal_code: trimmed(r.postal_code),
            latitude: r.latitude,
            longitude: r.longitude,
            size: r.size,
            size_unit: r.size_unit,
            bedrooms: r.bedrooms,
            bathrooms: r.bathrooms,
            property_type: r.property_type,
            amenities: r.amenities,
            status: r.status,
        }
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/listings
///
/// Filtered, sorted, paginated listings visible to the caller.
pub async fn list_listings(
    auth: MaybeAuthUser,
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListingListParams>,
) -> AppResult<impl IntoResponse> {
    let pagination = params.pagination();
    let page = state
        .listings
        .search(&params.filters(), params.sort(), pagination, &auth.requester())
        .await?;

    Ok(Json(PaginatedResponse::new(page, pagination)))
}

/// GET /api/v1/listings/mine
///
/// The dealer's own non-archived listings, drafts included.
pub async fn my_listings(
    RequireDealer(dealer): RequireDealer,
    State(state): State<AppState>,
    QueryParams(params): QueryParams<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let pagination = params.pagination();
    let page = state
        .listings
        .dealer_listings(dealer.user_id, pagination)
        .await?;

    Ok(Json(PaginatedResponse::new(page, pagination)))
}

/// GET /api/v1/listings/{id}
///
/// Single listing. Schedules a view-counter bump that the response does not
/// wait for.
pub async fn get_listing(
    auth: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let listing = state.listings.get(id, &auth.requester()).await?;

    Ok(Json(DataResponse { data: listing }))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// POST /api/v1/listings
///
/// Create a draft listing, subject to the dealer's plan quota.
pub async fn create_listing(
    RequireDealer(dealer): RequireDealer,
    State(state): State<AppState>,
    Json(input): Json<CreateListingRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let listing = state
        .listings
        .create(dealer.user_id, &NewListing::from(input))
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: listing })))
}

/// PUT /api/v1/listings/{id}
pub async fn update_listing(
    RequireDealer(dealer): RequireDealer,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateListingRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let listing = state
        .listings
        .update(id, dealer.user_id, &ListingPatch::from(input))
        .await?;

    tracing::info!(listing_id = %id, dealer_id = %dealer.user_id, "Listing updated");

    Ok(Json(DataResponse { data: listing }))
}

/// DELETE /api/v1/listings/{id}
///
/// Archive (soft delete). Repeating it is harmless.
pub async fn archive_listing(
    RequireDealer(dealer): RequireDealer,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.listings.archive(id, dealer.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
