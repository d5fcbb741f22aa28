//! Shared query parameter types for API handlers.

use axum::extract::FromRequestParts;
use estate_core::filter::ListingFilters;
use estate_core::listing::PropertyType;
use estate_core::query::{Pagination, Sort, SortDirection, SortKey};
use estate_core::types::{DbId, Decimal};
use serde::Deserialize;

use crate::error::AppError;

/// `Query` extractor whose rejection is an [`AppError`], so a malformed query
/// string gets the same JSON error body as every other failure.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Generic pagination parameters (`?page=&limit=`).
///
/// Values are clamped by [`Pagination::new`].
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }
}

/// `GET /listings` query string. `amenities` is comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct ListingListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub property_type: Option<PropertyType>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_size: Option<Decimal>,
    pub max_size: Option<Decimal>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub amenities: Option<String>,
    #[serde(alias = "sortBy")]
    pub sort_by: Option<SortKey>,
    #[serde(alias = "sortOrder")]
    pub sort_order: Option<SortDirection>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ListingListParams {
    pub fn filters(&self) -> ListingFilters {
        ListingFilters {
            city: non_blank(&self.city),
            state: non_blank(&self.state),
            property_type: self.property_type,
            min_price: self.min_price,
            max_price: self.max_price,
            min_size: self.min_size,
            max_size: self.max_size,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            amenities: self
                .amenities
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn sort(&self) -> Sort {
        Sort::new(self.sort_by, self.sort_order)
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }
}

/// `GET /leads` query string.
#[derive(Debug, Default, Deserialize)]
pub struct LeadListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(alias = "property_id")]
    pub listing_id: Option<DbId>,
}

impl LeadListParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }
}

/// `GET /search/suggestions?q=`.
#[derive(Debug, Default, Deserialize)]
pub struct SuggestionParams {
    #[serde(default)]
    pub q: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amenities_are_split_and_trimmed() {
        let params = ListingListParams {
            amenities: Some(" Gym, Parking ,,".into()),
            city: Some("   ".into()),
            ..Default::default()
        };
        let filters = params.filters();
        assert_eq!(filters.amenities, vec!["Gym", "Parking"]);
        assert_eq!(filters.city, None);
    }

    #[test]
    fn sort_defaults_to_newest_first() {
        let sort = ListingListParams::default().sort();
        assert_eq!(sort.key, SortKey::CreatedAt);
        assert_eq!(sort.direction, SortDirection::Desc);
    }
}
