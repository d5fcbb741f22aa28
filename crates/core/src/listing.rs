//! Listing entity, lifecycle status, and write DTOs.

use serde::{Deserialize, Serialize};

use crate::roles::Requester;
use crate::types::{DbId, Decimal, Timestamp};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Listing lifecycle.
///
/// `Draft -> Published` is dealer-controlled; `Draft | Published -> Archived`
/// is the soft delete and cannot be undone through the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Draft,
    Published,
    Archived,
}

impl ListingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    /// Whether a listing in this status may move to `next`.
    pub fn can_transition_to(self, next: ListingStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Published)
                | (Self::Draft, Self::Archived)
                | (Self::Published, Self::Archived)
        )
    }

    /// Archived listings do not count toward a dealer's quota.
    pub fn counts_toward_quota(self) -> bool {
        self != Self::Archived
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    House,
    Villa,
    Plot,
    Commercial,
}

impl PropertyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::House => "house",
            Self::Villa => "villa",
            Self::Plot => "plot",
            Self::Commercial => "commercial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeUnit {
    Sqft,
    Sqm,
    Acres,
}

impl SizeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqft => "sqft",
            Self::Sqm => "sqm",
            Self::Acres => "acres",
        }
    }
}

/// Error returned when a stored enum value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// `FromStr` + `Display` for enums that expose `as_str`.
macro_rules! impl_text_enum {
    ($ty:ty, $kind:literal, [$($variant:ident),+ $(,)?]) => {
        impl ::std::str::FromStr for $ty {
            type Err = $crate::listing::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s == <$ty>::$variant.as_str() {
                        return Ok(<$ty>::$variant);
                    }
                )+
                Err($crate::listing::UnknownVariant {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }

        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}
pub(crate) use impl_text_enum;

impl_text_enum!(ListingStatus, "listing status", [Draft, Published, Archived]);
impl_text_enum!(PropertyType, "property type", [Apartment, House, Villa, Plot, Commercial]);
impl_text_enum!(SizeUnit, "size unit", [Sqft, Sqm, Acres]);

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A property record owned by a dealer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: DbId,
    pub dealer_id: DbId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    /// Free-text address line.
    pub location: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub size: Decimal,
    pub size_unit: SizeUnit,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub property_type: PropertyType,
    pub amenities: Vec<String>,
    pub status: ListingStatus,
    pub views_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Listing {
    pub fn is_owned_by(&self, user_id: Option<DbId>) -> bool {
        user_id == Some(self.dealer_id)
    }

    /// Single-listing read rule: published listings are public, drafts and
    /// archived listings are visible to the owning dealer only.
    pub fn is_visible_to(&self, requester: &Requester) -> bool {
        self.status == ListingStatus::Published || self.is_owned_by(requester.user_id)
    }
}

/// Input for creating a listing. New listings always start as drafts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub location: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub size: Decimal,
    pub size_unit: SizeUnit,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub property_type: PropertyType,
    #[serde(default)]
    pub amenities: Vec<String>,
}

/// Partial update. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub size: Option<Decimal>,
    pub size_unit: Option<SizeUnit>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub property_type: Option<PropertyType>,
    pub amenities: Option<Vec<String>>,
    pub status: Option<ListingStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_transitions() {
        use ListingStatus::*;
        assert!(Draft.can_transition_to(Published));
        assert!(Draft.can_transition_to(Archived));
        assert!(Published.can_transition_to(Archived));
        assert!(!Published.can_transition_to(Draft));
        assert!(!Archived.can_transition_to(Published));
        assert!(!Archived.can_transition_to(Draft));
        assert!(!Draft.can_transition_to(Draft));
    }

    #[test]
    fn only_archived_is_excluded_from_quota() {
        assert!(ListingStatus::Draft.counts_toward_quota());
        assert!(ListingStatus::Published.counts_toward_quota());
        assert!(!ListingStatus::Archived.counts_toward_quota());
    }

    #[test]
    fn enums_round_trip_through_their_names() {
        assert_eq!("villa".parse::<PropertyType>(), Ok(PropertyType::Villa));
        assert_eq!("acres".parse::<SizeUnit>(), Ok(SizeUnit::Acres));
        assert_eq!(ListingStatus::Published.to_string(), "published");
        let err = "castle".parse::<PropertyType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown property type 'castle'");
    }
}
