//! Listing filter sets and the typed predicates they compile to.
//!
//! A [`ListingFilters`] is what callers (query string, NLP service, local
//! parser) produce. [`ListingFilters::predicates`] turns every present field
//! into one [`Predicate`]; a listing matches the filter set iff it matches the
//! conjunction of those predicates. The store renders the same predicates to
//! SQL, so the in-memory fold below is the reference semantics.

use serde::{Deserialize, Serialize};

use crate::listing::{Listing, PropertyType};
use crate::types::Decimal;

/// Structured filter set. Every field is optional; absent fields do not
/// constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amenities: Vec<String>,
}

impl ListingFilters {
    pub fn is_empty(&self) -> bool {
        self.predicates().is_empty()
    }

    /// Compile the present fields into predicates, in a fixed order.
    ///
    /// Blank text filters and an empty amenity list are treated as absent.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        if let Some(city) = non_blank(&self.city) {
            predicates.push(Predicate::TextContains {
                field: TextField::City,
                needle: city.to_string(),
            });
        }
        if let Some(state) = non_blank(&self.state) {
            predicates.push(Predicate::TextContains {
                field: TextField::State,
                needle: state.to_string(),
            });
        }
        if let Some(property_type) = self.property_type {
            predicates.push(Predicate::TypeIs(property_type));
        }
        if let Some(bound) = self.min_price {
            predicates.push(Predicate::AtLeast {
                field: RangeField::Price,
                bound,
            });
        }
        if let Some(bound) = self.max_price {
            predicates.push(Predicate::AtMost {
                field: RangeField::Price,
                bound,
            });
        }
        if let Some(bound) = self.min_size {
            predicates.push(Predicate::AtLeast {
                field: RangeField::Size,
                bound,
            });
        }
        if let Some(bound) = self.max_size {
            predicates.push(Predicate::AtMost {
                field: RangeField::Size,
                bound,
            });
        }
        if let Some(value) = self.bedrooms {
            predicates.push(Predicate::CountEquals {
                field: CountField::Bedrooms,
                value,
            });
        }
        if let Some(value) = self.bathrooms {
            predicates.push(Predicate::CountEquals {
                field: CountField::Bathrooms,
                value,
            });
        }
        if !self.amenities.is_empty() {
            predicates.push(Predicate::HasAmenities(self.amenities.clone()));
        }

        predicates
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    City,
    State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeField {
    Price,
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountField {
    Bedrooms,
    Bathrooms,
}

/// One typed condition: a field, an operator, and a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Case-insensitive substring match.
    TextContains { field: TextField, needle: String },
    /// Inclusive lower bound.
    AtLeast { field: RangeField, bound: Decimal },
    /// Inclusive upper bound.
    AtMost { field: RangeField, bound: Decimal },
    /// Exact match; listings without a value never match.
    CountEquals { field: CountField, value: i32 },
    TypeIs(PropertyType),
    /// Every requested amenity must be present on the listing.
    HasAmenities(Vec<String>),
}

impl Predicate {
    /// Storage column the predicate constrains.
    pub fn column(&self) -> &'static str {
        match self {
            Self::TextContains { field: TextField::City, .. } => "city",
            Self::TextContains { field: TextField::State, .. } => "state",
            Self::AtLeast { field, .. } | Self::AtMost { field, .. } => match field {
                RangeField::Price => "price",
                RangeField::Size => "size",
            },
            Self::CountEquals { field, .. } => match field {
                CountField::Bedrooms => "bedrooms",
                CountField::Bathrooms => "bathrooms",
            },
            Self::TypeIs(_) => "property_type",
            Self::HasAmenities(_) => "amenities",
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        match self {
            Self::TextContains { field, needle } => {
                let haystack = match field {
                    TextField::City => &listing.city,
                    TextField::State => &listing.state,
                };
                haystack.to_lowercase().contains(&needle.to_lowercase())
            }
            Self::AtLeast { field, bound } => range_value(listing, *field) >= *bound,
            Self::AtMost { field, bound } => range_value(listing, *field) <= *bound,
            Self::CountEquals { field, value } => {
                let actual = match field {
                    CountField::Bedrooms => listing.bedrooms,
                    CountField::Bathrooms => listing.bathrooms,
                };
                actual == Some(*value)
            }
            Self::TypeIs(property_type) => listing.property_type == *property_type,
            Self::HasAmenities(required) => required
                .iter()
                .all(|amenity| listing.amenities.iter().any(|a| a == amenity)),
        }
    }
}

fn range_value(listing: &Listing, field: RangeField) -> Decimal {
    match field {
        RangeField::Price => listing.price,
        RangeField::Size => listing.size,
    }
}

/// Fold a predicate list into a single conjunction.
pub fn matches_all(predicates: &[Predicate], listing: &Listing) -> bool {
    predicates.iter().all(|p| p.matches(listing))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
