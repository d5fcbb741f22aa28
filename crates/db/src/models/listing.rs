use estate_core::listing::{Listing, UnknownVariant};
use estate_core::types::{DbId, Decimal, Timestamp};
use sqlx::FromRow;

/// A row from the `listings` table.
#[derive(Debug, Clone, FromRow)]
pub struct ListingRow {
    pub id: DbId,
    pub dealer_id: DbId,
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
    pub size_unit: String,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub property_type: String,
    pub amenities: Vec<String>,
    pub status: String,
    pub views_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ListingRow> for Listing {
    type Error = UnknownVariant;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        Ok(Listing {
            id: row.id,
            dealer_id: row.dealer_id,
            title: row.title,
            description: row.description,
            price: row.price,
            location: row.location,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            latitude: row.latitude,
            longitude: row.longitude,
            size: row.size,
            size_unit: row.size_unit.parse()?,
            bedrooms: row.bedrooms,
            bathrooms: row.bathrooms,
            property_type: row.property_type.parse()?,
            amenities: row.amenities,
            status: row.status.parse()?,
            views_count: row.views_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
