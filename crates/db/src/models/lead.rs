use estate_core::lead::Lead;
use estate_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `leads` table. Lead status is free text, so rows map
/// straight onto the domain type.
#[derive(Debug, Clone, FromRow)]
pub struct LeadRow {
    pub id: DbId,
    pub listing_id: DbId,
    pub dealer_id: DbId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: Option<String>,
    pub status: String,
    pub created_at: Timestamp,
}

impl From<LeadRow> for Lead {
    fn from(row: LeadRow) -> Self {
        Lead {
            id: row.id,
            listing_id: row.listing_id,
            dealer_id: row.dealer_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            message: row.message,
            status: row.status,
            created_at: row.created_at,
        }
    }
}
