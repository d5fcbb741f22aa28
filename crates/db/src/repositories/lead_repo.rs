//! Repository for the `leads` table.

use estate_core::lead::{NewLead, LEAD_STATUS_NEW};
use estate_core::query::Pagination;
use estate_core::types::{new_id, DbId};
use sqlx::PgPool;

use crate::models::lead::LeadRow;

/// Column list for leads queries.
const COLUMNS: &str =
    "id, listing_id, dealer_id, name, email, phone, message, status, created_at";

/// Provides CRUD operations for leads.
pub struct LeadRepo;

impl LeadRepo {
    /// Insert a lead with the dealer copied from its listing.
    pub async fn create(
        pool: &PgPool,
        dealer_id: DbId,
        input: &NewLead,
    ) -> Result<LeadRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO leads (id, listing_id, dealer_id, name, email, phone, message, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LeadRow>(&query)
            .bind(new_id())
            .bind(input.listing_id)
            .bind(dealer_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.message)
            .bind(LEAD_STATUS_NEW)
            .fetch_one(pool)
            .await
    }

    /// Dealer-scoped page, newest first, optionally for one listing.
    pub async fn list_for_dealer(
        pool: &PgPool,
        dealer_id: DbId,
        listing_id: Option<DbId>,
        pagination: Pagination,
    ) -> Result<Vec<LeadRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM leads
             WHERE dealer_id = $1 AND ($2::UUID IS NULL OR listing_id = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, LeadRow>(&query)
            .bind(dealer_id)
            .bind(listing_id)
            .bind(pagination.limit)
            .bind(pagination.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count_listed(
        pool: &PgPool,
        dealer_id: DbId,
        listing_id: Option<DbId>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM leads
             WHERE dealer_id = $1 AND ($2::UUID IS NULL OR listing_id = $2)",
        )
        .bind(dealer_id)
        .bind(listing_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<LeadRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM leads WHERE id = $1");
        sqlx::query_as::<_, LeadRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<LeadRow>, sqlx::Error> {
        let query = format!("UPDATE leads SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, LeadRow>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Count a dealer's leads, optionally only those in `status`.
    pub async fn count_for_dealer(
        pool: &PgPool,
        dealer_id: DbId,
        status: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM leads
             WHERE dealer_id = $1 AND ($2::TEXT IS NULL OR status = $2)",
        )
        .bind(dealer_id)
        .bind(status)
        .fetch_one(pool)
        .await
    }

    /// Listing reference of every lead the dealer holds.
    pub async fn listing_refs_for_dealer(
        pool: &PgPool,
        dealer_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("SELECT listing_id FROM leads WHERE dealer_id = $1")
            .bind(dealer_id)
            .fetch_all(pool)
            .await
    }
}
