//! Repository for the `listings` table.

use estate_core::listing::{ListingPatch, ListingStatus, NewListing};
use estate_core::query::ListingQuery;
use estate_core::types::{new_id, DbId};
use sqlx::PgPool;

use crate::filter_sql::{build_listing_filter, order_by, BindValue};
use crate::models::listing::ListingRow;

/// Column list for listings queries.
const COLUMNS: &str = "id, dealer_id, title, description, price, location, city, state, \
    postal_code, latitude, longitude, size, size_unit, bedrooms, bathrooms, property_type, \
    amenities, status, views_count, created_at, updated_at";

/// Provides CRUD operations for listings.
pub struct ListingRepo;

impl ListingRepo {
    /// One page of a composed query.
    pub async fn list(pool: &PgPool, query: &ListingQuery) -> Result<Vec<ListingRow>, sqlx::Error> {
        let filter = build_listing_filter(query);
        let sql = format!(
            "SELECT {COLUMNS} FROM listings {} {} LIMIT ${} OFFSET ${}",
            filter.where_clause,
            order_by(query.sort),
            filter.next_idx,
            filter.next_idx + 1,
        );

        let mut q = sqlx::query_as::<_, ListingRow>(&sql);
        for value in &filter.binds {
            q = match value {
                BindValue::Text(v) => q.bind(v.as_str()),
                BindValue::Numeric(v) => q.bind(*v),
                BindValue::Int(v) => q.bind(*v),
                BindValue::Id(v) => q.bind(*v),
                BindValue::TextArray(v) => q.bind(v.as_slice()),
            };
        }
        q.bind(query.pagination.limit)
            .bind(query.pagination.offset())
            .fetch_all(pool)
            .await
    }

    /// Size of the full filtered set, ignoring pagination.
    pub async fn count(pool: &PgPool, query: &ListingQuery) -> Result<i64, sqlx::Error> {
        let filter = build_listing_filter(query);
        let sql = format!(
            "SELECT COUNT(*)::BIGINT FROM listings {}",
            filter.where_clause
        );

        let mut q = sqlx::query_scalar::<_, i64>(&sql);
        for value in &filter.binds {
            q = match value {
                BindValue::Text(v) => q.bind(v.as_str()),
                BindValue::Numeric(v) => q.bind(*v),
                BindValue::Int(v) => q.bind(*v),
                BindValue::Id(v) => q.bind(*v),
                BindValue::TextArray(v) => q.bind(v.as_slice()),
            };
        }
        q.fetch_one(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ListingRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM listings WHERE id = $1");
        sqlx::query_as::<_, ListingRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new draft listing, returning the created row.
    pub async fn create(
        pool: &PgPool,
        dealer_id: DbId,
        input: &NewListing,
    ) -> Result<ListingRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO listings
                (id, dealer_id, title, description, price, location, city, state, postal_code,
                 latitude, longitude, size, size_unit, bedrooms, bathrooms, property_type,
                 amenities, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ListingRow>(&query)
            .bind(new_id())
            .bind(dealer_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.price)
            .bind(&input.location)
            .bind(&input.city)
            .bind(&input.state)
            .bind(&input.postal_code)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(input.size)
            .bind(input.size_unit.as_str())
            .bind(input.bedrooms)
            .bind(input.bathrooms)
            .bind(input.property_type.as_str())
            .bind(&input.amenities)
            .bind(ListingStatus::Draft.as_str())
            .fetch_one(pool)
            .await
    }

    /// Apply the present fields of a patch, returning the updated row.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &ListingPatch,
    ) -> Result<Option<ListingRow>, sqlx::Error> {
        let query = format!(
            "UPDATE listings SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                location = COALESCE($5, location),
                city = COALESCE($6, city),
                state = COALESCE($7, state),
                postal_code = COALESCE($8, postal_code),
                latitude = COALESCE($9, latitude),
                longitude = COALESCE($10, longitude),
                size = COALESCE($11, size),
                size_unit = COALESCE($12, size_unit),
                bedrooms = COALESCE($13, bedrooms),
                bathrooms = COALESCE($14, bathrooms),
                property_type = COALESCE($15, property_type),
                amenities = COALESCE($16, amenities),
                status = COALESCE($17, status),
                updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ListingRow>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.price)
            .bind(&input.location)
            .bind(&input.city)
            .bind(&input.state)
            .bind(&input.postal_code)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(input.size)
            .bind(input.size_unit.map(|u| u.as_str()))
            .bind(input.bedrooms)
            .bind(input.bathrooms)
            .bind(input.property_type.map(|t| t.as_str()))
            .bind(&input.amenities)
            .bind(input.status.map(|s| s.as_str()))
            .fetch_optional(pool)
            .await
    }

    /// Set the lifecycle status. Returns `true` if a row was updated.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: ListingStatus,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE listings SET status = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Non-archived listings held by a dealer.
    pub async fn count_active_for_dealer(pool: &PgPool, dealer_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM listings WHERE dealer_id = $1 AND status <> $2",
        )
        .bind(dealer_id)
        .bind(ListingStatus::Archived.as_str())
        .fetch_one(pool)
        .await
    }

    /// Atomic view counter bump. Leaves `updated_at` alone.
    pub async fn increment_views(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE listings SET views_count = views_count + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
