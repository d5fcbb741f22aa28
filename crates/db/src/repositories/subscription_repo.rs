//! Repository for the `subscriptions` table.

use estate_core::subscription::{NewSubscription, SubscriptionStatus};
use estate_core::types::{new_id, DbId, Timestamp};
use sqlx::PgPool;

use crate::models::subscription::SubscriptionRow;

/// Column list for subscriptions queries.
const COLUMNS: &str = "id, user_id, plan, status, listing_limit, external_subscription_id, \
    external_customer_id, expires_at, created_at, updated_at";

/// Provides CRUD operations for subscriptions.
pub struct SubscriptionRepo;

impl SubscriptionRepo {
    /// Most recently created subscription of a user, whatever its status.
    pub async fn latest_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<SubscriptionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM subscriptions
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, SubscriptionRow>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_active_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<SubscriptionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM subscriptions
             WHERE user_id = $1 AND status = $2
             ORDER BY created_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, SubscriptionRow>(&query)
            .bind(user_id)
            .bind(SubscriptionStatus::Active.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Billing customer id recorded on any of the user's subscriptions.
    pub async fn find_customer_id(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT external_customer_id FROM subscriptions
             WHERE user_id = $1 AND external_customer_id IS NOT NULL
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SubscriptionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subscriptions WHERE id = $1");
        sqlx::query_as::<_, SubscriptionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &PgPool,
        input: &NewSubscription,
    ) -> Result<SubscriptionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO subscriptions
                (id, user_id, plan, status, listing_limit, external_subscription_id,
                 external_customer_id, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SubscriptionRow>(&query)
            .bind(new_id())
            .bind(input.user_id)
            .bind(input.plan.as_str())
            .bind(input.status.as_str())
            .bind(input.listing_limit)
            .bind(&input.external_subscription_id)
            .bind(&input.external_customer_id)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: SubscriptionStatus,
    ) -> Result<Option<SubscriptionRow>, sqlx::Error> {
        let query = format!(
            "UPDATE subscriptions SET status = $2, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SubscriptionRow>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Reconciliation write keyed by the billing subscription id.
    pub async fn update_by_external_id(
        pool: &PgPool,
        external_id: &str,
        status: SubscriptionStatus,
        expires_at: Option<Timestamp>,
    ) -> Result<Option<SubscriptionRow>, sqlx::Error> {
        let query = format!(
            "UPDATE subscriptions SET
                status = $2,
                expires_at = COALESCE($3, expires_at),
                updated_at = now()
             WHERE external_subscription_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SubscriptionRow>(&query)
            .bind(external_id)
            .bind(status.as_str())
            .bind(expires_at)
            .fetch_optional(pool)
            .await
    }
}
