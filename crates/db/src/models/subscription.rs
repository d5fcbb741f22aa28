use estate_core::listing::UnknownVariant;
use estate_core::subscription::Subscription;
use estate_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `subscriptions` table.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: DbId,
    pub user_id: DbId,
    pub plan: String,
    pub status: String,
    pub listing_limit: i32,
    pub external_subscription_id: Option<String>,
    pub external_customer_id: Option<String>,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = UnknownVariant;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: row.id,
            user_id: row.user_id,
            plan: row.plan.parse()?,
            status: row.status.parse()?,
            listing_limit: row.listing_limit,
            external_subscription_id: row.external_subscription_id,
            external_customer_id: row.external_customer_id,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
