//! [`PgStore`]: the store ports backed by PostgreSQL.

use async_trait::async_trait;
use estate_core::error::UpstreamError;
use estate_core::lead::{Lead, NewLead};
use estate_core::listing::{Listing, ListingPatch, ListingStatus, NewListing};
use estate_core::ports::{LeadStore, ListingStore, PortResult, SubscriptionStore};
use estate_core::query::{ListingQuery, Page, Pagination};
use estate_core::subscription::{NewSubscription, Subscription, SubscriptionStatus};
use estate_core::types::{DbId, Timestamp};

use crate::models::listing::ListingRow;
use crate::models::subscription::SubscriptionRow;
use crate::repositories::{LeadRepo, ListingRepo, SubscriptionRepo};
use crate::DbPool;

/// Store ports over a shared connection pool. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> UpstreamError {
    tracing::error!(error = %e, "Database error");
    UpstreamError::store(e.to_string())
}

fn listing(row: ListingRow) -> PortResult<Listing> {
    Listing::try_from(row).map_err(|e| UpstreamError::store(e.to_string()))
}

fn subscription(row: SubscriptionRow) -> PortResult<Subscription> {
    Subscription::try_from(row).map_err(|e| UpstreamError::store(e.to_string()))
}

#[async_trait]
impl ListingStore for PgStore {
    async fn fetch_page(&self, query: &ListingQuery) -> PortResult<Page<Listing>> {
        let rows = ListingRepo::list(&self.pool, query).await.map_err(db_err)?;
        let total = ListingRepo::count(&self.pool, query).await.map_err(db_err)?;
        let items = rows
            .into_iter()
            .map(listing)
            .collect::<PortResult<Vec<_>>>()?;
        Ok(Page::new(items, total))
    }

    async fn find_by_id(&self, id: DbId) -> PortResult<Option<Listing>> {
        ListingRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db_err)?
            .map(listing)
            .transpose()
    }

    async fn insert(&self, dealer_id: DbId, input: &NewListing) -> PortResult<Listing> {
        let row = ListingRepo::create(&self.pool, dealer_id, input)
            .await
            .map_err(db_err)?;
        listing(row)
    }

    async fn update(&self, id: DbId, patch: &ListingPatch) -> PortResult<Option<Listing>> {
        ListingRepo::update(&self.pool, id, patch)
            .await
            .map_err(db_err)?
            .map(listing)
            .transpose()
    }

    async fn set_status(&self, id: DbId, status: ListingStatus) -> PortResult<bool> {
        ListingRepo::set_status(&self.pool, id, status)
            .await
            .map_err(db_err)
    }

    async fn count_active_for_dealer(&self, dealer_id: DbId) -> PortResult<i64> {
        ListingRepo::count_active_for_dealer(&self.pool, dealer_id)
            .await
            .map_err(db_err)
    }

    async fn increment_views(&self, id: DbId) -> PortResult<bool> {
        ListingRepo::increment_views(&self.pool, id)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    async fn latest_for_user(&self, user_id: DbId) -> PortResult<Option<Subscription>> {
        SubscriptionRepo::latest_for_user(&self.pool, user_id)
            .await
            .map_err(db_err)?
            .map(subscription)
            .transpose()
    }

    async fn find_active_for_user(&self, user_id: DbId) -> PortResult<Option<Subscription>> {
        SubscriptionRepo::find_active_for_user(&self.pool, user_id)
            .await
            .map_err(db_err)?
            .map(subscription)
            .transpose()
    }

    async fn find_customer_id(&self, user_id: DbId) -> PortResult<Option<String>> {
        SubscriptionRepo::find_customer_id(&self.pool, user_id)
            .await
            .map_err(db_err)
    }

    async fn find_by_id(&self, id: DbId) -> PortResult<Option<Subscription>> {
        SubscriptionRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db_err)?
            .map(subscription)
            .transpose()
    }

    async fn insert(&self, input: &NewSubscription) -> PortResult<Subscription> {
        let row = SubscriptionRepo::create(&self.pool, input)
            .await
            .map_err(db_err)?;
        subscription(row)
    }

    async fn update_status(
        &self,
        id: DbId,
        status: SubscriptionStatus,
    ) -> PortResult<Option<Subscription>> {
        SubscriptionRepo::update_status(&self.pool, id, status)
            .await
            .map_err(db_err)?
            .map(subscription)
            .transpose()
    }

    async fn update_by_external_id(
        &self,
        external_id: &str,
        status: SubscriptionStatus,
        expires_at: Option<Timestamp>,
    ) -> PortResult<Option<Subscription>> {
        SubscriptionRepo::update_by_external_id(&self.pool, external_id, status, expires_at)
            .await
            .map_err(db_err)?
            .map(subscription)
            .transpose()
    }
}

#[async_trait]
impl LeadStore for PgStore {
    async fn insert(&self, dealer_id: DbId, input: &NewLead) -> PortResult<Lead> {
        LeadRepo::create(&self.pool, dealer_id, input)
            .await
            .map(Lead::from)
            .map_err(db_err)
    }

    async fn list_for_dealer(
        &self,
        dealer_id: DbId,
        listing_id: Option<DbId>,
        pagination: Pagination,
    ) -> PortResult<Page<Lead>> {
        let rows = LeadRepo::list_for_dealer(&self.pool, dealer_id, listing_id, pagination)
            .await
            .map_err(db_err)?;
        let total = LeadRepo::count_listed(&self.pool, dealer_id, listing_id)
            .await
            .map_err(db_err)?;
        Ok(Page::new(rows.into_iter().map(Lead::from).collect(), total))
    }

    async fn find_by_id(&self, id: DbId) -> PortResult<Option<Lead>> {
        LeadRepo::find_by_id(&self.pool, id)
            .await
            .map(|row| row.map(Lead::from))
            .map_err(db_err)
    }

    async fn update_status(&self, id: DbId, status: &str) -> PortResult<Option<Lead>> {
        LeadRepo::update_status(&self.pool, id, status)
            .await
            .map(|row| row.map(Lead::from))
            .map_err(db_err)
    }

    async fn count_for_dealer(&self, dealer_id: DbId, status: Option<&str>) -> PortResult<i64> {
        LeadRepo::count_for_dealer(&self.pool, dealer_id, status)
            .await
            .map_err(db_err)
    }

    async fn listing_refs_for_dealer(&self, dealer_id: DbId) -> PortResult<Vec<DbId>> {
        LeadRepo::listing_refs_for_dealer(&self.pool, dealer_id)
            .await
            .map_err(db_err)
    }
}
