//! Collaborator contracts the services are built against.
//!
//! Every port returns [`UpstreamError`] on failure. Implementations live in
//! `estate-db` (store), `estate-cache` (cache) and `estate-gateway` (billing
//! and NLP); in-memory fakes live in [`crate::testing`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;
use crate::filter::ListingFilters;
use crate::lead::{Lead, NewLead};
use crate::listing::{Listing, ListingPatch, ListingStatus, NewListing};
use crate::query::{ListingQuery, Page, Pagination};
use crate::subscription::{NewSubscription, Subscription, SubscriptionPlan, SubscriptionStatus};
use crate::types::{DbId, Timestamp};

pub type PortResult<T> = Result<T, UpstreamError>;

// ---------------------------------------------------------------------------
// Relational store
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Filtered, sorted page plus the total over the full filtered set.
    async fn fetch_page(&self, query: &ListingQuery) -> PortResult<Page<Listing>>;

    async fn find_by_id(&self, id: DbId) -> PortResult<Option<Listing>>;

    /// Insert a draft listing with a zero view counter.
    async fn insert(&self, dealer_id: DbId, input: &NewListing) -> PortResult<Listing>;

    /// Apply the `Some` fields of `patch`. `None` when the row is gone.
    async fn update(&self, id: DbId, patch: &ListingPatch) -> PortResult<Option<Listing>>;

    async fn set_status(&self, id: DbId, status: ListingStatus) -> PortResult<bool>;

    /// Non-archived listings held by the dealer.
    async fn count_active_for_dealer(&self, dealer_id: DbId) -> PortResult<i64>;

    /// Atomic `views_count + 1`. Returns `false` when no row matched.
    async fn increment_views(&self, id: DbId) -> PortResult<bool>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// The user's current subscription: the most recently created one.
    async fn latest_for_user(&self, user_id: DbId) -> PortResult<Option<Subscription>>;

    async fn find_active_for_user(&self, user_id: DbId) -> PortResult<Option<Subscription>>;

    /// Billing customer id from any earlier subscription of the user.
    async fn find_customer_id(&self, user_id: DbId) -> PortResult<Option<String>>;

    async fn find_by_id(&self, id: DbId) -> PortResult<Option<Subscription>>;

    async fn insert(&self, input: &NewSubscription) -> PortResult<Subscription>;

    async fn update_status(
        &self,
        id: DbId,
        status: SubscriptionStatus,
    ) -> PortResult<Option<Subscription>>;

    /// Reconciliation write keyed by the billing subscription id. `expires_at`
    /// is left unchanged when `None`.
    async fn update_by_external_id(
        &self,
        external_id: &str,
        status: SubscriptionStatus,
        expires_at: Option<Timestamp>,
    ) -> PortResult<Option<Subscription>>;
}

#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn insert(&self, dealer_id: DbId, input: &NewLead) -> PortResult<Lead>;

    /// Dealer-scoped, newest first.
    async fn list_for_dealer(
        &self,
        dealer_id: DbId,
        listing_id: Option<DbId>,
        pagination: Pagination,
    ) -> PortResult<Page<Lead>>;

    async fn find_by_id(&self, id: DbId) -> PortResult<Option<Lead>>;

    async fn update_status(&self, id: DbId, status: &str) -> PortResult<Option<Lead>>;

    async fn count_for_dealer(&self, dealer_id: DbId, status: Option<&str>) -> PortResult<i64>;

    /// The listing reference of every lead the dealer holds.
    async fn listing_refs_for_dealer(&self, dealer_id: DbId) -> PortResult<Vec<DbId>>;
}

// ---------------------------------------------------------------------------
// Cache store
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> PortResult<()>;

    async fn delete(&self, key: &str) -> PortResult<()>;

    /// Remove every key starting with `prefix`; returns how many went.
    async fn delete_prefix(&self, prefix: &str) -> PortResult<u64>;
}

// ---------------------------------------------------------------------------
// Billing gateway
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSubscription {
    pub id: String,
    pub status: String,
}

#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// `Ok(None)` when the customer does not exist or was deleted.
    async fn retrieve_customer(&self, customer_id: &str) -> PortResult<Option<String>>;

    async fn create_customer(&self, email: &str, payment_method_id: &str) -> PortResult<String>;

    async fn create_subscription(
        &self,
        customer_id: &str,
        plan: SubscriptionPlan,
    ) -> PortResult<BillingSubscription>;

    async fn cancel_subscription(&self, subscription_id: &str) -> PortResult<()>;
}

/// A verified, decoded webhook from the billing gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    SubscriptionUpdated { subscription_id: String, status: String },
    SubscriptionDeleted { subscription_id: String },
    InvoicePaid { subscription_id: String },
    InvoicePaymentFailed { subscription_id: String },
}

impl BillingEvent {
    pub fn subscription_id(&self) -> &str {
        match self {
            Self::SubscriptionUpdated { subscription_id, .. }
            | Self::SubscriptionDeleted { subscription_id }
            | Self::InvoicePaid { subscription_id }
            | Self::InvoicePaymentFailed { subscription_id } => subscription_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::SubscriptionUpdated { .. } => "customer.subscription.updated",
            Self::SubscriptionDeleted { .. } => "customer.subscription.deleted",
            Self::InvoicePaid { .. } => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed { .. } => "invoice.payment_failed",
        }
    }
}

// ---------------------------------------------------------------------------
// NLP service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    #[serde(default)]
    pub filters: ListingFilters,
    #[serde(default)]
    pub intent: Option<String>,
}

#[async_trait]
pub trait NlpService: Send + Sync {
    async fn parse_query(
        &self,
        query: &str,
        context: Option<&serde_json::Value>,
    ) -> PortResult<ParsedQuery>;

    /// Upper bound the translator waits before falling back.
    fn timeout(&self) -> Duration {
        Duration::from_secs(10)
    }
}
