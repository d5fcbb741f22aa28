use std::sync::Arc;

use estate_core::cache::ListingCache;
use estate_core::ports::{BillingGateway, LeadStore, ListingStore, NlpService, SubscriptionStore};
use estate_core::services::{
    LeadService, ListingService, NaturalLanguageSearch, QuotaEnforcer, SubscriptionLifecycle,
};
use estate_core::tasks::DetachedTasks;
use estate_core::translator::FilterTranslator;
use estate_gateway::webhook::WebhookVerifier;

use crate::config::ServerConfig;

/// The collaborators the services are wired from. `main` fills this with the
/// PostgreSQL store, the moka cache and the HTTP gateways; tests use fakes.
pub struct Collaborators {
    pub listings: Arc<dyn ListingStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub leads: Arc<dyn LeadStore>,
    pub cache: ListingCache,
    pub billing: Arc<dyn BillingGateway>,
    /// `None` runs search on local parsing only.
    pub nlp: Option<Arc<dyn NlpService>>,
    pub webhooks: WebhookVerifier,
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used by the health check.
    pub pool: estate_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub listings: ListingService,
    pub leads: LeadService,
    pub quota: QuotaEnforcer,
    pub subscriptions: SubscriptionLifecycle,
    pub search: NaturalLanguageSearch,
    pub webhooks: WebhookVerifier,
    /// View-counter bumps scheduled by listing reads.
    pub tasks: DetachedTasks,
}

impl AppState {
    pub fn new(pool: estate_db::DbPool, config: ServerConfig, c: Collaborators) -> Self {
        let tasks = DetachedTasks::new();
        let quota = QuotaEnforcer::new(Arc::clone(&c.subscriptions), Arc::clone(&c.listings));
        let listings = ListingService::new(
            Arc::clone(&c.listings),
            c.cache,
            quota.clone(),
            tasks.clone(),
        );
        let leads = LeadService::new(c.leads, Arc::clone(&c.listings));
        let subscriptions = SubscriptionLifecycle::new(c.subscriptions, c.billing);
        let search = NaturalLanguageSearch::new(FilterTranslator::new(c.nlp), listings.clone());

        Self {
            pool,
            config: Arc::new(config),
            listings,
            leads,
            quota,
            subscriptions,
            search,
            webhooks: c.webhooks,
            tasks,
        }
    }
}
