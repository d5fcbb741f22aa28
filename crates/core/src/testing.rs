//! In-memory ports for service and HTTP tests.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for downstream test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::UpstreamError;
use crate::lead::{Lead, NewLead, LEAD_STATUS_NEW};
use crate::listing::{Listing, ListingPatch, ListingStatus, NewListing, PropertyType, SizeUnit};
use crate::ports::{
    BillingGateway, BillingSubscription, CacheStore, LeadStore, ListingStore, NlpService,
    ParsedQuery, PortResult, SubscriptionStore,
};
use crate::query::{ListingQuery, Page, Pagination};
use crate::subscription::{
    one_month_from, NewSubscription, Subscription, SubscriptionPlan, SubscriptionStatus,
};
use crate::types::{new_id, DbId, Decimal, Timestamp};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A draft apartment owned by `dealer_id`.
pub fn sample_listing(dealer_id: DbId) -> Listing {
    let now = Utc::now();
    Listing {
        id: new_id(),
        dealer_id,
        title: "2 BHK near the station".into(),
        description: "East facing, third floor".into(),
        price: Decimal::from(7_500_000),
        location: "Andheri West".into(),
        city: "Mumbai".into(),
        state: "Maharashtra".into(),
        postal_code: "400058".into(),
        latitude: Some(19.1364),
        longitude: Some(72.8296),
        size: Decimal::from(850),
        size_unit: SizeUnit::Sqft,
        bedrooms: Some(2),
        bathrooms: Some(2),
        property_type: PropertyType::Apartment,
        amenities: vec!["Parking".into(), "Elevator".into()],
        status: ListingStatus::Draft,
        views_count: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn new_listing_input() -> NewListing {
    NewListing {
        title: "Garden villa".into(),
        description: "Gated community".into(),
        price: Decimal::from(21_000_000),
        location: "Whitefield".into(),
        city: "Bangalore".into(),
        state: "Karnataka".into(),
        postal_code: "560066".into(),
        latitude: None,
        longitude: None,
        size: Decimal::from(2400),
        size_unit: SizeUnit::Sqft,
        bedrooms: Some(4),
        bathrooms: Some(4),
        property_type: PropertyType::Villa,
        amenities: vec!["Garden".into(), "Parking".into()],
    }
}

fn apply_patch(listing: &mut Listing, patch: &ListingPatch) {
    macro_rules! set {
        ($($field:ident),+) => {
            $(if let Some(v) = &patch.$field { listing.$field = v.clone(); })+
        };
    }
    set!(title, description, price, location, city, state, postal_code, size, size_unit);
    set!(property_type, amenities, status);
    if patch.latitude.is_some() {
        listing.latitude = patch.latitude;
    }
    if patch.longitude.is_some() {
        listing.longitude = patch.longitude;
    }
    if patch.bedrooms.is_some() {
        listing.bedrooms = patch.bedrooms;
    }
    if patch.bathrooms.is_some() {
        listing.bathrooms = patch.bathrooms;
    }
    listing.updated_at = Utc::now();
}

// ---------------------------------------------------------------------------
// Relational store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    listings: Vec<Listing>,
    subscriptions: Vec<Subscription>,
    leads: Vec<Lead>,
}

/// All three stores over plain vectors. Insertion order stands in for
/// creation order.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    failing: AtomicBool,
    external_seq: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every store call fail with an upstream error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Insert or replace a listing row as-is.
    pub fn put_listing(&self, listing: Listing) {
        let mut tables = self.lock();
        match tables.listings.iter().position(|l| l.id == listing.id) {
            Some(pos) => tables.listings[pos] = listing,
            None => tables.listings.push(listing),
        }
    }

    pub fn listing(&self, id: DbId) -> Option<Listing> {
        self.lock().listings.iter().find(|l| l.id == id).cloned()
    }

    /// Add a subscription with a fresh billing id, newer than any before it.
    pub fn seed_subscription(
        &self,
        user_id: DbId,
        plan: SubscriptionPlan,
        status: SubscriptionStatus,
    ) -> Subscription {
        let n = self.external_seq.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let subscription = Subscription {
            id: new_id(),
            user_id,
            plan,
            status,
            listing_limit: plan.listing_limit(),
            external_subscription_id: Some(format!("sub_seed_{n}")),
            external_customer_id: Some(format!("cus_seed_{n}")),
            expires_at: one_month_from(now),
            created_at: now,
            updated_at: now,
        };
        self.lock().subscriptions.push(subscription.clone());
        subscription
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> PortResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(UpstreamError::store("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ListingStore for InMemoryStore {
    async fn fetch_page(&self, query: &ListingQuery) -> PortResult<Page<Listing>> {
        self.check()?;
        Ok(query.apply(self.lock().listings.iter()))
    }

    async fn find_by_id(&self, id: DbId) -> PortResult<Option<Listing>> {
        self.check()?;
        Ok(self.listing(id))
    }

    async fn insert(&self, dealer_id: DbId, input: &NewListing) -> PortResult<Listing> {
        self.check()?;
        let now = Utc::now();
        let listing = Listing {
            id: new_id(),
            dealer_id,
            title: input.title.clone(),
            description: input.description.clone(),
            price: input.price,
            location: input.location.clone(),
            city: input.city.clone(),
            state: input.state.clone(),
            postal_code: input.postal_code.clone(),
            latitude: input.latitude,
            longitude: input.longitude,
            size: input.size,
            size_unit: input.size_unit,
            bedrooms: input.bedrooms,
            bathrooms: input.bathrooms,
            property_type: input.property_type,
            amenities: input.amenities.clone(),
            status: ListingStatus::Draft,
            views_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.lock().listings.push(listing.clone());
        Ok(listing)
    }

    async fn update(&self, id: DbId, patch: &ListingPatch) -> PortResult<Option<Listing>> {
        self.check()?;
        let mut tables = self.lock();
        Ok(tables.listings.iter_mut().find(|l| l.id == id).map(|l| {
            apply_patch(l, patch);
            l.clone()
        }))
    }

    async fn set_status(&self, id: DbId, status: ListingStatus) -> PortResult<bool> {
        self.check()?;
        let mut tables = self.lock();
        Ok(match tables.listings.iter_mut().find(|l| l.id == id) {
            Some(l) => {
                l.status = status;
                l.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn count_active_for_dealer(&self, dealer_id: DbId) -> PortResult<i64> {
        self.check()?;
        Ok(self
            .lock()
            .listings
            .iter()
            .filter(|l| l.dealer_id == dealer_id && l.status.counts_toward_quota())
            .count() as i64)
    }

    async fn increment_views(&self, id: DbId) -> PortResult<bool> {
        self.check()?;
        let mut tables = self.lock();
        Ok(match tables.listings.iter_mut().find(|l| l.id == id) {
            Some(l) => {
                l.views_count += 1;
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl SubscriptionStore for InMemoryStore {
    async fn latest_for_user(&self, user_id: DbId) -> PortResult<Option<Subscription>> {
        self.check()?;
        Ok(self
            .lock()
            .subscriptions
            .iter()
            .rev()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn find_active_for_user(&self, user_id: DbId) -> PortResult<Option<Subscription>> {
        self.check()?;
        Ok(self
            .lock()
            .subscriptions
            .iter()
            .rev()
            .find(|s| s.user_id == user_id && s.is_active())
            .cloned())
    }

    async fn find_customer_id(&self, user_id: DbId) -> PortResult<Option<String>> {
        self.check()?;
        Ok(self
            .lock()
            .subscriptions
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id)
            .find_map(|s| s.external_customer_id.clone()))
    }

    async fn find_by_id(&self, id: DbId) -> PortResult<Option<Subscription>> {
        self.check()?;
        Ok(self
            .lock()
            .subscriptions
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn insert(&self, input: &NewSubscription) -> PortResult<Subscription> {
        self.check()?;
        let now = Utc::now();
        let subscription = Subscription {
            id: new_id(),
            user_id: input.user_id,
            plan: input.plan,
            status: input.status,
            listing_limit: input.listing_limit,
            external_subscription_id: input.external_subscription_id.clone(),
            external_customer_id: input.external_customer_id.clone(),
            expires_at: input.expires_at,
            created_at: now,
            updated_at: now,
        };
        self.lock().subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    async fn update_status(
        &self,
        id: DbId,
        status: SubscriptionStatus,
    ) -> PortResult<Option<Subscription>> {
        self.check()?;
        let mut tables = self.lock();
        Ok(tables.subscriptions.iter_mut().find(|s| s.id == id).map(|s| {
            s.status = status;
            s.updated_at = Utc::now();
            s.clone()
        }))
    }

    async fn update_by_external_id(
        &self,
        external_id: &str,
        status: SubscriptionStatus,
        expires_at: Option<Timestamp>,
    ) -> PortResult<Option<Subscription>> {
        self.check()?;
        let mut tables = self.lock();
        Ok(tables
            .subscriptions
            .iter_mut()
            .find(|s| s.external_subscription_id.as_deref() == Some(external_id))
            .map(|s| {
                s.status = status;
                if let Some(expires_at) = expires_at {
                    s.expires_at = expires_at;
                }
                s.updated_at = Utc::now();
                s.clone()
            }))
    }
}

#[async_trait]
impl LeadStore for InMemoryStore {
    async fn insert(&self, dealer_id: DbId, input: &NewLead) -> PortResult<Lead> {
        self.check()?;
        let lead = Lead {
            id: new_id(),
            listing_id: input.listing_id,
            dealer_id,
            name: input.name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            message: input.message.clone(),
            status: LEAD_STATUS_NEW.to_string(),
            created_at: Utc::now(),
        };
        self.lock().leads.push(lead.clone());
        Ok(lead)
    }

    async fn list_for_dealer(
        &self,
        dealer_id: DbId,
        listing_id: Option<DbId>,
        pagination: Pagination,
    ) -> PortResult<Page<Lead>> {
        self.check()?;
        let selected: Vec<Lead> = self
            .lock()
            .leads
            .iter()
            .rev()
            .filter(|l| l.dealer_id == dealer_id)
            .filter(|l| listing_id.map_or(true, |id| l.listing_id == id))
            .cloned()
            .collect();
        Ok(Page::slice(selected, pagination))
    }

    async fn find_by_id(&self, id: DbId) -> PortResult<Option<Lead>> {
        self.check()?;
        Ok(self.lock().leads.iter().find(|l| l.id == id).cloned())
    }

    async fn update_status(&self, id: DbId, status: &str) -> PortResult<Option<Lead>> {
        self.check()?;
        let mut tables = self.lock();
        Ok(tables.leads.iter_mut().find(|l| l.id == id).map(|l| {
            l.status = status.to_string();
            l.clone()
        }))
    }

    async fn count_for_dealer(&self, dealer_id: DbId, status: Option<&str>) -> PortResult<i64> {
        self.check()?;
        Ok(self
            .lock()
            .leads
            .iter()
            .filter(|l| l.dealer_id == dealer_id)
            .filter(|l| status.map_or(true, |s| l.status == s))
            .count() as i64)
    }

    async fn listing_refs_for_dealer(&self, dealer_id: DbId) -> PortResult<Vec<DbId>> {
        self.check()?;
        Ok(self
            .lock()
            .leads
            .iter()
            .filter(|l| l.dealer_id == dealer_id)
            .map(|l| l.listing_id)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Cache store
// ---------------------------------------------------------------------------

/// Key/value cache honouring TTLs, with an outage switch.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    unavailable: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a cache outage: every call fails until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        let expires = Instant::now() + Duration::from_secs(300);
        self.lock().insert(key.to_string(), (value.to_string(), expires));
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock()
            .get(key)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(value, _)| value.clone())
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (String, Instant)>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> PortResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(UpstreamError::cache("connection timed out"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        self.check()?;
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> PortResult<()> {
        self.check()?;
        self.lock()
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        self.check()?;
        self.lock().remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> PortResult<u64> {
        self.check()?;
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }
}

// ---------------------------------------------------------------------------
// Billing gateway
// ---------------------------------------------------------------------------

#[derive(Default)]
struct BillingLedger {
    customers: Vec<String>,
    subscriptions: Vec<String>,
    cancelled: Vec<String>,
}

/// Records calls; customers it created can be retrieved again.
#[derive(Default)]
pub struct FakeBilling {
    ledger: Mutex<BillingLedger>,
    failing: AtomicBool,
}

impl FakeBilling {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn customers_created(&self) -> usize {
        self.lock().customers.len()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.lock().cancelled.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BillingLedger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> PortResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(UpstreamError::billing("card_declined"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BillingGateway for FakeBilling {
    async fn retrieve_customer(&self, customer_id: &str) -> PortResult<Option<String>> {
        self.check()?;
        Ok(self
            .lock()
            .customers
            .iter()
            .find(|c| c.as_str() == customer_id)
            .cloned())
    }

    async fn create_customer(&self, _email: &str, _payment_method_id: &str) -> PortResult<String> {
        self.check()?;
        let mut ledger = self.lock();
        let id = format!("cus_test_{}", ledger.customers.len() + 1);
        ledger.customers.push(id.clone());
        Ok(id)
    }

    async fn create_subscription(
        &self,
        _customer_id: &str,
        _plan: SubscriptionPlan,
    ) -> PortResult<BillingSubscription> {
        self.check()?;
        let mut ledger = self.lock();
        let id = format!("sub_test_{}", ledger.subscriptions.len() + 1);
        ledger.subscriptions.push(id.clone());
        Ok(BillingSubscription {
            id,
            status: "active".into(),
        })
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> PortResult<()> {
        self.check()?;
        self.lock().cancelled.push(subscription_id.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NLP service
// ---------------------------------------------------------------------------

/// Answers every query with the same result, or always fails.
pub struct StaticNlp {
    result: Option<ParsedQuery>,
    delay: Option<Duration>,
    timeout: Duration,
}

impl StaticNlp {
    pub fn returning(result: ParsedQuery) -> Self {
        Self {
            result: Some(result),
            delay: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            delay: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl NlpService for StaticNlp {
    async fn parse_query(
        &self,
        _query: &str,
        _context: Option<&serde_json::Value>,
    ) -> PortResult<ParsedQuery> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result
            .clone()
            .ok_or_else(|| UpstreamError::nlp("service unavailable"))
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
