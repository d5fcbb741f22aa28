//! Best-effort read-through cache for single listings and listing pages.
//!
//! Keys:
//! - `listing:{id}` for a single listing
//! - `listings:{signature}` for a page of a composed query
//!
//! Every method swallows cache failures (logged at `warn`) and behaves as if
//! the cache were absent. The store stays the source of truth.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::listing::Listing;
use crate::ports::CacheStore;
use crate::query::{ListingQuery, Page};
use crate::types::DbId;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

pub const LISTING_KEY_PREFIX: &str = "listing:";
pub const LIST_KEY_PREFIX: &str = "listings:";

pub fn listing_key(id: DbId) -> String {
    format!("{LISTING_KEY_PREFIX}{id}")
}

pub fn list_key(query: &ListingQuery) -> String {
    format!("{LIST_KEY_PREFIX}{}", query.signature())
}

#[derive(Clone)]
pub struct ListingCache {
    store: Option<Arc<dyn CacheStore>>,
    ttl: Duration,
}

impl ListingCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store: Some(store),
            ttl,
        }
    }

    /// A cache that never hits and never writes.
    pub fn disabled() -> Self {
        Self {
            store: None,
            ttl: DEFAULT_TTL,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get_listing(&self, id: DbId) -> Option<Listing> {
        self.read(&listing_key(id)).await
    }

    pub async fn put_listing(&self, listing: &Listing) {
        self.write(&listing_key(listing.id), listing).await;
    }

    pub async fn get_page(&self, query: &ListingQuery) -> Option<Page<Listing>> {
        self.read(&list_key(query)).await
    }

    pub async fn put_page(&self, query: &ListingQuery, page: &Page<Listing>) {
        self.write(&list_key(query), page).await;
    }

    pub async fn invalidate_listing(&self, id: DbId) {
        let Some(store) = &self.store else { return };
        let key = listing_key(id);
        if let Err(e) = store.delete(&key).await {
            tracing::warn!(key = %key, error = %e, "Cache delete failed");
        }
    }

    /// Drop every cached listing page.
    pub async fn invalidate_lists(&self) {
        let Some(store) = &self.store else { return };
        match store.delete_prefix(LIST_KEY_PREFIX).await {
            Ok(removed) => tracing::debug!(removed, "Invalidated cached listing pages"),
            Err(e) => tracing::warn!(error = %e, "Cache prefix delete failed"),
        }
    }

    /// Invalidation after any listing write: the listing's own key (if any)
    /// plus all cached pages.
    pub async fn invalidate_after_write(&self, id: Option<DbId>) {
        if let Some(id) = id {
            self.invalidate_listing(id).await;
        }
        self.invalidate_lists().await;
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.as_ref()?;
        let raw = match store.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) {
        let Some(store) = &self.store else { return };
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache payload encode failed");
                return;
            }
        };
        if let Err(e) = store.set(key, payload, self.ttl).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
        }
    }
}

impl std::fmt::Debug for ListingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingCache")
            .field("enabled", &self.store.is_some())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_listing, MemoryCache};
    use crate::types::new_id;

    #[tokio::test]
    async fn listing_round_trips_through_the_cache() {
        let store = Arc::new(MemoryCache::new());
        let cache = ListingCache::new(store.clone(), DEFAULT_TTL);
        let listing = sample_listing(new_id());

        assert!(cache.get_listing(listing.id).await.is_none());
        cache.put_listing(&listing).await;
        assert_eq!(cache.get_listing(listing.id).await, Some(listing.clone()));

        cache.invalidate_listing(listing.id).await;
        assert!(cache.get_listing(listing.id).await.is_none());
    }

    #[tokio::test]
    async fn write_invalidation_clears_pages_but_not_other_listings() {
        let store = Arc::new(MemoryCache::new());
        let cache = ListingCache::new(store.clone(), DEFAULT_TTL);
        let kept = sample_listing(new_id());
        let written = sample_listing(new_id());
        cache.put_listing(&kept).await;
        cache.put_listing(&written).await;
        store.insert_raw("listings:abc", "{}");
        store.insert_raw("listings:def", "{}");

        cache.invalidate_after_write(Some(written.id)).await;

        assert!(cache.get_listing(kept.id).await.is_some());
        assert!(cache.get_listing(written.id).await.is_none());
        assert_eq!(store.keys_with_prefix(LIST_KEY_PREFIX), Vec::<String>::new());
    }

    #[tokio::test]
    async fn unavailable_cache_degrades_to_misses() {
        let store = Arc::new(MemoryCache::new());
        let cache = ListingCache::new(store.clone(), DEFAULT_TTL);
        let listing = sample_listing(new_id());
        cache.put_listing(&listing).await;

        store.set_unavailable(true);
        assert!(cache.get_listing(listing.id).await.is_none());
        cache.put_listing(&listing).await;
        cache.invalidate_after_write(Some(listing.id)).await;
    }

    #[tokio::test]
    async fn corrupt_entries_are_treated_as_misses() {
        let store = Arc::new(MemoryCache::new());
        let cache = ListingCache::new(store.clone(), DEFAULT_TTL);
        let id = new_id();
        store.insert_raw(&listing_key(id), "not json");
        assert!(cache.get_listing(id).await.is_none());
    }
}
