use std::sync::Arc;

use crate::cache::ListingCache;
use crate::error::{CoreError, CoreResult};
use crate::filter::ListingFilters;
use crate::listing::{Listing, ListingPatch, ListingStatus, NewListing};
use crate::ports::ListingStore;
use crate::query::{ListingQuery, Page, Pagination, Sort};
use crate::roles::Requester;
use crate::services::quota::QuotaEnforcer;
use crate::tasks::DetachedTasks;
use crate::types::{DbId, Decimal};

/// Listing reads and writes: quota on create, visibility on read, cache
/// invalidation on every write.
#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn ListingStore>,
    cache: ListingCache,
    quota: QuotaEnforcer,
    tasks: DetachedTasks,
}

impl ListingService {
    pub fn new(
        store: Arc<dyn ListingStore>,
        cache: ListingCache,
        quota: QuotaEnforcer,
        tasks: DetachedTasks,
    ) -> Self {
        Self {
            store,
            cache,
            quota,
            tasks,
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Filtered, sorted, paginated search under the requester's visibility.
    pub async fn search(
        &self,
        filters: &ListingFilters,
        sort: Sort,
        pagination: Pagination,
        requester: &Requester,
    ) -> CoreResult<Page<Listing>> {
        let query = ListingQuery::compose(filters, sort, pagination, requester);
        if let Some(page) = self.cache.get_page(&query).await {
            return Ok(page);
        }

        let page = self.store.fetch_page(&query).await?;
        self.cache.put_page(&query, &page).await;
        Ok(page)
    }

    /// The dealer's own non-archived listings, drafts included.
    pub async fn dealer_listings(
        &self,
        dealer_id: DbId,
        pagination: Pagination,
    ) -> CoreResult<Page<Listing>> {
        let query = ListingQuery::owned_by(dealer_id, pagination);
        Ok(self.store.fetch_page(&query).await?)
    }

    /// Single-listing read through the cache.
    ///
    /// The view counter is bumped in a detached task after the response is
    /// produced; the returned listing does not include this read's view.
    pub async fn get(&self, id: DbId, requester: &Requester) -> CoreResult<Listing> {
        let listing = match self.cache.get_listing(id).await {
            Some(cached) => {
                authorize_read(&cached, requester)?;
                cached
            }
            None => {
                let listing = self
                    .store
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("Listing", id))?;
                authorize_read(&listing, requester)?;
                self.cache.put_listing(&listing).await;
                listing
            }
        };

        self.schedule_view_bump(id);
        Ok(listing)
    }

    fn schedule_view_bump(&self, id: DbId) {
        let store = Arc::clone(&self.store);
        let cache = self.cache.clone();
        self.tasks.spawn(async move {
            match store.increment_views(id).await {
                Ok(true) => cache.invalidate_listing(id).await,
                Ok(false) => {}
                Err(e) => tracing::debug!(listing_id = %id, error = %e, "View increment dropped"),
            }
        });
    }

    /// Wait for scheduled view bumps.
    pub async fn drain_background(&self) {
        self.tasks.drain().await;
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Create a draft listing once the quota check passes.
    pub async fn create(&self, dealer_id: DbId, input: &NewListing) -> CoreResult<Listing> {
        validate_numbers(
            Some(input.price),
            Some(input.size),
            input.bedrooms,
            input.bathrooms,
        )?;
        self.quota.check_can_create(dealer_id).await?;

        let listing = self.store.insert(dealer_id, input).await?;
        self.cache.invalidate_after_write(None).await;

        tracing::info!(listing_id = %listing.id, dealer_id = %dealer_id, "Listing created");
        Ok(listing)
    }

    /// Owner-only partial update. A status change must follow the lifecycle.
    pub async fn update(
        &self,
        id: DbId,
        dealer_id: DbId,
        patch: &ListingPatch,
    ) -> CoreResult<Listing> {
        validate_numbers(patch.price, patch.size, patch.bedrooms, patch.bathrooms)?;
        let current = self.owned_listing(id, dealer_id, "update").await?;

        if let Some(next) = patch.status {
            if next != current.status && !current.status.can_transition_to(next) {
                return Err(CoreError::Validation(format!(
                    "Cannot move listing from {} to {}",
                    current.status, next
                )));
            }
        }

        let updated = self
            .store
            .update(id, patch)
            .await?
            .ok_or_else(|| CoreError::not_found("Listing", id))?;
        self.cache.invalidate_after_write(Some(id)).await;
        Ok(updated)
    }

    /// Soft delete. Archiving an archived listing is a no-op.
    pub async fn archive(&self, id: DbId, dealer_id: DbId) -> CoreResult<()> {
        let current = self.owned_listing(id, dealer_id, "delete").await?;
        if current.status == ListingStatus::Archived {
            return Ok(());
        }

        if !self.store.set_status(id, ListingStatus::Archived).await? {
            return Err(CoreError::not_found("Listing", id));
        }
        self.cache.invalidate_after_write(Some(id)).await;

        tracing::info!(listing_id = %id, "Listing archived");
        Ok(())
    }

    async fn owned_listing(&self, id: DbId, dealer_id: DbId, action: &str) -> CoreResult<Listing> {
        let listing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Listing", id))?;
        if listing.dealer_id != dealer_id {
            return Err(CoreError::AccessDenied(format!(
                "You can only {action} your own listings"
            )));
        }
        Ok(listing)
    }
}

/// Drafts are owner-only; archived listings look absent to everyone else.
fn authorize_read(listing: &Listing, requester: &Requester) -> CoreResult<()> {
    if listing.is_visible_to(requester) {
        return Ok(());
    }
    match listing.status {
        ListingStatus::Archived => Err(CoreError::not_found("Listing", listing.id)),
        _ => Err(CoreError::AccessDenied(
            "This listing is not published".to_string(),
        )),
    }
}

fn validate_numbers(
    price: Option<Decimal>,
    size: Option<Decimal>,
    bedrooms: Option<i32>,
    bathrooms: Option<i32>,
) -> CoreResult<()> {
    if price.is_some_and(|p| p.is_sign_negative()) {
        return Err(CoreError::Validation("price must not be negative".into()));
    }
    if size.is_some_and(|s| s.is_sign_negative()) {
        return Err(CoreError::Validation("size must not be negative".into()));
    }
    if bedrooms.is_some_and(|n| n < 0) || bathrooms.is_some_and(|n| n < 0) {
        return Err(CoreError::Validation(
            "room counts must not be negative".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{listing_key, DEFAULT_TTL, LIST_KEY_PREFIX};
    use crate::roles::UserRole;
    use crate::subscription::{SubscriptionPlan, SubscriptionStatus};
    use crate::testing::{new_listing_input, sample_listing, InMemoryStore, MemoryCache};
    use crate::types::new_id;
    use assert_matches::assert_matches;

    struct Harness {
        store: Arc<InMemoryStore>,
        cache_store: Arc<MemoryCache>,
        service: ListingService,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let cache_store = Arc::new(MemoryCache::new());
        let cache = ListingCache::new(cache_store.clone(), DEFAULT_TTL);
        let quota = QuotaEnforcer::new(store.clone(), store.clone());
        let service = ListingService::new(store.clone(), cache, quota, DetachedTasks::new());
        Harness {
            store,
            cache_store,
            service,
        }
    }

    fn published(store: &InMemoryStore, dealer: DbId) -> Listing {
        let mut l = sample_listing(dealer);
        l.status = ListingStatus::Published;
        store.put_listing(l.clone());
        l
    }

    // -- create -------------------------------------------------------------

    #[tokio::test]
    async fn create_makes_a_draft_and_clears_cached_pages() {
        let h = harness();
        let dealer = new_id();
        h.store
            .seed_subscription(dealer, SubscriptionPlan::Basic, SubscriptionStatus::Active);
        h.cache_store.insert_raw("listings:stale", "{}");

        let listing = h.service.create(dealer, &new_listing_input()).await.unwrap();

        assert_eq!(listing.status, ListingStatus::Draft);
        assert_eq!(listing.views_count, 0);
        assert_eq!(listing.dealer_id, dealer);
        assert!(h.cache_store.keys_with_prefix(LIST_KEY_PREFIX).is_empty());
    }

    #[tokio::test]
    async fn create_without_subscription_is_rejected() {
        let h = harness();
        let err = h
            .service
            .create(new_id(), &new_listing_input())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SUBSCRIPTION_INACTIVE");
    }

    #[tokio::test]
    async fn create_rejects_negative_price() {
        let h = harness();
        let mut input = new_listing_input();
        input.price = Decimal::from(-1);
        let err = h.service.create(new_id(), &input).await.unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    // -- get ----------------------------------------------------------------

    #[tokio::test]
    async fn draft_is_readable_only_by_its_dealer() {
        let h = harness();
        let owner = new_id();
        let draft = sample_listing(owner);
        h.store.put_listing(draft.clone());

        let as_owner = h.service.get(draft.id, &Requester::dealer(owner)).await;
        assert!(as_owner.is_ok());

        // Now cached; the cached copy must not leak either.
        for requester in [
            Requester::anonymous(),
            Requester::dealer(new_id()),
            Requester::user(new_id(), UserRole::Admin),
        ] {
            let err = h.service.get(draft.id, &requester).await.unwrap_err();
            assert_matches!(err, CoreError::AccessDenied(_));
        }
    }

    #[tokio::test]
    async fn archived_listing_is_not_found_for_others() {
        let h = harness();
        let mut l = sample_listing(new_id());
        l.status = ListingStatus::Archived;
        h.store.put_listing(l.clone());

        let err = h.service.get(l.id, &Requester::anonymous()).await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { .. });
    }

    #[tokio::test]
    async fn missing_listing_is_not_found() {
        let h = harness();
        let err = h
            .service
            .get(new_id(), &Requester::anonymous())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "Listing", .. });
    }

    #[tokio::test]
    async fn cached_read_lags_the_store_by_one_view() {
        let h = harness();
        let l = published(&h.store, new_id());

        let first = h.service.get(l.id, &Requester::anonymous()).await.unwrap();
        h.service.drain_background().await;
        let stored = h.store.listing(l.id).unwrap();

        assert_eq!(first.views_count + 1, stored.views_count);
        assert_eq!(
            Listing {
                views_count: stored.views_count,
                ..first.clone()
            },
            stored
        );
        // The bump invalidated the entry so the next read sees the new count.
        assert!(h.cache_store.raw(&listing_key(l.id)).is_none());
        let second = h.service.get(l.id, &Requester::anonymous()).await.unwrap();
        assert_eq!(second.views_count, stored.views_count);
    }

    #[tokio::test]
    async fn cache_hit_is_served_without_the_store() {
        let h = harness();
        let l = published(&h.store, new_id());
        h.cache_store
            .insert_raw(&listing_key(l.id), &serde_json::to_string(&l).unwrap());

        h.store.set_failing(true);
        let got = h.service.get(l.id, &Requester::anonymous()).await.unwrap();
        h.service.drain_background().await;
        assert_eq!(got, l);
    }

    #[tokio::test]
    async fn reads_survive_an_unavailable_cache() {
        let h = harness();
        let l = published(&h.store, new_id());
        h.cache_store.set_unavailable(true);

        let got = h.service.get(l.id, &Requester::anonymous()).await.unwrap();
        h.service.drain_background().await;
        assert_eq!(got.id, l.id);
        assert_eq!(h.store.listing(l.id).unwrap().views_count, 1);
    }

    // -- search -------------------------------------------------------------

    #[tokio::test]
    async fn search_is_cached_per_signature_and_invalidated_by_writes() {
        let h = harness();
        let dealer = new_id();
        h.store
            .seed_subscription(dealer, SubscriptionPlan::Basic, SubscriptionStatus::Active);
        published(&h.store, dealer);

        let filters = ListingFilters::default();
        let page = h
            .service
            .search(&filters, Sort::default(), Pagination::default(), &Requester::anonymous())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(h.cache_store.keys_with_prefix(LIST_KEY_PREFIX).len(), 1);

        h.service.create(dealer, &new_listing_input()).await.unwrap();
        assert!(h.cache_store.keys_with_prefix(LIST_KEY_PREFIX).is_empty());
    }

    #[tokio::test]
    async fn dealer_search_includes_own_drafts_only() {
        let h = harness();
        let dealer = new_id();
        let other = new_id();
        published(&h.store, other);
        h.store.put_listing(sample_listing(dealer));
        h.store.put_listing(sample_listing(other));

        let page = h
            .service
            .search(
                &ListingFilters::default(),
                Sort::default(),
                Pagination::default(),
                &Requester::dealer(dealer),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert!(page
            .items
            .iter()
            .all(|l| l.status == ListingStatus::Published || l.dealer_id == dealer));
    }

    #[tokio::test]
    async fn search_surfaces_store_failure() {
        let h = harness();
        h.store.set_failing(true);
        let err = h
            .service
            .search(
                &ListingFilters::default(),
                Sort::default(),
                Pagination::default(),
                &Requester::anonymous(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_FAILURE");
    }

    // -- update / archive ---------------------------------------------------

    #[tokio::test]
    async fn update_enforces_ownership_and_lifecycle() {
        let h = harness();
        let owner = new_id();
        let l = published(&h.store, owner);

        let patch = ListingPatch {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        let err = h.service.update(l.id, new_id(), &patch).await.unwrap_err();
        assert_matches!(err, CoreError::AccessDenied(_));

        let back_to_draft = ListingPatch {
            status: Some(ListingStatus::Draft),
            ..Default::default()
        };
        let err = h
            .service
            .update(l.id, owner, &back_to_draft)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));

        let updated = h.service.update(l.id, owner, &patch).await.unwrap();
        assert_eq!(updated.title, "Renamed");
    }

    #[tokio::test]
    async fn publishing_a_draft_evicts_its_cache_entry() {
        let h = harness();
        let owner = new_id();
        let draft = sample_listing(owner);
        h.store.put_listing(draft.clone());
        h.cache_store
            .insert_raw(&listing_key(draft.id), &serde_json::to_string(&draft).unwrap());

        let patch = ListingPatch {
            status: Some(ListingStatus::Published),
            ..Default::default()
        };
        let updated = h.service.update(draft.id, owner, &patch).await.unwrap();
        assert_eq!(updated.status, ListingStatus::Published);
        assert!(h.cache_store.raw(&listing_key(draft.id)).is_none());
    }

    #[tokio::test]
    async fn archive_is_owner_only_and_idempotent() {
        let h = harness();
        let owner = new_id();
        let l = published(&h.store, owner);

        let err = h.service.archive(l.id, new_id()).await.unwrap_err();
        assert_matches!(err, CoreError::AccessDenied(_));

        h.service.archive(l.id, owner).await.unwrap();
        h.service.archive(l.id, owner).await.unwrap();
        assert_eq!(h.store.listing(l.id).unwrap().status, ListingStatus::Archived);

        let mine = h
            .service
            .dealer_listings(owner, Pagination::default())
            .await
            .unwrap();
        assert_eq!(mine.total, 0);
    }
}
