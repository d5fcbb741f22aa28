use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::lead::{
    group_by_listing, Lead, LeadAnalytics, NewLead, LEAD_STATUS_CONTACTED, LEAD_STATUS_CONVERTED,
    LEAD_STATUS_NEW,
};
use crate::ports::{LeadStore, ListingStore};
use crate::query::{Page, Pagination};
use crate::types::DbId;

#[derive(Clone)]
pub struct LeadService {
    leads: Arc<dyn LeadStore>,
    listings: Arc<dyn ListingStore>,
}

impl LeadService {
    pub fn new(leads: Arc<dyn LeadStore>, listings: Arc<dyn ListingStore>) -> Self {
        Self { leads, listings }
    }

    /// Record an inquiry. The dealer reference is copied from the listing
    /// now and never re-derived.
    pub async fn create(&self, input: &NewLead) -> CoreResult<Lead> {
        let listing = self
            .listings
            .find_by_id(input.listing_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Listing", input.listing_id))?;

        let lead = self.leads.insert(listing.dealer_id, input).await?;
        tracing::info!(
            lead_id = %lead.id,
            listing_id = %lead.listing_id,
            dealer_id = %lead.dealer_id,
            "Lead created",
        );
        Ok(lead)
    }

    pub async fn list(
        &self,
        dealer_id: DbId,
        listing_id: Option<DbId>,
        pagination: Pagination,
    ) -> CoreResult<Page<Lead>> {
        Ok(self
            .leads
            .list_for_dealer(dealer_id, listing_id, pagination)
            .await?)
    }

    /// Owner-only status change. Any non-blank status is accepted.
    pub async fn update_status(&self, id: DbId, dealer_id: DbId, status: &str) -> CoreResult<Lead> {
        let status = status.trim();
        if status.is_empty() {
            return Err(CoreError::Validation("status must not be empty".into()));
        }

        let lead = self
            .leads
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Lead", id))?;
        if lead.dealer_id != dealer_id {
            return Err(CoreError::AccessDenied(
                "You can only update your own leads".into(),
            ));
        }

        self.leads
            .update_status(id, status)
            .await?
            .ok_or_else(|| CoreError::not_found("Lead", id))
    }

    /// Dashboard counts plus a per-listing breakdown grouped in memory.
    pub async fn analytics(&self, dealer_id: DbId) -> CoreResult<LeadAnalytics> {
        let total_leads = self.leads.count_for_dealer(dealer_id, None).await?;
        let new_leads = self
            .leads
            .count_for_dealer(dealer_id, Some(LEAD_STATUS_NEW))
            .await?;
        let contacted_leads = self
            .leads
            .count_for_dealer(dealer_id, Some(LEAD_STATUS_CONTACTED))
            .await?;
        let converted_leads = self
            .leads
            .count_for_dealer(dealer_id, Some(LEAD_STATUS_CONVERTED))
            .await?;
        let refs = self.leads.listing_refs_for_dealer(dealer_id).await?;

        Ok(LeadAnalytics {
            total_leads,
            new_leads,
            contacted_leads,
            converted_leads,
            leads_by_listing: group_by_listing(&refs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::{ListingLeadCount, LEAD_STATUS_CLOSED};
    use crate::testing::{sample_listing, InMemoryStore};
    use crate::types::new_id;
    use assert_matches::assert_matches;

    fn service(store: &Arc<InMemoryStore>) -> LeadService {
        LeadService::new(store.clone(), store.clone())
    }

    fn inquiry(listing_id: DbId) -> NewLead {
        NewLead {
            listing_id,
            name: "Asha".into(),
            email: "asha@example.com".into(),
            phone: "+91 98200 00000".into(),
            message: Some("Is parking included?".into()),
        }
    }

    #[tokio::test]
    async fn lead_copies_the_dealer_from_the_listing() {
        let store = Arc::new(InMemoryStore::new());
        let dealer = new_id();
        let listing = sample_listing(dealer);
        store.put_listing(listing.clone());

        let lead = service(&store).create(&inquiry(listing.id)).await.unwrap();
        assert_eq!(lead.dealer_id, dealer);
        assert_eq!(lead.status, LEAD_STATUS_NEW);

        // A later change to the listing row does not move the lead.
        let mut moved = listing.clone();
        moved.dealer_id = new_id();
        store.put_listing(moved);
        let page = service(&store)
            .list(dealer, None, Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].dealer_id, dealer);
    }

    #[tokio::test]
    async fn lead_for_unknown_listing_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let err = service(&store).create(&inquiry(new_id())).await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "Listing", .. });
    }

    #[tokio::test]
    async fn list_filters_by_listing() {
        let store = Arc::new(InMemoryStore::new());
        let dealer = new_id();
        let a = sample_listing(dealer);
        let b = sample_listing(dealer);
        store.put_listing(a.clone());
        store.put_listing(b.clone());
        let svc = service(&store);
        svc.create(&inquiry(a.id)).await.unwrap();
        svc.create(&inquiry(b.id)).await.unwrap();
        svc.create(&inquiry(b.id)).await.unwrap();

        let only_b = svc
            .list(dealer, Some(b.id), Pagination::default())
            .await
            .unwrap();
        assert_eq!(only_b.total, 2);
        assert!(only_b.items.iter().all(|l| l.listing_id == b.id));

        let nobody = svc.list(new_id(), None, Pagination::default()).await.unwrap();
        assert_eq!(nobody.total, 0);
    }

    #[tokio::test]
    async fn only_the_owning_dealer_updates_status() {
        let store = Arc::new(InMemoryStore::new());
        let dealer = new_id();
        let listing = sample_listing(dealer);
        store.put_listing(listing.clone());
        let svc = service(&store);
        let lead = svc.create(&inquiry(listing.id)).await.unwrap();

        let err = svc
            .update_status(lead.id, new_id(), LEAD_STATUS_CONTACTED)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::AccessDenied(_));

        // No transition graph: jumping straight to closed, or to an
        // unlisted value, is accepted.
        let closed = svc
            .update_status(lead.id, dealer, LEAD_STATUS_CLOSED)
            .await
            .unwrap();
        assert_eq!(closed.status, LEAD_STATUS_CLOSED);
        let custom = svc.update_status(lead.id, dealer, "follow_up").await.unwrap();
        assert_eq!(custom.status, "follow_up");

        let err = svc.update_status(new_id(), dealer, "new").await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "Lead", .. });
    }

    #[tokio::test]
    async fn analytics_counts_and_groups() {
        let store = Arc::new(InMemoryStore::new());
        let dealer = new_id();
        let a = sample_listing(dealer);
        let b = sample_listing(dealer);
        store.put_listing(a.clone());
        store.put_listing(b.clone());
        let svc = service(&store);

        let l1 = svc.create(&inquiry(a.id)).await.unwrap();
        let l2 = svc.create(&inquiry(b.id)).await.unwrap();
        svc.create(&inquiry(b.id)).await.unwrap();
        svc.update_status(l1.id, dealer, LEAD_STATUS_CONTACTED)
            .await
            .unwrap();
        svc.update_status(l2.id, dealer, LEAD_STATUS_CONVERTED)
            .await
            .unwrap();

        let analytics = svc.analytics(dealer).await.unwrap();
        assert_eq!(analytics.total_leads, 3);
        assert_eq!(analytics.new_leads, 1);
        assert_eq!(analytics.contacted_leads, 1);
        assert_eq!(analytics.converted_leads, 1);
        assert_eq!(
            analytics.leads_by_listing[0],
            ListingLeadCount {
                listing_id: b.id,
                count: 2
            }
        );
        assert_eq!(analytics.leads_by_listing.len(), 2);
    }
}
