use serde::Serialize;

use crate::error::CoreResult;
use crate::filter::ListingFilters;
use crate::listing::Listing;
use crate::query::{Pagination, Sort};
use crate::roles::Requester;
use crate::services::listings::ListingService;
use crate::translator::{summarize, FilterTranslator, TranslationSource, SHOWN_RESULTS};

/// Rows fetched for a natural-language search; the summary is computed over
/// these and the first [`SHOWN_RESULTS`] are returned.
const FETCH_LIMIT: i64 = 20;

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub summary: String,
    pub listings: Vec<Listing>,
    pub suggested_filters: ListingFilters,
    pub total_results: i64,
    pub intent: Option<String>,
    pub source: TranslationSource,
}

/// Free-text search: translate, run as a public (published-only) query,
/// summarise.
#[derive(Clone)]
pub struct NaturalLanguageSearch {
    translator: FilterTranslator,
    listings: ListingService,
}

impl NaturalLanguageSearch {
    pub fn new(translator: FilterTranslator, listings: ListingService) -> Self {
        Self {
            translator,
            listings,
        }
    }

    pub async fn search(
        &self,
        query: &str,
        context: Option<&serde_json::Value>,
    ) -> CoreResult<SearchOutcome> {
        let translation = self.translator.translate(query, context).await;
        let page = self
            .listings
            .search(
                &translation.filters,
                Sort::default(),
                Pagination::new(Some(1), Some(FETCH_LIMIT)),
                &Requester::anonymous(),
            )
            .await?;

        let summary = summarize(query, &page.items, page.total);
        tracing::debug!(
            query,
            source = ?translation.source,
            total = page.total,
            "Natural-language search",
        );

        Ok(SearchOutcome {
            summary,
            listings: page.items.into_iter().take(SHOWN_RESULTS).collect(),
            suggested_filters: translation.filters,
            total_results: page.total,
            intent: translation.intent,
            source: translation.source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ListingCache;
    use crate::listing::{ListingStatus, PropertyType};
    use crate::services::quota::QuotaEnforcer;
    use crate::tasks::DetachedTasks;
    use crate::testing::{sample_listing, InMemoryStore};
    use crate::types::{new_id, Decimal};
    use std::sync::Arc;

    fn search_over(store: &Arc<InMemoryStore>) -> NaturalLanguageSearch {
        let listings = ListingService::new(
            store.clone(),
            ListingCache::disabled(),
            QuotaEnforcer::new(store.clone(), store.clone()),
            DetachedTasks::new(),
        );
        NaturalLanguageSearch::new(FilterTranslator::local_only(), listings)
    }

    #[tokio::test]
    async fn returns_top_ten_of_a_larger_match() {
        let store = Arc::new(InMemoryStore::new());
        let dealer = new_id();
        for _ in 0..25 {
            let mut l = sample_listing(dealer);
            l.status = ListingStatus::Published;
            l.city = "Mumbai".into();
            l.property_type = PropertyType::Apartment;
            l.bedrooms = Some(3);
            l.price = Decimal::from(6_000_000);
            store.put_listing(l);
        }

        let outcome = search_over(&store)
            .search("3 BHK apartment in Mumbai under 80 lakhs", None)
            .await
            .unwrap();

        assert_eq!(outcome.total_results, 25);
        assert_eq!(outcome.listings.len(), 10);
        assert_eq!(outcome.source, TranslationSource::Local);
        assert_eq!(
            outcome.summary,
            "Found 25 properties with an average price of ₹60 lakhs in Mumbai. Showing top 10 results."
        );
    }

    #[tokio::test]
    async fn drafts_never_appear_in_free_text_search() {
        let store = Arc::new(InMemoryStore::new());
        let mut draft = sample_listing(new_id());
        draft.city = "Pune".into();
        store.put_listing(draft);

        let outcome = search_over(&store).search("pune", None).await.unwrap();
        assert_eq!(outcome.total_results, 0);
        assert!(outcome.summary.starts_with("No properties found"));
    }
}
