//! Query composition: predicates + mandatory visibility + sort + pagination.
//!
//! [`ListingQuery`] is the single value handed to the listing store. It is
//! also what the list cache keys on, via [`ListingQuery::signature`].

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::filter::{matches_all, ListingFilters, Predicate};
use crate::listing::{Listing, ListingStatus};
use crate::roles::Requester;
use crate::types::DbId;

/// Default page size for listing and lead queries.
pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Maximum page size for listing and lead queries.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// 1-based page number plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Build from raw request values: page floors at 1, limit is clamped to
    /// `1..=MAX_PAGE_LIMIT` and defaults to [`DEFAULT_PAGE_LIMIT`].
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: clamp_limit(limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
        }
    }

    /// Rows to skip. Saturates, so absurd page numbers yield an empty page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the size of the full filtered set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64) -> Self {
        Self { items, total }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    /// Slice an already filtered and ordered collection.
    pub fn slice(all: Vec<T>, pagination: Pagination) -> Self {
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(usize::try_from(pagination.offset()).unwrap_or(usize::MAX))
            .take(pagination.limit as usize)
            .collect();
        Self { items, total }
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Price,
    Size,
    #[default]
    CreatedAt,
}

impl SortKey {
    pub fn column(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Size => "size",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sort order; defaults to newest first. Ties break on id in the same
/// direction so pages are stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(key: Option<SortKey>, direction: Option<SortDirection>) -> Self {
        Self {
            key: key.unwrap_or_default(),
            direction: direction.unwrap_or_default(),
        }
    }

    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let primary = match self.key {
            SortKey::Price => a.price.cmp(&b.price),
            SortKey::Size => a.size.cmp(&b.size),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        let ordering = primary.then_with(|| a.id.cmp(&b.id));
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// Mandatory row-level rule applied on top of every filter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Guests, admins, anonymous callers.
    Published,
    /// A dealer browsing: everything published plus their own drafts.
    PublishedOrDraftsOf(DbId),
    /// A dealer's own dashboard: their non-archived listings.
    OwnedBy(DbId),
}

impl Visibility {
    pub fn for_requester(requester: &Requester) -> Self {
        match requester.dealer_id() {
            Some(dealer_id) => Self::PublishedOrDraftsOf(dealer_id),
            None => Self::Published,
        }
    }

    pub fn permits(&self, listing: &Listing) -> bool {
        match self {
            Self::Published => listing.status == ListingStatus::Published,
            Self::PublishedOrDraftsOf(dealer_id) => {
                listing.status == ListingStatus::Published
                    || (listing.status == ListingStatus::Draft && listing.dealer_id == *dealer_id)
            }
            Self::OwnedBy(dealer_id) => {
                listing.dealer_id == *dealer_id && listing.status.counts_toward_quota()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Composed query
// ---------------------------------------------------------------------------

/// A fully composed, store-ready listing read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingQuery {
    pub predicates: Vec<Predicate>,
    pub visibility: Visibility,
    pub sort: Sort,
    pub pagination: Pagination,
}

impl ListingQuery {
    /// Public search: the caller's filters AND the requester's visibility rule.
    pub fn compose(
        filters: &ListingFilters,
        sort: Sort,
        pagination: Pagination,
        requester: &Requester,
    ) -> Self {
        Self {
            predicates: filters.predicates(),
            visibility: Visibility::for_requester(requester),
            sort,
            pagination,
        }
    }

    /// A dealer's own non-archived listings, newest first.
    pub fn owned_by(dealer_id: DbId, pagination: Pagination) -> Self {
        Self {
            predicates: Vec::new(),
            visibility: Visibility::OwnedBy(dealer_id),
            sort: Sort::default(),
            pagination,
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        self.visibility.permits(listing) && matches_all(&self.predicates, listing)
    }

    /// Evaluate the query against an in-memory collection.
    pub fn apply<'a>(&self, listings: impl IntoIterator<Item = &'a Listing>) -> Page<Listing> {
        let mut selected: Vec<Listing> = listings
            .into_iter()
            .filter(|l| self.matches(l))
            .cloned()
            .collect();
        selected.sort_by(|a, b| self.sort.compare(a, b));
        Page::slice(selected, self.pagination)
    }

    /// Stable key for this exact read (filters, visibility, sort and page).
    pub fn signature(&self) -> String {
        let canonical =
            serde_json::to_vec(self).unwrap_or_else(|_| format!("{self:?}").into_bytes());
        let digest = Sha256::digest(&canonical);
        format!("{digest:x}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{PropertyType, SizeUnit};
    use crate::roles::{Requester, UserRole};
    use crate::types::{new_id, Decimal};

    fn listing(dealer_id: DbId, status: ListingStatus, price: i64) -> Listing {
        let now = chrono::Utc::now();
        Listing {
            id: new_id(),
            dealer_id,
            title: "Plot".into(),
            description: String::new(),
            price: Decimal::from(price),
            location: String::new(),
            city: "Jaipur".into(),
            state: "Rajasthan".into(),
            postal_code: "302001".into(),
            latitude: None,
            longitude: None,
            size: Decimal::from(price / 10),
            size_unit: SizeUnit::Sqft,
            bedrooms: None,
            bathrooms: None,
            property_type: PropertyType::Plot,
            amenities: vec![],
            status,
            views_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn pagination_clamps_and_computes_offset() {
        assert_eq!(Pagination::new(None, None), Pagination { page: 1, limit: 20 });
        assert_eq!(Pagination::new(Some(0), Some(500)), Pagination { page: 1, limit: 100 });
        assert_eq!(Pagination::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn huge_page_numbers_saturate_to_an_empty_page() {
        let pagination = Pagination::new(Some(i64::MAX), Some(20));
        assert_eq!(pagination.offset(), i64::MAX);

        let page = Page::slice(vec![1, 2, 3], pagination);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn drafts_are_hidden_from_everyone_but_their_dealer() {
        let owner = new_id();
        let other_dealer = new_id();
        let draft = listing(owner, ListingStatus::Draft, 100);

        let requesters = [
            Requester::anonymous(),
            Requester::dealer(other_dealer),
            Requester::user(owner, UserRole::Admin),
            Requester::user(other_dealer, UserRole::Guest),
        ];
        for requester in requesters {
            assert!(
                !Visibility::for_requester(&requester).permits(&draft),
                "{requester:?} must not see the draft"
            );
        }
        assert!(Visibility::for_requester(&Requester::dealer(owner)).permits(&draft));
    }

    #[test]
    fn archived_listings_are_never_searchable() {
        let owner = new_id();
        let archived = listing(owner, ListingStatus::Archived, 100);
        assert!(!Visibility::Published.permits(&archived));
        assert!(!Visibility::PublishedOrDraftsOf(owner).permits(&archived));
        assert!(!Visibility::OwnedBy(owner).permits(&archived));
    }

    #[test]
    fn apply_sorts_pages_and_counts_the_full_set() {
        let dealer = new_id();
        let listings: Vec<_> = (1..=5)
            .map(|i| listing(dealer, ListingStatus::Published, i * 100))
            .collect();
        let query = ListingQuery::compose(
            &ListingFilters::default(),
            Sort::new(Some(SortKey::Price), Some(SortDirection::Asc)),
            Pagination::new(Some(2), Some(2)),
            &Requester::anonymous(),
        );

        let page = query.apply(&listings);
        assert_eq!(page.total, 5);
        let prices: Vec<_> = page.items.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![Decimal::from(300), Decimal::from(400)]);
    }

    #[test]
    fn signature_depends_on_requester_visibility() {
        let filters = ListingFilters {
            city: Some("Jaipur".into()),
            ..Default::default()
        };
        let guest = ListingQuery::compose(
            &filters,
            Sort::default(),
            Pagination::default(),
            &Requester::anonymous(),
        );
        let dealer = ListingQuery::compose(
            &filters,
            Sort::default(),
            Pagination::default(),
            &Requester::dealer(new_id()),
        );
        assert_eq!(guest.signature(), guest.clone().signature());
        assert_ne!(guest.signature(), dealer.signature());
        assert_eq!(guest.signature().len(), 64);
    }
}
