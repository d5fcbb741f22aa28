//! Domain services. Each is built from explicitly injected ports and holds
//! no global state.

pub mod leads;
pub mod listings;
pub mod quota;
pub mod search;
pub mod subscriptions;

pub use leads::LeadService;
pub use listings::ListingService;
pub use quota::QuotaEnforcer;
pub use search::{NaturalLanguageSearch, SearchOutcome};
pub use subscriptions::{CreateSubscription, Reconciliation, SubscriptionLifecycle};
