//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod lead_repo;
pub mod listing_repo;
pub mod subscription_repo;

pub use lead_repo::LeadRepo;
pub use listing_repo::ListingRepo;
pub use subscription_repo::SubscriptionRepo;
