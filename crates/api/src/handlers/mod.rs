pub mod account;
pub mod leads;
pub mod listings;
pub mod search;
pub mod subscriptions;
