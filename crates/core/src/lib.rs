//! Marketplace core: listings, search, quota, leads and subscriptions.
//!
//! Services in [`services`] are constructed from the collaborator ports in
//! [`ports`]; this crate performs no I/O of its own.

pub mod cache;
pub mod error;
pub mod filter;
pub mod lead;
pub mod listing;
pub mod ports;
pub mod query;
pub mod roles;
pub mod services;
pub mod subscription;
pub mod tasks;
pub mod translator;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
