//! Row structs for the `listings`, `subscriptions` and `leads` tables.
//!
//! Enum columns are stored as TEXT and parsed into `estate-core` types when
//! a row is converted into its domain value.

pub mod lead;
pub mod listing;
pub mod subscription;
