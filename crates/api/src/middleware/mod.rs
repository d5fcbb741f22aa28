//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the authenticated user from a JWT Bearer token.
//! - [`auth::MaybeAuthUser`] -- the same, but anonymous callers pass through.
//! - [`rbac::RequireDealer`] -- requires the `dealer` role.

pub mod auth;
pub mod rbac;
