//! Well-known role names and the requester identity passed into services.
//!
//! Role strings must match the `role` claim issued by the identity provider.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_DEALER: &str = "dealer";
pub const ROLE_GUEST: &str = "guest";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Dealer,
    Guest,
}

impl UserRole {
    /// Parse a role claim. Unknown roles degrade to `Guest`.
    pub fn from_claim(role: &str) -> Self {
        match role {
            ROLE_ADMIN => Self::Admin,
            ROLE_DEALER => Self::Dealer,
            _ => Self::Guest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::Dealer => ROLE_DEALER,
            Self::Guest => ROLE_GUEST,
        }
    }
}

/// Who is asking. Anonymous callers have no `user_id` and the guest role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub user_id: Option<DbId>,
    pub role: UserRole,
}

impl Requester {
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            role: UserRole::Guest,
        }
    }

    pub fn user(user_id: DbId, role: UserRole) -> Self {
        Self {
            user_id: Some(user_id),
            role,
        }
    }

    pub fn dealer(user_id: DbId) -> Self {
        Self::user(user_id, UserRole::Dealer)
    }

    /// The dealer id, if the requester is an authenticated dealer.
    pub fn dealer_id(&self) -> Option<DbId> {
        match self.role {
            UserRole::Dealer => self.user_id,
            _ => None,
        }
    }
}
