//! Subscription plans, lifecycle status, and the dashboard feature flags
//! derived from them.

use chrono::Months;
use serde::{Deserialize, Serialize};

use crate::listing::impl_text_enum;
use crate::types::{DbId, Decimal, Timestamp};

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    Basic,
    Premium,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Premium => "premium",
            Self::Enterprise => "enterprise",
        }
    }

    /// Maximum number of non-archived listings the plan allows.
    pub fn listing_limit(self) -> i32 {
        match self {
            Self::Basic => 5,
            Self::Premium => 25,
            Self::Enterprise => 100,
        }
    }

    /// Monthly price in major currency units.
    pub fn monthly_price(self) -> Decimal {
        match self {
            Self::Basic => Decimal::from(999),
            Self::Premium => Decimal::from(2999),
            Self::Enterprise => Decimal::from(9999),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Basic => "Basic Plan",
            Self::Premium => "Premium Plan",
            Self::Enterprise => "Enterprise Plan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    /// Map a billing-gateway subscription status onto the local lifecycle.
    /// Only the gateway's `active` stays active.
    pub fn from_external(status: &str) -> Self {
        if status == "active" {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

impl_text_enum!(SubscriptionPlan, "subscription plan", [Basic, Premium, Enterprise]);
impl_text_enum!(SubscriptionStatus, "subscription status", [Active, Inactive, Expired, Cancelled]);

/// Calendar-month expiry. Month-end dates clamp (Jan 31 -> Feb 28/29).
pub fn one_month_from(at: Timestamp) -> Timestamp {
    at.checked_add_months(Months::new(1)).unwrap_or(at)
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: DbId,
    pub user_id: DbId,
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub listing_limit: i32,
    pub external_subscription_id: Option<String>,
    pub external_customer_id: Option<String>,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscription {
    pub user_id: DbId,
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub listing_limit: i32,
    pub external_subscription_id: Option<String>,
    pub external_customer_id: Option<String>,
    pub expires_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Feature flags
// ---------------------------------------------------------------------------

/// Dashboard capabilities. Informational only; creation is gated by the
/// quota check, not by `can_post_listing`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeatureFlags {
    pub can_post_listing: bool,
    pub remaining_listings: i64,
    pub can_access_analytics: bool,
    pub can_export_leads: bool,
}

impl FeatureFlags {
    /// The all-false set given to non-dealers and dealers without an active plan.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn for_plan(plan: SubscriptionPlan, limit: i32, active_listings: i64) -> Self {
        let remaining = (i64::from(limit) - active_listings).max(0);
        Self {
            can_post_listing: remaining > 0,
            remaining_listings: remaining,
            can_access_analytics: plan != SubscriptionPlan::Basic,
            can_export_leads: plan == SubscriptionPlan::Enterprise,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn plan_table() {
        assert_eq!(SubscriptionPlan::Basic.listing_limit(), 5);
        assert_eq!(SubscriptionPlan::Premium.listing_limit(), 25);
        assert_eq!(SubscriptionPlan::Enterprise.listing_limit(), 100);
        assert_eq!(SubscriptionPlan::Premium.monthly_price(), Decimal::from(2999));
        assert_eq!("enterprise".parse(), Ok(SubscriptionPlan::Enterprise));
    }

    #[test]
    fn external_status_maps_to_active_or_inactive() {
        assert_eq!(SubscriptionStatus::from_external("active"), SubscriptionStatus::Active);
        assert_eq!(SubscriptionStatus::from_external("past_due"), SubscriptionStatus::Inactive);
        assert_eq!(SubscriptionStatus::from_external("canceled"), SubscriptionStatus::Inactive);
    }

    #[test]
    fn one_month_clamps_to_month_end() {
        let jan31 = chrono::Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        let feb28 = chrono::Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap();
        assert_eq!(one_month_from(jan31), feb28);
    }

    #[test]
    fn feature_flags_follow_plan_and_usage() {
        let basic = FeatureFlags::for_plan(SubscriptionPlan::Basic, 5, 2);
        assert!(basic.can_post_listing);
        assert_eq!(basic.remaining_listings, 3);
        assert!(!basic.can_access_analytics);
        assert!(!basic.can_export_leads);

        let full = FeatureFlags::for_plan(SubscriptionPlan::Enterprise, 100, 130);
        assert!(!full.can_post_listing);
        assert_eq!(full.remaining_listings, 0);
        assert!(full.can_access_analytics);
        assert!(full.can_export_leads);

        assert_eq!(FeatureFlags::none(), FeatureFlags::default());
    }
}
