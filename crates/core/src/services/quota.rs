use std::sync::Arc;

use crate::error::{CoreError, CoreResult, QuotaRejection};
use crate::ports::{ListingStore, SubscriptionStore};
use crate::roles::Requester;
use crate::subscription::{FeatureFlags, Subscription};
use crate::types::DbId;

/// Subscription-gated listing quota.
///
/// The check is read-then-act with no lock: concurrent creations by the same
/// dealer can each pass the count and overshoot the limit by the number of
/// racing requests. Listing creation is human-paced, so this is accepted.
#[derive(Clone)]
pub struct QuotaEnforcer {
    subscriptions: Arc<dyn SubscriptionStore>,
    listings: Arc<dyn ListingStore>,
}

impl QuotaEnforcer {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>, listings: Arc<dyn ListingStore>) -> Self {
        Self {
            subscriptions,
            listings,
        }
    }

    /// Returns the dealer's current subscription when one more listing fits.
    pub async fn check_can_create(&self, dealer_id: DbId) -> CoreResult<Subscription> {
        let subscription = match self.subscriptions.latest_for_user(dealer_id).await? {
            Some(s) if s.is_active() => s,
            _ => return Err(CoreError::QuotaExceeded(QuotaRejection::SubscriptionInactive)),
        };

        let active = self.listings.count_active_for_dealer(dealer_id).await?;
        if active >= i64::from(subscription.listing_limit) {
            tracing::info!(
                dealer_id = %dealer_id,
                active,
                limit = subscription.listing_limit,
                "Listing quota reached",
            );
            return Err(CoreError::QuotaExceeded(QuotaRejection::LimitReached {
                limit: subscription.listing_limit,
            }));
        }

        Ok(subscription)
    }

    /// Dashboard flags. Non-dealers and dealers without an active
    /// subscription get the all-false set.
    pub async fn feature_flags(&self, requester: &Requester) -> CoreResult<FeatureFlags> {
        let Some(dealer_id) = requester.dealer_id() else {
            return Ok(FeatureFlags::none());
        };
        let subscription = match self.subscriptions.latest_for_user(dealer_id).await? {
            Some(s) if s.is_active() => s,
            _ => return Ok(FeatureFlags::none()),
        };
        let active = self.listings.count_active_for_dealer(dealer_id).await?;
        Ok(FeatureFlags::for_plan(
            subscription.plan,
            subscription.listing_limit,
            active,
        ))
    }
}
