use std::sync::Arc;

use chrono::Utc;

use crate::error::{CoreError, CoreResult};
use crate::ports::{BillingEvent, BillingGateway, SubscriptionStore};
use crate::subscription::{
    one_month_from, NewSubscription, Subscription, SubscriptionPlan, SubscriptionStatus,
};
use crate::types::DbId;

/// Input for subscribing a user to a plan.
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub user_id: DbId,
    pub email: String,
    pub plan: SubscriptionPlan,
    pub payment_method_id: String,
}

/// Outcome of applying one billing webhook.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    Applied(Subscription),
    /// No local subscription carries the event's billing id.
    Unmatched,
}

/// Local subscription state kept in step with the billing gateway.
#[derive(Clone)]
pub struct SubscriptionLifecycle {
    store: Arc<dyn SubscriptionStore>,
    billing: Arc<dyn BillingGateway>,
}

impl SubscriptionLifecycle {
    pub fn new(store: Arc<dyn SubscriptionStore>, billing: Arc<dyn BillingGateway>) -> Self {
        Self { store, billing }
    }

    /// Subscribe a user. Rejected while any subscription of theirs is active.
    pub async fn create(&self, input: &CreateSubscription) -> CoreResult<Subscription> {
        if self
            .store
            .find_active_for_user(input.user_id)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict {
                code: "SUBSCRIPTION_EXISTS",
                message: "User already has an active subscription".into(),
            });
        }

        let customer_id = self.resolve_customer(input).await?;
        let external = self
            .billing
            .create_subscription(&customer_id, input.plan)
            .await?;

        let subscription = self
            .store
            .insert(&NewSubscription {
                user_id: input.user_id,
                plan: input.plan,
                status: SubscriptionStatus::Active,
                listing_limit: input.plan.listing_limit(),
                external_subscription_id: Some(external.id),
                external_customer_id: Some(customer_id),
                expires_at: one_month_from(Utc::now()),
            })
            .await?;

        tracing::info!(
            subscription_id = %subscription.id,
            user_id = %subscription.user_id,
            plan = %subscription.plan,
            "Subscription created",
        );
        Ok(subscription)
    }

    /// Reuse the user's billing customer when it still exists upstream.
    async fn resolve_customer(&self, input: &CreateSubscription) -> CoreResult<String> {
        if let Some(existing) = self.store.find_customer_id(input.user_id).await? {
            if let Some(customer_id) = self.billing.retrieve_customer(&existing).await? {
                return Ok(customer_id);
            }
        }
        Ok(self
            .billing
            .create_customer(&input.email, &input.payment_method_id)
            .await?)
    }

    /// The user's current subscription (most recently created).
    pub async fn current(&self, user_id: DbId) -> CoreResult<Option<Subscription>> {
        Ok(self.store.latest_for_user(user_id).await?)
    }

    /// Cancel upstream, then mark the local record cancelled.
    pub async fn cancel(&self, id: DbId, user_id: DbId) -> CoreResult<Subscription> {
        let subscription = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Subscription", id))?;
        if subscription.user_id != user_id {
            return Err(CoreError::AccessDenied(
                "You can only cancel your own subscription".into(),
            ));
        }
        if !subscription.is_active() {
            return Err(CoreError::Conflict {
                code: "SUBSCRIPTION_NOT_ACTIVE",
                message: "Subscription is not active".into(),
            });
        }

        if let Some(external_id) = &subscription.external_subscription_id {
            self.billing.cancel_subscription(external_id).await?;
        }

        let cancelled = self
            .store
            .update_status(id, SubscriptionStatus::Cancelled)
            .await?
            .ok_or_else(|| CoreError::not_found("Subscription", id))?;
        tracing::info!(subscription_id = %id, "Subscription cancelled");
        Ok(cancelled)
    }

    /// Apply a verified billing webhook to the matching local record.
    pub async fn reconcile(&self, event: &BillingEvent) -> CoreResult<Reconciliation> {
        let (status, expires_at) = match event {
            BillingEvent::SubscriptionUpdated { status, .. } => {
                (SubscriptionStatus::from_external(status), None)
            }
            BillingEvent::SubscriptionDeleted { .. } => (SubscriptionStatus::Cancelled, None),
            BillingEvent::InvoicePaid { .. } => (
                SubscriptionStatus::Active,
                Some(one_month_from(Utc::now())),
            ),
            BillingEvent::InvoicePaymentFailed { .. } => (SubscriptionStatus::Inactive, None),
        };

        let external_id = event.subscription_id();
        match self
            .store
            .update_by_external_id(external_id, status, expires_at)
            .await?
        {
            Some(subscription) => {
                tracing::info!(
                    event = event.kind(),
                    subscription_id = %subscription.id,
                    status = %subscription.status,
                    "Billing event reconciled",
                );
                Ok(Reconciliation::Applied(subscription))
            }
            None => {
                tracing::warn!(
                    event = event.kind(),
                    external_id,
                    "Billing event for unknown subscription ignored",
                );
                Ok(Reconciliation::Unmatched)
            }
        }
    }
}
