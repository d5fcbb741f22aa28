//! Stripe REST client implementing [`BillingGateway`].
//!
//! Requests are form-encoded and authenticated with the secret key as a
//! bearer token. Plans are billed with inline `price_data` so no products
//! have to be provisioned on the Stripe side.

use async_trait::async_trait;
use estate_core::error::UpstreamError;
use estate_core::ports::{BillingGateway, BillingSubscription, PortResult};
use estate_core::subscription::SubscriptionPlan;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

/// Default Stripe API origin.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Default billing currency.
pub const DEFAULT_CURRENCY: &str = "inr";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    /// Signing secret for incoming webhooks (`whsec_...`).
    pub webhook_secret: String,
    pub api_base: String,
    pub currency: String,
}

impl StripeConfig {
    /// Load Stripe configuration from environment variables.
    ///
    /// | Env Var                 | Required | Default                  |
    /// |-------------------------|----------|--------------------------|
    /// | `STRIPE_SECRET_KEY`     | **yes**  | --                       |
    /// | `STRIPE_WEBHOOK_SECRET` | **yes**  | --                       |
    /// | `STRIPE_API_BASE`       | no       | `https://api.stripe.com` |
    /// | `BILLING_CURRENCY`      | no       | `inr`                    |
    ///
    /// # Panics
    ///
    /// Panics if either secret is missing or empty.
    pub fn from_env() -> Self {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .expect("STRIPE_SECRET_KEY must be set in the environment");
        assert!(!secret_key.is_empty(), "STRIPE_SECRET_KEY must not be empty");

        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .expect("STRIPE_WEBHOOK_SECRET must be set in the environment");
        assert!(
            !webhook_secret.is_empty(),
            "STRIPE_WEBHOOK_SECRET must not be empty"
        );

        let api_base = std::env::var("STRIPE_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.into())
            .trim_end_matches('/')
            .to_string();

        let currency = std::env::var("BILLING_CURRENCY")
            .unwrap_or_else(|_| DEFAULT_CURRENCY.into())
            .to_lowercase();

        Self {
            secret_key,
            webhook_secret,
            api_base,
            currency,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StripeApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Stripe returned a non-2xx status code.
    #[error("Stripe API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl From<StripeApiError> for UpstreamError {
    fn from(err: StripeApiError) -> Self {
        UpstreamError::billing(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CustomerObject {
    id: String,
    #[serde(default)]
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct SubscriptionObject {
    id: String,
    status: String,
}

/// Price in the currency's minor unit, as Stripe's `unit_amount` expects.
pub fn unit_amount(plan: SubscriptionPlan) -> i64 {
    (plan.monthly_price() * rust_decimal::Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct StripeClient {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.config.api_base)
    }

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StripeApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StripeApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StripeApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn fetch_customer(&self, customer_id: &str) -> Result<Option<String>, StripeApiError> {
        let response = self
            .client
            .get(self.url(&format!("customers/{customer_id}")))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let customer: CustomerObject = Self::parse_response(response).await?;
        Ok((!customer.deleted).then_some(customer.id))
    }

    async fn post_customer(
        &self,
        email: &str,
        payment_method_id: &str,
    ) -> Result<String, StripeApiError> {
        let form = [
            ("email", email),
            ("payment_method", payment_method_id),
            ("invoice_settings[default_payment_method]", payment_method_id),
        ];
        let response = self
            .client
            .post(self.url("customers"))
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await?;

        let customer: CustomerObject = Self::parse_response(response).await?;
        Ok(customer.id)
    }

    async fn post_subscription(
        &self,
        customer_id: &str,
        plan: SubscriptionPlan,
    ) -> Result<SubscriptionObject, StripeApiError> {
        let amount = unit_amount(plan).to_string();
        let form = [
            ("customer", customer_id),
            ("items[0][price_data][currency]", self.config.currency.as_str()),
            ("items[0][price_data][product_data][name]", plan.display_name()),
            ("items[0][price_data][unit_amount]", amount.as_str()),
            ("items[0][price_data][recurring][interval]", "month"),
            ("payment_behavior", "default_incomplete"),
            ("expand[]", "latest_invoice.payment_intent"),
        ];
        let response = self
            .client
            .post(self.url("subscriptions"))
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn delete_subscription(&self, subscription_id: &str) -> Result<(), StripeApiError> {
        let response = self
            .client
            .delete(self.url(&format!("subscriptions/{subscription_id}")))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl BillingGateway for StripeClient {
    async fn retrieve_customer(&self, customer_id: &str) -> PortResult<Option<String>> {
        Ok(self.fetch_customer(customer_id).await?)
    }

    async fn create_customer(&self, email: &str, payment_method_id: &str) -> PortResult<String> {
        let id = self.post_customer(email, payment_method_id).await?;
        tracing::info!(customer_id = %id, "Stripe customer created");
        Ok(id)
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        plan: SubscriptionPlan,
    ) -> PortResult<BillingSubscription> {
        let sub = self.post_subscription(customer_id, plan).await?;
        tracing::info!(
            subscription_id = %sub.id,
            status = %sub.status,
            plan = plan.as_str(),
            "Stripe subscription created",
        );
        Ok(BillingSubscription {
            id: sub.id,
            status: sub.status,
        })
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> PortResult<()> {
        self.delete_subscription(subscription_id).await?;
        Ok(())
    }
}
