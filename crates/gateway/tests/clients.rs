//! HTTP-level tests for the Stripe and NLP clients against a mock server.

use std::time::Duration;

use estate_core::listing::PropertyType;
use estate_core::ports::{BillingGateway, NlpService};
use estate_core::subscription::SubscriptionPlan;
use estate_core::types::Decimal;
use estate_gateway::nlp::{NlpClient, NlpConfig};
use estate_gateway::stripe::{StripeClient, StripeConfig};
use httpmock::prelude::*;
use serde_json::json;

fn stripe(server: &MockServer) -> StripeClient {
    StripeClient::new(StripeConfig {
        secret_key: "sk_test_123".into(),
        webhook_secret: "whsec_test".into(),
        api_base: server.base_url(),
        currency: "inr".into(),
    })
}

fn nlp(server: &MockServer, timeout: Duration) -> NlpClient {
    NlpClient::new(NlpConfig {
        base_url: server.base_url(),
        api_key: Some("nlp-key".into()),
        timeout,
    })
}

// ---------------------------------------------------------------------------
// Stripe
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_customer_posts_form_with_bearer_key() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/customers")
                .header("authorization", "Bearer sk_test_123")
                .x_www_form_urlencoded_tuple("email", "dealer@example.com")
                .x_www_form_urlencoded_tuple("payment_method", "pm_card_visa")
                .x_www_form_urlencoded_tuple(
                    "invoice_settings[default_payment_method]",
                    "pm_card_visa",
                );
            then.status(200).json_body(json!({ "id": "cus_42", "object": "customer" }));
        })
        .await;

    let id = stripe(&server)
        .create_customer("dealer@example.com", "pm_card_visa")
        .await
        .unwrap();

    assert_eq!(id, "cus_42");
    mock.assert_async().await;
}

#[tokio::test]
async fn create_subscription_sends_monthly_price_data() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/subscriptions")
                .x_www_form_urlencoded_tuple("customer", "cus_42")
                .x_www_form_urlencoded_tuple("items[0][price_data][currency]", "inr")
                .x_www_form_urlencoded_tuple("items[0][price_data][unit_amount]", "299900")
                .x_www_form_urlencoded_tuple("items[0][price_data][recurring][interval]", "month");
            then.status(200)
                .json_body(json!({ "id": "sub_9", "status": "incomplete" }));
        })
        .await;

    let sub = stripe(&server)
        .create_subscription("cus_42", SubscriptionPlan::Premium)
        .await
        .unwrap();

    assert_eq!(sub.id, "sub_9");
    assert_eq!(sub.status, "incomplete");
    mock.assert_async().await;
}

#[tokio::test]
async fn retrieve_customer_treats_missing_and_deleted_as_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/customers/cus_live");
            then.status(200).json_body(json!({ "id": "cus_live" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/customers/cus_gone");
            then.status(200)
                .json_body(json!({ "id": "cus_gone", "deleted": true }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/customers/cus_never");
            then.status(404)
                .json_body(json!({ "error": { "code": "resource_missing" } }));
        })
        .await;

    let client = stripe(&server);
    assert_eq!(
        client.retrieve_customer("cus_live").await.unwrap().as_deref(),
        Some("cus_live")
    );
    assert_eq!(client.retrieve_customer("cus_gone").await.unwrap(), None);
    assert_eq!(client.retrieve_customer("cus_never").await.unwrap(), None);
}

#[tokio::test]
async fn cancel_failure_surfaces_as_billing_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v1/subscriptions/sub_1");
            then.status(500).body("stripe is down");
        })
        .await;

    let err = stripe(&server).cancel_subscription("sub_1").await.unwrap_err();

    assert_eq!(err.backend, "billing");
    assert!(err.message.contains("500"));
}

// ---------------------------------------------------------------------------
// NLP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn parse_query_posts_query_and_context() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/parse-query")
                .header("authorization", "Bearer nlp-key")
                .json_body(json!({ "query": "villa in Goa", "context": { "budget": "high" } }));
            then.status(200).json_body(json!({
                "filters": { "city": "Goa", "property_type": "villa", "max_price": 20000000 },
                "intent": "buy",
            }));
        })
        .await;

    let context = json!({ "budget": "high" });
    let parsed = nlp(&server, Duration::from_secs(5))
        .parse_query("villa in Goa", Some(&context))
        .await
        .unwrap();

    assert_eq!(parsed.filters.city.as_deref(), Some("Goa"));
    assert_eq!(parsed.filters.property_type, Some(PropertyType::Villa));
    assert_eq!(parsed.filters.max_price, Some(Decimal::from(20_000_000)));
    assert_eq!(parsed.intent.as_deref(), Some("buy"));
    mock.assert_async().await;
}

#[tokio::test]
async fn missing_fields_default_and_blank_intent_is_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/parse-query");
            then.status(200).json_body(json!({ "intent": "" }));
        })
        .await;

    let parsed = nlp(&server, Duration::from_secs(5))
        .parse_query("anything", None)
        .await
        .unwrap();

    assert!(parsed.filters.is_empty());
    assert_eq!(parsed.intent, None);
}

#[tokio::test]
async fn non_success_status_is_an_nlp_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/parse-query");
            then.status(503).body("overloaded");
        })
        .await;

    let err = nlp(&server, Duration::from_secs(5))
        .parse_query("2 BHK", None)
        .await
        .unwrap_err();

    assert_eq!(err.backend, "nlp");
    assert!(err.message.contains("503"));
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/parse-query");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(json!({ "filters": {} }));
        })
        .await;

    let client = nlp(&server, Duration::from_millis(50));
    assert_eq!(client.timeout(), Duration::from_millis(50));
    assert!(client.parse_query("2 BHK", None).await.is_err());
}
