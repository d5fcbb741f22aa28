#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use estate_api::auth::jwt::{generate_access_token, JwtConfig};
use estate_api::config::{LogFormat, ServerConfig};
use estate_api::router::build_app_router;
use estate_api::state::{AppState, Collaborators};
use estate_core::cache::ListingCache;
use estate_core::ports::NlpService;
use estate_core::roles::UserRole;
use estate_core::tasks::DetachedTasks;
use estate_core::testing::{FakeBilling, InMemoryStore, MemoryCache};
use estate_core::types::{new_id, DbId};
use estate_gateway::webhook::WebhookVerifier;

pub const WEBHOOK_SECRET: &str = "whsec_test";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        log_format: LogFormat::Pretty,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 15,
        },
        cache_ttl_secs: 300,
        cache_max_entries: 1_000,
    }
}

/// The full router over in-memory collaborators, plus handles to inspect them.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub billing: Arc<FakeBilling>,
    pub tasks: DetachedTasks,
    pub config: ServerConfig,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn token(&self, user_id: DbId, role: UserRole) -> String {
        generate_access_token(
            user_id,
            role,
            Some("dealer@example.com"),
            &self.config.jwt,
        )
        .unwrap()
    }

    /// A fresh dealer id and a token for it.
    pub fn dealer(&self) -> (DbId, String) {
        let id = new_id();
        (id, self.token(id, UserRole::Dealer))
    }
}

pub fn build_test_app() -> TestApp {
    build_test_app_with_nlp(None)
}

/// Same as [`build_test_app`] with an NLP collaborator wired in.
///
/// The pool points at a closed port so the health check reports the
/// database as down without a server.
pub fn build_test_app_with_nlp(nlp: Option<Arc<dyn NlpService>>) -> TestApp {
    let config = test_config();
    let store = Arc::new(InMemoryStore::new());
    let cache = Arc::new(MemoryCache::new());
    let billing = Arc::new(FakeBilling::new());

    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://postgres@127.0.0.1:1/estate_test")
        .unwrap();

    let state = AppState::new(
        pool,
        config.clone(),
        Collaborators {
            listings: store.clone(),
            subscriptions: store.clone(),
            leads: store.clone(),
            cache: ListingCache::new(cache.clone(), config.cache_ttl()),
            billing: billing.clone(),
            nlp,
            webhooks: WebhookVerifier::new(WEBHOOK_SECRET),
        },
    );
    let tasks = state.tasks.clone();

    TestApp {
        router: build_app_router(state, &config),
        store,
        cache,
        billing,
        tasks,
        config,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, body, None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    json_request(app, Method::POST, uri, body, Some(token)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    json_request(app, Method::PUT, uri, body, Some(token)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
