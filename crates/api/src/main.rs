use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use estate_api::config::{LogFormat, ServerConfig};
use estate_api::router::build_app_router;
use estate_api::state::{AppState, Collaborators};
use estate_cache::MokaCacheStore;
use estate_core::cache::ListingCache;
use estate_core::ports::NlpService;
use estate_db::PgStore;
use estate_gateway::nlp::{NlpClient, NlpConfig};
use estate_gateway::stripe::{StripeClient, StripeConfig};
use estate_gateway::webhook::WebhookVerifier;

/// How long shutdown waits for in-flight view-counter bumps.
const TASK_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "estate_api=debug,estate_core=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
        .unwrap_or_else(|_| "20".into())
        .parse()
        .expect("DATABASE_MAX_CONNECTIONS must be a valid u32");

    let pool = estate_db::create_pool(&database_url, max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!(max_connections, "Database connection pool created");

    estate_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    estate_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Collaborators ---
    let store = Arc::new(PgStore::new(pool.clone()));

    let cache = ListingCache::new(
        Arc::new(MokaCacheStore::new(config.cache_max_entries)),
        config.cache_ttl(),
    );
    tracing::info!(
        ttl_secs = config.cache_ttl_secs,
        max_entries = config.cache_max_entries,
        "Listing cache ready",
    );

    let stripe = StripeConfig::from_env();
    let webhooks = WebhookVerifier::new(stripe.webhook_secret.clone());
    let billing = Arc::new(StripeClient::new(stripe));

    let nlp = NlpConfig::from_env().map(|cfg| {
        tracing::info!(base_url = %cfg.base_url, "NLP service configured");
        Arc::new(NlpClient::new(cfg)) as Arc<dyn NlpService>
    });
    if nlp.is_none() {
        tracing::warn!("NLP_SERVICE_URL not set, search uses local parsing only");
    }

    // --- App state ---
    let state = AppState::new(
        pool.clone(),
        config.clone(),
        Collaborators {
            listings: store.clone(),
            subscriptions: store.clone(),
            leads: store,
            cache,
            billing,
            nlp,
            webhooks,
        },
    );
    let tasks = state.tasks.clone();

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!(
        pending = tasks.pending(),
        "Server stopped accepting connections, draining background tasks",
    );
    if tokio::time::timeout(TASK_DRAIN_TIMEOUT, tasks.drain())
        .await
        .is_err()
    {
        tracing::warn!(pending = tasks.pending(), "Background tasks did not finish in time");
    }

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
