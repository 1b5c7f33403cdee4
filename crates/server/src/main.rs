//! Comic Claim Server - balance lookups and order placement.
//!
//! # Architecture
//!
//! - Axum web framework serving a small JSON API
//! - `PostgreSQL` holder tables gate how many comics an account may claim
//! - Orders are placed in a per-account claim transaction
//! - Optional SMTP notification after each placed order (best effort)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use comic_claim_server::config::{LogFormat, ServerConfig};
use comic_claim_server::db::{self, PgOrderStore};
use comic_claim_server::middleware::cors_layer;
use comic_claim_server::routes;
use comic_claim_server::services::{DisabledNotifier, EmailNotifier, Notifier};
use comic_claim_server::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Pick the notifier: SMTP when configured, otherwise a no-op.
fn build_notifier(config: &ServerConfig) -> Arc<dyn Notifier> {
    match &config.email {
        Some(email) => {
            let notifier = EmailNotifier::new(email).expect("Failed to configure SMTP notifier");
            tracing::info!(smtp_host = %email.smtp_host, "Order notifications enabled");
            Arc::new(notifier)
        }
        None => {
            tracing::info!("SMTP_HOST not set, order notifications disabled");
            Arc::new(DisabledNotifier)
        }
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "comic_claim_server=info,tower_http=debug".into());

    let is_json = config.log_format == LogFormat::Json;
    let json_layer = is_json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // NOTE: The schema is managed outside this service; see `db` module docs.
    let pool = db::create_pool(&config.database)
        .await
        .expect("Failed to create database pool");
    tracing::info!(
        max_connections = config.database.max_connections,
        tls = config.database.require_tls,
        "Database pool created"
    );

    let notifier = build_notifier(&config);
    let state = AppState::new(Arc::new(PgOrderStore::new(pool)), notifier);

    let app = routes::router(state, cors_layer(&config.cors_allowed_origins))
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("comic claim server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
