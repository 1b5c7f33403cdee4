//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Greeting ("sup sup")
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (store reachable)
//!
//! # Accounts
//! GET  /accounts/{account}/balances - Kid and pup holder counts
//!
//! # Orders
//! GET  /orders/{account}            - Orders placed by an account
//! POST /orders                      - Place an order (eligibility checked)
//! ```
//!
//! Successful JSON responses are wrapped as `{"data": ...}`; failures, including
//! unknown paths, wrong methods and undecodable path segments, use the envelope
//! described in [`crate::error`].

pub mod accounts;
pub mod health;
pub mod orders;

use std::time::Duration;

use axum::{
    Router,
    extract::{Path, rejection::PathRejection},
    http::{Method, Request, Response, Uri},
    middleware,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use comic_claim_core::Account;

use crate::error::{AppError, Result};
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub const fn new(data: T) -> Self {
        Self { data }
    }
}

/// Create all routes without state or middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::greeting))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/accounts/{account}/balances", get(accounts::balances))
        .route("/orders", post(orders::place))
        .route("/orders/{account}", get(orders::list))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
}

/// Build the complete application: routes, state, tracing, request IDs, and CORS.
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    routes()
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .layer(cors)
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::MethodNotAllowed(format!("{method} {}", uri.path()))
}

/// Extract the `{account}` path segment, rejecting undecodable or blank input.
fn account_from_path(path: std::result::Result<Path<String>, PathRejection>) -> Result<Account> {
    let Path(account) = path.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    Account::parse(&account).map_err(|e| AppError::BadRequest(e.to_string()))
}
