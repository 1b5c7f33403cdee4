//! Integration tests for the comic claim server.
//!
//! The tests drive the full router (state, request IDs, tracing, CORS)
//! in-process through `tower::ServiceExt::oneshot`, backed by the in-memory
//! order store. No database or network is required.
//!
//! `tests/postgres.rs` exercises the `PostgreSQL` store itself and is ignored
//! by default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p comic-claim-integration-tests
//!
//! # Including the database-backed tests
//! TEST_DATABASE_URL=postgres://... cargo test -p comic-claim-integration-tests -- --ignored
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use comic_claim_core::{Account, Balances, Order};
use comic_claim_server::db::{ClaimTransaction, InMemoryOrderStore, OrderStore, RepositoryError};
use comic_claim_server::middleware::cors_layer;
use comic_claim_server::routes;
use comic_claim_server::services::{DisabledNotifier, Notifier, NotifyError};
use comic_claim_server::state::AppState;

/// Browser origin admitted by [`router`].
pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Build the application router over a store and notifier.
pub fn router(store: Arc<dyn OrderStore>, notifier: Arc<dyn Notifier>) -> Router {
    let state = AppState::new(store, notifier);
    routes::router(state, cors_layer(&[ALLOWED_ORIGIN.to_string()]))
}

/// Router over an in-memory store with notifications disabled.
pub fn memory_router(store: &InMemoryOrderStore) -> Router {
    router(Arc::new(store.clone()), Arc::new(DisabledNotifier))
}

/// In-memory store with holder rows for one account.
pub async fn store_with_holders(account: &str, kid: Option<i32>, pup: Option<i32>) -> InMemoryOrderStore {
    let store = InMemoryOrderStore::new();
    store
        .set_holders(&Account::parse(account).unwrap(), kid, pup)
        .await;
    store
}

/// A response reduced to what the tests assert on.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Body parsed as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("body is not valid JSON")
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("body is not UTF-8")
    }
}

/// Drive the router with a single request.
pub async fn call(router: Router, request: Request<Body>) -> TestResponse {
    let response = router.oneshot(request).await.expect("oneshot failed");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

/// `GET` request for a path.
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// `POST /orders` with a JSON body.
pub fn post_order(body: &Value) -> Request<Body> {
    post_order_raw(&body.to_string())
}

/// `POST /orders` with an arbitrary body declared as JSON.
pub fn post_order_raw(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/orders")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Notifier that forwards every placed order to a channel.
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Order>,
}

impl ChannelNotifier {
    /// Create the notifier and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Order>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn order_placed(&self, order: &Order) -> Result<(), NotifyError> {
        let _ = self.sender.send(order.clone());
        Ok(())
    }
}

/// Notifier whose relay always refuses.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn order_placed(&self, _order: &Order) -> Result<(), NotifyError> {
        Err(NotifyError::InvalidAddress("relay refused".to_string()))
    }
}

/// Notifier that takes far longer than any request should.
pub struct StalledNotifier;

#[async_trait]
impl Notifier for StalledNotifier {
    async fn order_placed(&self, _order: &Order) -> Result<(), NotifyError> {
        tokio::time::sleep(Duration::from_secs(300)).await;
        Ok(())
    }
}

/// Store whose every operation fails as if the database were down.
pub struct UnavailableStore;

fn unavailable() -> RepositoryError {
    RepositoryError::Unavailable("connection refused (10.0.0.7:5432)".to_string())
}

#[async_trait]
impl OrderStore for UnavailableStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Err(unavailable())
    }

    async fn balances(&self, _account: &Account) -> Result<Balances, RepositoryError> {
        Err(unavailable())
    }

    async fn orders_for_account(&self, _account: &Account) -> Result<Vec<Order>, RepositoryError> {
        Err(unavailable())
    }

    async fn begin_claim(
        &self,
        _account: &Account,
    ) -> Result<Box<dyn ClaimTransaction>, RepositoryError> {
        Err(unavailable())
    }
}
