//! Database operations for the comic claim store.
//!
//! ## Tables
//!
//! - `kid_holders` - `(account, kid_count)`, read-only
//! - `pup_holders` - `(account, pup_count)`, read-only
//! - `orders` - `(id, account, delivery_address, count, notes, date_created)`
//!
//! The schema is owned outside this repository. The expected shape is:
//!
//! ```sql
//! CREATE TABLE kid_holders (account TEXT NOT NULL, kid_count INTEGER NOT NULL);
//! CREATE TABLE pup_holders (account TEXT NOT NULL, pup_count INTEGER NOT NULL);
//! CREATE TABLE orders (
//!     id SERIAL PRIMARY KEY,
//!     account TEXT NOT NULL,
//!     delivery_address TEXT NOT NULL,
//!     count INTEGER NOT NULL,
//!     notes TEXT,
//!     date_created TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//! ```
//!
//! # Stores
//!
//! Handlers and services only see the [`OrderStore`] trait. [`PgOrderStore`]
//! is the production implementation; [`InMemoryOrderStore`] backs tests.

pub mod holders;
pub mod memory;
pub mod orders;
pub mod postgres;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use thiserror::Error;

use comic_claim_core::{Account, Balances, NewOrder, Order};

use crate::config::DatabaseConfig;

pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// No connection to the store could be obtained.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read and claim access to holder counts and orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Check that the store answers queries.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Holder counts for an account; a count is `None` when no row exists.
    async fn balances(&self, account: &Account) -> Result<Balances, RepositoryError>;

    /// All orders placed by an account, oldest first.
    async fn orders_for_account(&self, account: &Account) -> Result<Vec<Order>, RepositoryError>;

    /// Start a claim for an account.
    ///
    /// Claims on the same account are serialized: a second `begin_claim` for
    /// the account waits until the first claim commits or is dropped.
    async fn begin_claim(
        &self,
        account: &Account,
    ) -> Result<Box<dyn ClaimTransaction>, RepositoryError>;
}

/// A per-account unit of work for placing an order.
///
/// Dropping the claim without calling [`ClaimTransaction::commit`] rolls back
/// anything it inserted.
#[async_trait]
pub trait ClaimTransaction: Send {
    /// Sum of the counts of all orders for the claimed account.
    async fn existing_order_count(&mut self) -> Result<i64, RepositoryError>;

    /// The account's `kid_count`, if any.
    async fn kid_count(&mut self) -> Result<Option<i32>, RepositoryError>;

    /// The account's `pup_count`, if any.
    async fn pup_count(&mut self) -> Result<Option<i32>, RepositoryError>;

    /// Insert an order and return the stored row.
    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError>;

    /// Make the claim's writes visible and release the account.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool.
///
/// Production databases (`require_tls`) are reached over TLS without
/// certificate verification, matching hosted Postgres providers that present
/// self-signed certificates.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let mut options = PgConnectOptions::from_str(config.url.expose_secret())?;
    if config.require_tls {
        options = options.ssl_mode(PgSslMode::Require);
    }

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}
