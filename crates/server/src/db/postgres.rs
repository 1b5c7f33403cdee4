//! `PostgreSQL` implementation of [`OrderStore`].

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use comic_claim_core::{Account, Balances, NewOrder, Order};

use super::{ClaimTransaction, OrderStore, RepositoryError, holders, orders};

/// Order store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Pool exhaustion and a closed pool mean the store is unreachable rather than
/// that a query failed.
fn acquire_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::PoolTimedOut => {
            RepositoryError::Unavailable("timed out acquiring a connection".to_string())
        }
        sqlx::Error::PoolClosed => RepositoryError::Unavailable("pool closed".to_string()),
        other => RepositoryError::Database(other),
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(acquire_error)?;
        Ok(())
    }

    async fn balances(&self, account: &Account) -> Result<Balances, RepositoryError> {
        let kid_count = holders::kid_count(&self.pool, account).await?;
        let pup_count = holders::pup_count(&self.pool, account).await?;

        Ok(Balances {
            kid_count,
            pup_count,
        })
    }

    async fn orders_for_account(&self, account: &Account) -> Result<Vec<Order>, RepositoryError> {
        orders::list_for_account(&self.pool, account).await
    }

    async fn begin_claim(
        &self,
        account: &Account,
    ) -> Result<Box<dyn ClaimTransaction>, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(acquire_error)?;
        orders::lock_account(&mut *tx, account).await?;

        Ok(Box::new(PgClaim {
            tx,
            account: account.clone(),
        }))
    }
}

/// A claim running inside one database transaction holding the account's
/// advisory lock.
struct PgClaim {
    tx: Transaction<'static, Postgres>,
    account: Account,
}

#[async_trait]
impl ClaimTransaction for PgClaim {
    async fn existing_order_count(&mut self) -> Result<i64, RepositoryError> {
        orders::existing_count(&mut *self.tx, &self.account).await
    }

    async fn kid_count(&mut self) -> Result<Option<i32>, RepositoryError> {
        holders::kid_count(&mut *self.tx, &self.account).await
    }

    async fn pup_count(&mut self) -> Result<Option<i32>, RepositoryError> {
        holders::pup_count(&mut *self.tx, &self.account).await
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError> {
        if order.account != self.account {
            return Err(RepositoryError::Conflict(format!(
                "order for {} inserted under claim for {}",
                order.account, self.account
            )));
        }
        orders::insert(&mut *self.tx, order).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
