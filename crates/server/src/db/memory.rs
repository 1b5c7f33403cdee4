//! In-memory implementation of [`OrderStore`].
//!
//! Used by tests and local experiments. A claim holds the store lock from
//! `begin_claim` until it commits or is dropped, so claims never interleave.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use comic_claim_core::{Account, Balances, NewOrder, Order, OrderId};

use super::{ClaimTransaction, OrderStore, RepositoryError};

#[derive(Debug, Default)]
struct Tables {
    kid_holders: HashMap<Account, i32>,
    pup_holders: HashMap<Account, i32>,
    orders: Vec<Order>,
    last_id: i32,
}

impl Tables {
    fn existing_count(&self, account: &Account) -> i64 {
        self.orders
            .iter()
            .filter(|o| &o.account == account)
            .map(|o| i64::from(o.count))
            .sum()
    }
}

/// Order store kept entirely in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryOrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or clear, with `None`) an account's holder counts.
    pub async fn set_holders(&self, account: &Account, kid_count: Option<i32>, pup_count: Option<i32>) {
        let mut tables = self.tables.lock().await;
        match kid_count {
            Some(count) => tables.kid_holders.insert(account.clone(), count),
            None => tables.kid_holders.remove(account),
        };
        match pup_count {
            Some(count) => tables.pup_holders.insert(account.clone(), count),
            None => tables.pup_holders.remove(account),
        };
    }

    /// Every stored order, in insertion order.
    pub async fn all_orders(&self) -> Vec<Order> {
        self.tables.lock().await.orders.clone()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn balances(&self, account: &Account) -> Result<Balances, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(Balances {
            kid_count: tables.kid_holders.get(account).copied(),
            pup_count: tables.pup_holders.get(account).copied(),
        })
    }

    async fn orders_for_account(&self, account: &Account) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut orders: Vec<Order> = tables
            .orders
            .iter()
            .filter(|o| &o.account == account)
            .cloned()
            .collect();
        orders.sort_by_key(|o| (o.date_created, o.id));
        Ok(orders)
    }

    async fn begin_claim(
        &self,
        account: &Account,
    ) -> Result<Box<dyn ClaimTransaction>, RepositoryError> {
        let tables = Arc::clone(&self.tables).lock_owned().await;
        Ok(Box::new(MemoryClaim {
            tables,
            account: account.clone(),
            staged: Vec::new(),
        }))
    }
}

/// Claim holding the whole store; inserts are staged until commit.
struct MemoryClaim {
    tables: OwnedMutexGuard<Tables>,
    account: Account,
    staged: Vec<Order>,
}

#[async_trait]
impl ClaimTransaction for MemoryClaim {
    async fn existing_order_count(&mut self) -> Result<i64, RepositoryError> {
        let staged: i64 = self.staged.iter().map(|o| i64::from(o.count)).sum();
        Ok(self.tables.existing_count(&self.account) + staged)
    }

    async fn kid_count(&mut self) -> Result<Option<i32>, RepositoryError> {
        Ok(self.tables.kid_holders.get(&self.account).copied())
    }

    async fn pup_count(&mut self) -> Result<Option<i32>, RepositoryError> {
        Ok(self.tables.pup_holders.get(&self.account).copied())
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError> {
        if order.account != self.account {
            return Err(RepositoryError::Conflict(format!(
                "order for {} inserted under claim for {}",
                order.account, self.account
            )));
        }

        // Like a SERIAL column, ids handed out by rolled-back claims are not reused.
        self.tables.last_id += 1;
        let stored = Order {
            id: OrderId::new(self.tables.last_id),
            account: order.account.clone(),
            delivery_address: order.delivery_address.clone(),
            count: order.count,
            notes: order.notes.clone(),
            date_created: Utc::now(),
        };
        self.staged.push(stored.clone());
        Ok(stored)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let Self {
            mut tables, staged, ..
        } = *self;
        tables.orders.extend(staged);
        Ok(())
    }
}
