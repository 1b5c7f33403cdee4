//! Balance lookups, order listing, and order placement.

use std::sync::Arc;

use thiserror::Error;

use comic_claim_core::{Account, Balances, Eligibility, Ineligible, NewOrder, Order};

use crate::db::{OrderStore, RepositoryError};
use crate::services::notifier::{self, Notifier};

/// Errors from [`OrderService::place_order`].
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order would exceed the account's eligible count.
    #[error(transparent)]
    Ineligible(#[from] Ineligible),

    /// A read, the insert, or the commit failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Order operations over an injected store and notifier.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    notifier: Arc<dyn Notifier>,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Holder counts for an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if either holder read fails.
    pub async fn balances(&self, account: &Account) -> Result<Balances, RepositoryError> {
        self.store.balances(account).await
    }

    /// All orders for an account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the read fails.
    pub async fn orders(&self, account: &Account) -> Result<Vec<Order>, RepositoryError> {
        self.store.orders_for_account(account).await
    }

    /// Place an order if the account is still eligible for it.
    ///
    /// The existing-order sum, both holder reads, and the insert run in one
    /// claim, so concurrent orders for the same account cannot jointly exceed
    /// the eligible count. On success a notification is dispatched in the
    /// background; its outcome never affects the result.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Ineligible` if `count + existing > min(kid, pup)`,
    /// or `OrderError::Repository` if any store step fails. No order is
    /// persisted in either case.
    #[tracing::instrument(
        name = "place_order",
        skip(self, new_order),
        fields(account = %new_order.account, requested = new_order.count)
    )]
    pub async fn place_order(&self, new_order: NewOrder) -> Result<Order, OrderError> {
        let mut claim = self
            .store
            .begin_claim(&new_order.account)
            .await
            .inspect_err(|e| tracing::error!(step = "begin_claim", error = %e, "Claim failed"))?;

        let existing = claim.existing_order_count().await.inspect_err(|e| {
            tracing::error!(step = "existing_order_count", error = %e, "Claim failed");
        })?;
        let kid_count = claim
            .kid_count()
            .await
            .inspect_err(|e| tracing::error!(step = "kid_count", error = %e, "Claim failed"))?;
        let pup_count = claim
            .pup_count()
            .await
            .inspect_err(|e| tracing::error!(step = "pup_count", error = %e, "Claim failed"))?;

        let eligibility = Eligibility::new(
            Balances {
                kid_count,
                pup_count,
            },
            existing,
        );
        tracing::info!(
            eligible = eligibility.eligible,
            existing = eligibility.existing,
            "Eligibility checked"
        );

        // Dropping the claim here rolls it back and releases the account.
        eligibility.check(new_order.count)?;

        let order = claim
            .insert_order(&new_order)
            .await
            .inspect_err(|e| tracing::error!(step = "insert_order", error = %e, "Claim failed"))?;
        claim
            .commit()
            .await
            .inspect_err(|e| tracing::error!(step = "commit", error = %e, "Claim failed"))?;

        tracing::info!(order_id = %order.id, "Order placed");
        notifier::dispatch(Arc::clone(&self.notifier), order.clone());

        Ok(order)
    }
}
