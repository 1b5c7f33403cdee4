//! Order queries.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use comic_claim_core::{Account, NewOrder, Order, OrderId};

use super::RepositoryError;

/// Columns selected for every order query. `date_created` is cast so both
/// `timestamp` and `timestamptz` columns decode.
const ORDER_COLUMNS: &str =
    "id, account, delivery_address, count, notes, date_created::timestamptz AS date_created";

/// Raw `orders` row.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    account: String,
    delivery_address: String,
    count: i32,
    notes: Option<String>,
    date_created: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let account = Account::parse(&row.account).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid account on order {}: {e}", row.id))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            account,
            delivery_address: row.delivery_address,
            count: row.count,
            notes: row.notes,
            date_created: row.date_created,
        })
    }
}

/// List all orders for an account, oldest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a stored account is blank.
pub async fn list_for_account<'e, E>(
    executor: E,
    account: &Account,
) -> Result<Vec<Order>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE account = $1 ORDER BY date_created, id"
    ))
    .bind(account.as_str())
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(Order::try_from).collect()
}

/// Sum of the counts of all orders for an account (0 when there are none).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn existing_count<'e, E>(executor: E, account: &Account) -> Result<i64, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let sum = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(count), 0)::BIGINT FROM orders WHERE account = $1",
    )
    .bind(account.as_str())
    .fetch_one(executor)
    .await?;

    Ok(sum)
}

/// Insert an order and return the stored row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert<'e, E>(executor: E, order: &NewOrder) -> Result<Order, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders (account, delivery_address, count, notes) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(order.account.as_str())
    .bind(&order.delivery_address)
    .bind(order.count)
    .bind(order.notes.as_deref())
    .fetch_one(executor)
    .await?;

    Order::try_from(row)
}

/// Take the transaction-scoped advisory lock for an account.
///
/// Held until the surrounding transaction commits or rolls back.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the lock query fails.
pub async fn lock_account<'e, E>(executor: E, account: &Account) -> Result<(), RepositoryError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(account.as_str())
        .execute(executor)
        .await?;

    Ok(())
}
