//! Holder count queries.
//!
//! Accounts normally have at most one row per holder table. When several
//! exist, the first row the database returns wins.

use sqlx::PgExecutor;

use comic_claim_core::Account;

use super::RepositoryError;

/// Get the `kid_count` recorded for an account.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn kid_count<'e, E>(executor: E, account: &Account) -> Result<Option<i32>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let count = sqlx::query_scalar::<_, Option<i32>>(
        "SELECT kid_count FROM kid_holders WHERE account = $1 LIMIT 1",
    )
    .bind(account.as_str())
    .fetch_optional(executor)
    .await?;

    Ok(count.flatten())
}

/// Get the `pup_count` recorded for an account.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn pup_count<'e, E>(executor: E, account: &Account) -> Result<Option<i32>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let count = sqlx::query_scalar::<_, Option<i32>>(
        "SELECT pup_count FROM pup_holders WHERE account = $1 LIMIT 1",
    )
    .bind(account.as_str())
    .fetch_optional(executor)
    .await?;

    Ok(count.flatten())
}
