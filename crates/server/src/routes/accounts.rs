//! Account balance handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};

use comic_claim_core::Balances;

use super::{Data, account_from_path};
use crate::error::Result;
use crate::state::AppState;

/// Holder counts for an account.
///
/// Counts with no matching holder row are omitted from the response.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a blank or undecodable account and
/// `AppError::Database` if a holder read fails.
pub async fn balances(
    State(state): State<AppState>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<Data<Balances>>> {
    let account = account_from_path(path)?;
    let balances = state.orders().balances(&account).await?;
    Ok(Json(Data::new(balances)))
}
