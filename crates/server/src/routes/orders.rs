//! Order handlers.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use serde::Deserialize;

use comic_claim_core::{NewOrder, Order};

use super::{Data, account_from_path};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Request body for placing an order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub account: String,
    pub delivery_address: String,
    pub count: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

/// List the orders placed by an account, oldest first.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a blank or undecodable account and
/// `AppError::Database` if the read fails.
pub async fn list(
    State(state): State<AppState>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<Data<Vec<Order>>>> {
    let account = account_from_path(path)?;
    let orders = state.orders().orders(&account).await?;
    Ok(Json(Data::new(orders)))
}

/// Place an order.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the body is malformed or invalid,
/// `AppError::Ineligible` if the account cannot claim that many comics, and
/// `AppError::Database` if any store step fails.
pub async fn place(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<Json<Data<Order>>> {
    let Json(body) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let new_order = NewOrder::new(&body.account, &body.delivery_address, body.count, body.notes)?;
    let order = state.orders().place_order(new_order).await?;

    Ok(Json(Data::new(order)))
}
