//! `GET /accounts/{account}/balances`.

use std::sync::Arc;

use axum::http::StatusCode;
use comic_claim_integration_tests::{
    UnavailableStore, call, get, memory_router, router, store_with_holders,
};
use comic_claim_server::db::InMemoryOrderStore;
use comic_claim_server::services::DisabledNotifier;
use serde_json::json;

#[tokio::test]
async fn test_both_counts_present() {
    let store = store_with_holders("A1", Some(5), Some(3)).await;
    let response = call(memory_router(&store), get("/accounts/A1/balances")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"data": {"kidCount": 5, "pupCount": 3}}));
}

#[tokio::test]
async fn test_missing_rows_are_omitted() {
    let store = InMemoryOrderStore::new();
    let response = call(memory_router(&store), get("/accounts/nobody/balances")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"data": {}}));
}

#[tokio::test]
async fn test_only_kid_row() {
    let store = store_with_holders("A1", Some(2), None).await;
    let response = call(memory_router(&store), get("/accounts/A1/balances")).await;

    assert_eq!(response.json(), json!({"data": {"kidCount": 2}}));
}

#[tokio::test]
async fn test_account_matched_exactly() {
    let store = store_with_holders("A1", Some(5), Some(3)).await;
    let response = call(memory_router(&store), get("/accounts/a1/balances")).await;

    assert_eq!(response.json(), json!({"data": {}}));
}

#[tokio::test]
async fn test_percent_encoded_account_decoded() {
    let store = store_with_holders("0xAb Cd", Some(1), Some(1)).await;
    let response = call(memory_router(&store), get("/accounts/0xAb%20Cd/balances")).await;

    assert_eq!(response.json(), json!({"data": {"kidCount": 1, "pupCount": 1}}));
}

#[tokio::test]
async fn test_long_account_is_just_unknown() {
    let uri = format!("/accounts/{}/balances", "a".repeat(300));
    let response = call(memory_router(&InMemoryOrderStore::new()), get(&uri)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"data": {}}));
}

#[tokio::test]
async fn test_store_failure_is_opaque_500() {
    let app = router(Arc::new(UnavailableStore), Arc::new(DisabledNotifier));
    let response = call(app, get("/accounts/A1/balances")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json(),
        json!({"error": {"kind": "internal", "message": "Internal server error"}})
    );
    assert!(!response.text().contains("10.0.0.7"));
}
