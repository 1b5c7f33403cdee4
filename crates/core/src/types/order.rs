//! Orders and holder balances.
//!
//! The serialized field names here are the external JSON shape returned by the
//! HTTP API, so they are camelCase regardless of the column names in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Account, AccountError, OrderId};

/// Errors raised while validating an order request.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderValidationError {
    /// The account identifier is invalid.
    #[error("invalid account: {0}")]
    Account(#[from] AccountError),
    /// The delivery address is empty or only whitespace.
    #[error("delivery address cannot be empty")]
    EmptyDeliveryAddress,
    /// The requested count is zero or negative.
    #[error("count must be at least 1 (got {0})")]
    NonPositiveCount(i32),
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub account: Account,
    pub delivery_address: String,
    pub count: i32,
    pub notes: Option<String>,
    /// Assigned by the store at insert time.
    pub date_created: DateTime<Utc>,
}

/// A validated request to place an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub account: Account,
    pub delivery_address: String,
    pub count: i32,
    pub notes: Option<String>,
}

impl NewOrder {
    /// Validate the raw fields of an order request.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is invalid, the delivery address is
    /// blank, or the count is not positive.
    pub fn new(
        account: &str,
        delivery_address: &str,
        count: i32,
        notes: Option<String>,
    ) -> Result<Self, OrderValidationError> {
        let account = Account::parse(account)?;

        if delivery_address.trim().is_empty() {
            return Err(OrderValidationError::EmptyDeliveryAddress);
        }

        if count < 1 {
            return Err(OrderValidationError::NonPositiveCount(count));
        }

        Ok(Self {
            account,
            delivery_address: delivery_address.to_owned(),
            count,
            notes,
        })
    }
}

/// Holder counts recorded for an account.
///
/// A count is `None` when the account has no row in the matching holder table;
/// such fields are left out of the JSON entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pup_count: Option<i32>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_new_order_valid() {
        let order = NewOrder::new("A1", "1 Main St", 2, Some("leave at door".into())).unwrap();
        assert_eq!(order.account.as_str(), "A1");
        assert_eq!(order.count, 2);
        assert_eq!(order.notes.as_deref(), Some("leave at door"));
    }

    #[test]
    fn test_new_order_rejects_blank_account() {
        assert_eq!(
            NewOrder::new(" ", "1 Main St", 1, None),
            Err(OrderValidationError::Account(AccountError::Empty))
        );
    }

    #[test]
    fn test_new_order_rejects_blank_address() {
        assert_eq!(
            NewOrder::new("A1", "", 1, None),
            Err(OrderValidationError::EmptyDeliveryAddress)
        );
    }

    #[test]
    fn test_new_order_rejects_non_positive_count() {
        assert_eq!(
            NewOrder::new("A1", "1 Main St", 0, None),
            Err(OrderValidationError::NonPositiveCount(0))
        );
        assert_eq!(
            NewOrder::new("A1", "1 Main St", -3, None),
            Err(OrderValidationError::NonPositiveCount(-3))
        );
    }

    #[test]
    fn test_order_external_shape() {
        let order = Order {
            id: OrderId::new(1),
            account: Account::parse("A1").unwrap(),
            delivery_address: "1 Main St".into(),
            count: 3,
            notes: None,
            date_created: Utc.with_ymd_and_hms(2021, 9, 1, 12, 0, 0).unwrap(),
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["account"], "A1");
        assert_eq!(json["deliveryAddress"], "1 Main St");
        assert_eq!(json["count"], 3);
        assert!(json["notes"].is_null());
        assert_eq!(json["dateCreated"], "2021-09-01T12:00:00Z");
    }

    #[test]
    fn test_balances_omit_missing_counts() {
        let json = serde_json::to_value(Balances::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));

        let json = serde_json::to_value(Balances {
            kid_count: Some(5),
            pup_count: None,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "kidCount": 5 }));
    }
}
