//! Request and response bodies
//!
//! Request fields that carry money or ids are kept as raw JSON values and
//! parsed explicitly by the handlers, so that a malformed amount becomes an
//! `INVALID_AMOUNT` answer instead of a generic deserialization failure.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::core_types::AccountId;
use crate::ledger::Transaction;

// ============================================================================
// Ledger
// ============================================================================

/// Body of deposit and withdraw
#[derive(Debug, Deserialize, ToSchema)]
pub struct AmountRequest {
    /// Positive decimal, as a JSON number or string
    #[schema(value_type = String, example = "100")]
    pub amount: Option<Value>,
}

/// Body of the combined credit/debit endpoint
#[derive(Debug, Deserialize, ToSchema)]
pub struct LegacyTransactionRequest {
    #[schema(value_type = i64, example = 1)]
    pub account_id: Option<Value>,
    /// `credit` or `debit`
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "credit")]
    pub kind: Option<Value>,
    #[schema(value_type = String, example = "50")]
    pub amount: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub transaction: Transaction,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LegacyTransactionResponse {
    pub account_id: AccountId,
    #[serde(rename = "newBalance")]
    #[schema(value_type = String, example = "150")]
    pub new_balance: Decimal,
}

// ============================================================================
// Accounts
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    #[schema(example = "Savings")]
    pub name: Option<String>,
    /// Opening balance, zero when absent
    #[schema(value_type = Option<String>, example = "0")]
    pub balance: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    #[schema(example = "Household")]
    pub name: Option<String>,
    /// Not writable; present only to reject it explicitly
    #[schema(value_type = Option<String>)]
    pub balance: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

// ============================================================================
// System
// ============================================================================

/// Health check response data
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_u64)]
    pub timestamp_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_request_reads_type_field() {
        let req: LegacyTransactionRequest = serde_json::from_value(json!({
            "account_id": 1,
            "type": "credit",
            "amount": 50
        }))
        .unwrap();
        assert_eq!(req.kind, Some(json!("credit")));
        assert_eq!(req.amount, Some(json!(50)));
    }

    #[test]
    fn test_legacy_response_field_names() {
        let body = serde_json::to_value(LegacyTransactionResponse {
            account_id: 4,
            new_balance: Decimal::new(1505, 1),
        })
        .unwrap();
        assert_eq!(body, json!({"account_id": 4, "newBalance": "150.5"}));
    }

    #[test]
    fn test_amount_request_tolerates_missing_field() {
        let req: AmountRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.amount.is_none());
    }
}
