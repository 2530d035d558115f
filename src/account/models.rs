//! Data models for account management

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::core_types::AccountId;

/// Name given to the account created on first start
pub const PRIMARY_ACCOUNT_NAME: &str = "Primary Account";

/// Account snapshot
///
/// `balance` is never negative. It changes only through the ledger engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Account {
    #[schema(example = 1)]
    pub id: AccountId,
    #[schema(example = "Primary Account")]
    pub name: String,
    #[schema(value_type = String, example = "100.00")]
    pub balance: Decimal,
}

impl Account {
    /// True when a debit of `amount` would not drive the balance negative
    pub fn can_cover(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_cover() {
        let account = Account {
            id: 1,
            name: "test".to_string(),
            balance: Decimal::from(100),
        };

        assert!(account.can_cover(Decimal::from(100)));
        assert!(account.can_cover(Decimal::from(1)));
        assert!(!account.can_cover(Decimal::from(150)));
    }

    #[test]
    fn test_balance_serializes_as_string() {
        let account = Account {
            id: 3,
            name: "Savings".to_string(),
            balance: Decimal::new(1050, 1),
        };
        let v = serde_json::to_value(&account).unwrap();
        assert_eq!(v["balance"], serde_json::json!("105.0"));
        assert_eq!(v["id"], serde_json::json!(3));
    }
}
