//! Ledger value types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::core_types::{AccountId, TransactionId};
use crate::money::Amount;

/// Direction of a balance change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Balance-increasing
    Credit,
    /// Balance-decreasing, rejected if it would drive the balance negative
    Debit,
}

impl TransactionKind {
    /// Wire and storage form (`transactions.type` column)
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Debit => "debit",
        }
    }

    /// Balance after applying `amount` in this direction.
    ///
    /// Returns `None` only on decimal overflow. The result of a debit may be
    /// negative; rejecting it is the engine's job.
    pub fn next_balance(self, balance: Decimal, amount: Amount) -> Option<Decimal> {
        match self {
            TransactionKind::Credit => balance.checked_add(amount.value()),
            TransactionKind::Debit => balance.checked_sub(amount.value()),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "credit" | "deposit" => Ok(TransactionKind::Credit),
            "debit" | "withdraw" | "withdrawal" => Ok(TransactionKind::Debit),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

/// A committed ledger entry. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub kind: TransactionKind,
    #[schema(value_type = String, example = "100")]
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

/// An entry to append; id and timestamp are assigned by the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub amount: Amount,
}

/// Result of one committed posting: the log entry and the balance it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Posting {
    pub transaction: Transaction,
    pub balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("credit".parse(), Ok(TransactionKind::Credit));
        assert_eq!("DEBIT".parse(), Ok(TransactionKind::Debit));
        assert_eq!("deposit".parse(), Ok(TransactionKind::Credit));
        assert_eq!("withdraw".parse(), Ok(TransactionKind::Debit));
        assert!("transfer".parse::<TransactionKind>().is_err());
        assert!("".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn test_kind_serde_lowercase() {
        assert_eq!(
            serde_json::to_value(TransactionKind::Credit).unwrap(),
            serde_json::json!("credit")
        );
        let k: TransactionKind = serde_json::from_str("\"debit\"").unwrap();
        assert_eq!(k, TransactionKind::Debit);
    }

    #[test]
    fn test_next_balance() {
        let amount = Amount::new(Decimal::from(30)).unwrap();
        assert_eq!(
            TransactionKind::Credit.next_balance(Decimal::from(100), amount),
            Some(Decimal::from(130))
        );
        assert_eq!(
            TransactionKind::Debit.next_balance(Decimal::from(20), amount),
            Some(Decimal::from(-10))
        );
        assert_eq!(
            TransactionKind::Credit.next_balance(Decimal::MAX, amount),
            None
        );
    }
}
