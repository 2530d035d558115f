//! Ledger error taxonomy

use rust_decimal::Decimal;
use thiserror::Error;

use crate::core_types::AccountId;
use crate::money::MoneyError;
use crate::store::StoreError;

/// Outcome of a rejected or failed posting.
///
/// `InvalidAmount`, `AccountNotFound` and `InsufficientFunds` are business
/// results: nothing was written and the caller may act on them. `Persistence`
/// means the unit could not complete; it was rolled back in full.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Insufficient funds: balance {available}, requested {requested}")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl LedgerError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount(_) => "INVALID_AMOUNT",
            LedgerError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::InvalidAmount(_) | LedgerError::InsufficientFunds { .. } => 400,
            LedgerError::AccountNotFound(_) => 404,
            LedgerError::Persistence(_) => 500,
        }
    }

    /// True for rejections decided by business rules (never retried).
    pub fn is_rejection(&self) -> bool {
        !matches!(self, LedgerError::Persistence(_))
    }
}
