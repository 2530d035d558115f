//! Account CRUD trait and its error type

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use super::models::{Account, PRIMARY_ACCOUNT_NAME};
use super::validation::{AccountName, ValidationError};
use crate::core_types::AccountId;
use crate::money::MoneyError;
use crate::store::StoreError;

/// Account management errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccountError {
    #[error("Invalid account name: {0}")]
    InvalidName(#[from] ValidationError),

    #[error("Invalid opening balance: {0}")]
    InvalidBalance(#[from] MoneyError),

    #[error("Balance can only be changed by deposits and withdrawals")]
    BalanceNotWritable,

    #[error("Account not found: {0}")]
    NotFound(AccountId),

    #[error("Persistence error: {0}")]
    Store(#[from] StoreError),
}

impl AccountError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::InvalidName(_) => "INVALID_NAME",
            AccountError::InvalidBalance(_) => "INVALID_BALANCE",
            AccountError::BalanceNotWritable => "BALANCE_NOT_WRITABLE",
            AccountError::NotFound(_) => "ACCOUNT_NOT_FOUND",
            AccountError::Store(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            AccountError::InvalidName(_)
            | AccountError::InvalidBalance(_)
            | AccountError::BalanceNotWritable => 400,
            AccountError::NotFound(_) => 404,
            AccountError::Store(_) => 500,
        }
    }
}

/// Account records as seen by account management.
///
/// Implemented by every ledger store, so that accounts and their history
/// live in the same place and deletes cascade to the log.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// All accounts ordered by id
    async fn list(&self) -> Result<Vec<Account>, AccountError>;

    async fn get(&self, id: AccountId) -> Result<Account, AccountError>;

    /// Create an account with a non-negative opening balance
    async fn create(
        &self,
        name: &AccountName,
        opening_balance: Decimal,
    ) -> Result<Account, AccountError>;

    async fn rename(&self, id: AccountId, name: &AccountName) -> Result<Account, AccountError>;

    /// Remove the account and its transaction history.
    ///
    /// Waits for the row lock, so it never interleaves with a posting.
    async fn delete(&self, id: AccountId) -> Result<(), AccountError>;

    /// Create the primary account if the store holds none.
    async fn seed_primary_account(&self) -> Result<Option<Account>, AccountError> {
        if !self.list().await?.is_empty() {
            return Ok(None);
        }
        let name = AccountName::new(PRIMARY_ACCOUNT_NAME)?;
        let account = self.create(&name, Decimal::ZERO).await?;
        tracing::info!(account_id = account.id, "Seeded primary account");
        Ok(Some(account))
    }
}

/// Reject negative opening balances (shared by the store implementations)
pub(crate) fn check_opening_balance(balance: Decimal) -> Result<(), AccountError> {
    if balance.is_sign_negative() && !balance.is_zero() {
        return Err(AccountError::InvalidBalance(MoneyError::Negative));
    }
    Ok(())
}
