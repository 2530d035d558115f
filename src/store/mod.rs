//! Store seam for the ledger
//!
//! A posting touches two things, the account row and the transaction log,
//! and both must commit together. The traits here describe one such atomic
//! unit of work:
//!
//! ```text
//! LedgerStore::begin() ──▶ LedgerUnit
//!                            ├─ AccountStore::lock_for_update   (may block)
//!                            ├─ AccountStore::write_balance     (lock held)
//!                            ├─ TransactionLog::append
//!                            └─ commit() | rollback() | drop
//! ```
//!
//! Dropping a unit without committing rolls it back and releases its row
//! locks, so every exit path (including a cancelled request future) leaves
//! committed state untouched.
//!
//! Two backends implement the seam: [`postgres::PgLedgerStore`] (row locks
//! via `SELECT ... FOR UPDATE`) and [`memory::MemoryLedgerStore`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::Account;
use crate::core_types::AccountId;
use crate::ledger::types::{NewTransaction, Transaction};

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

/// Store-level failures. None of them leave a partial effect behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out waiting for account lock")]
    LockTimeout,

    #[error("Account {0} is not locked by this unit")]
    NotLocked(AccountId),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Account half of a unit of work.
#[async_trait]
pub trait AccountStore: Send {
    /// Lock the account row until the unit ends and return its snapshot.
    ///
    /// The existence check and the lock are one read: `None` means no such
    /// account exists at the moment the lock would have been granted.
    async fn lock_for_update(&mut self, account_id: AccountId)
    -> Result<Option<Account>, StoreError>;

    /// Stage a new balance. Only valid while this unit holds the row lock.
    async fn write_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
    ) -> Result<(), StoreError>;
}

/// Log half of a unit of work.
#[async_trait]
pub trait TransactionLog: Send {
    /// Stage an append. Id and `created_at` are assigned here; the entry
    /// becomes visible only if the unit commits.
    async fn append(&mut self, entry: NewTransaction) -> Result<Transaction, StoreError>;
}

/// One all-or-nothing unit spanning the account row and the log.
#[async_trait]
pub trait LedgerUnit: AccountStore + TransactionLog {
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Process-wide store handle, constructed at startup and injected.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Open a new unit of work.
    async fn begin(&self) -> Result<Box<dyn LedgerUnit + '_>, StoreError>;

    /// Committed transactions of one account, newest first.
    ///
    /// Takes no row lock and never sees uncommitted entries.
    async fn list_by_account(&self, account_id: AccountId)
    -> Result<Vec<Transaction>, StoreError>;

    /// Cheap liveness probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}
