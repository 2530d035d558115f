//! In-memory ledger store
//!
//! Same guarantees as the PostgreSQL backend within a single process:
//! - one async mutex per account row, held by a unit until it ends
//! - writes are staged in the unit and applied on commit under the
//!   account's map entry, so readers see the balance and its log entry
//!   change together
//! - dropping a unit discards its staged writes and releases its locks
//!
//! Used by `store.backend: memory` and by the test suites.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::{AccountStore, LedgerStore, LedgerUnit, StoreError, TransactionLog};
use crate::account::directory::check_opening_balance;
use crate::account::{Account, AccountDirectory, AccountError, AccountName};
use crate::core_types::AccountId;
use crate::ledger::types::{NewTransaction, Transaction};

/// Default wait for a row lock before giving up
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Committed state of one account: the row and its log, oldest entry first
#[derive(Debug, Clone)]
struct AccountRow {
    account: Account,
    log: Vec<Transaction>,
}

/// In-memory accounts and transaction log
pub struct MemoryLedgerStore {
    rows: DashMap<AccountId, AccountRow>,
    row_locks: DashMap<AccountId, Arc<Mutex<()>>>,
    next_account_id: AtomicI64,
    next_tx_id: AtomicI64,
    lock_timeout: Duration,
    lock_grants: AtomicU64,
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            rows: DashMap::new(),
            row_locks: DashMap::new(),
            next_account_id: AtomicI64::new(1),
            next_tx_id: AtomicI64::new(1),
            lock_timeout,
            lock_grants: AtomicU64::new(0),
        }
    }

    /// Number of row locks granted so far
    pub fn lock_grants(&self) -> u64 {
        self.lock_grants.load(Ordering::Relaxed)
    }

    /// Wait for the row lock of `account_id`.
    ///
    /// `Ok(None)` if the account does not exist (or was deleted while we
    /// waited).
    async fn acquire_row(
        &self,
        account_id: AccountId,
    ) -> Result<Option<OwnedMutexGuard<()>>, StoreError> {
        // Clone the Arc so no map guard is held across the await
        let lock = match self.row_locks.get(&account_id) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Ok(None),
        };

        let guard = tokio::time::timeout(self.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| StoreError::LockTimeout)?;

        if !self.rows.contains_key(&account_id) {
            return Ok(None);
        }

        self.lock_grants.fetch_add(1, Ordering::Relaxed);
        Ok(Some(guard))
    }

    fn committed_account(&self, account_id: AccountId) -> Option<Account> {
        self.rows.get(&account_id).map(|row| row.account.clone())
    }

    fn last_committed_at(&self, account_id: AccountId) -> Option<DateTime<Utc>> {
        self.rows
            .get(&account_id)
            .and_then(|row| row.log.last().map(|tx| tx.created_at))
    }
}

/// One unit of work against [`MemoryLedgerStore`]
pub struct MemoryLedgerUnit<'a> {
    store: &'a MemoryLedgerStore,
    locks: HashMap<AccountId, OwnedMutexGuard<()>>,
    balances: HashMap<AccountId, Decimal>,
    appended: Vec<Transaction>,
}

impl MemoryLedgerUnit<'_> {
    fn ensure_locked(&self, account_id: AccountId) -> Result<(), StoreError> {
        if self.locks.contains_key(&account_id) {
            Ok(())
        } else {
            Err(StoreError::NotLocked(account_id))
        }
    }

    /// Strictly increasing per account, even if the wall clock stalls
    fn next_timestamp(&self, account_id: AccountId) -> DateTime<Utc> {
        let now = Utc::now();
        let staged = self
            .appended
            .iter()
            .rev()
            .find(|tx| tx.account_id == account_id)
            .map(|tx| tx.created_at);
        let floor = staged.or_else(|| self.store.last_committed_at(account_id));
        match floor {
            Some(last) if now <= last => last + ChronoDuration::microseconds(1),
            _ => now,
        }
    }
}

#[async_trait]
impl<'a> AccountStore for MemoryLedgerUnit<'a> {
    async fn lock_for_update(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Account>, StoreError> {
        if !self.locks.contains_key(&account_id) {
            match self.store.acquire_row(account_id).await? {
                Some(guard) => {
                    self.locks.insert(account_id, guard);
                }
                None => return Ok(None),
            }
        }

        // The lock is held, so the row cannot disappear under us
        let mut account = self
            .store
            .committed_account(account_id)
            .ok_or_else(|| {
                StoreError::Backend(format!("row {} vanished while locked", account_id))
            })?;
        if let Some(staged) = self.balances.get(&account_id) {
            account.balance = *staged;
        }
        debug!(account_id, "Row lock granted");
        Ok(Some(account))
    }

    async fn write_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
    ) -> Result<(), StoreError> {
        self.ensure_locked(account_id)?;
        self.balances.insert(account_id, balance);
        Ok(())
    }
}

#[async_trait]
impl<'a> TransactionLog for MemoryLedgerUnit<'a> {
    async fn append(&mut self, entry: NewTransaction) -> Result<Transaction, StoreError> {
        // Entries live next to their account row, so appends ride on the row lock
        self.ensure_locked(entry.account_id)?;

        let tx = Transaction {
            id: self.store.next_tx_id.fetch_add(1, Ordering::SeqCst),
            account_id: entry.account_id,
            kind: entry.kind,
            amount: entry.amount,
            created_at: self.next_timestamp(entry.account_id),
        };
        self.appended.push(tx.clone());
        Ok(tx)
    }
}

#[async_trait]
impl<'a> LedgerUnit for MemoryLedgerUnit<'a> {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let unit = *self;

        // Every touched row is locked by us; check them all before applying any
        let touched: Vec<AccountId> = unit
            .balances
            .keys()
            .copied()
            .chain(unit.appended.iter().map(|tx| tx.account_id))
            .collect();
        if let Some(missing) = touched.iter().find(|id| !unit.store.rows.contains_key(*id)) {
            return Err(StoreError::Backend(format!(
                "row {} vanished while locked",
                missing
            )));
        }

        let mut appended_by_account: HashMap<AccountId, Vec<Transaction>> = HashMap::new();
        for tx in unit.appended {
            appended_by_account.entry(tx.account_id).or_default().push(tx);
        }

        for id in touched {
            if let Some(mut row) = unit.store.rows.get_mut(&id) {
                if let Some(balance) = unit.balances.get(&id) {
                    row.account.balance = *balance;
                }
                if let Some(entries) = appended_by_account.remove(&id) {
                    row.log.extend(entries);
                }
            }
        }

        // Row locks are released here, after the new state is visible
        drop(unit.locks);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // Staged writes and lock guards are dropped with the unit
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnit + '_>, StoreError> {
        Ok(Box::new(MemoryLedgerUnit {
            store: self,
            locks: HashMap::new(),
            balances: HashMap::new(),
            appended: Vec::new(),
        }))
    }

    async fn list_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        let mut log = self
            .rows
            .get(&account_id)
            .map(|row| row.log.clone())
            .unwrap_or_default();
        log.reverse();
        Ok(log)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl AccountDirectory for MemoryLedgerStore {
    async fn list(&self) -> Result<Vec<Account>, AccountError> {
        let mut accounts: Vec<Account> = self
            .rows
            .iter()
            .map(|row| row.value().account.clone())
            .collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    async fn get(&self, id: AccountId) -> Result<Account, AccountError> {
        self.committed_account(id).ok_or(AccountError::NotFound(id))
    }

    async fn create(
        &self,
        name: &AccountName,
        opening_balance: Decimal,
    ) -> Result<Account, AccountError> {
        check_opening_balance(opening_balance)?;

        let id = self.next_account_id.fetch_add(1, Ordering::SeqCst);
        let account = Account {
            id,
            name: name.as_str().to_string(),
            balance: opening_balance,
        };
        self.row_locks.insert(id, Arc::new(Mutex::new(())));
        self.rows.insert(
            id,
            AccountRow {
                account: account.clone(),
                log: Vec::new(),
            },
        );
        Ok(account)
    }

    async fn rename(&self, id: AccountId, name: &AccountName) -> Result<Account, AccountError> {
        let mut row = self.rows.get_mut(&id).ok_or(AccountError::NotFound(id))?;
        row.account.name = name.as_str().to_string();
        Ok(row.account.clone())
    }

    async fn delete(&self, id: AccountId) -> Result<(), AccountError> {
        let guard = self
            .acquire_row(id)
            .await?
            .ok_or(AccountError::NotFound(id))?;

        // Cascade: the log goes with the row
        self.rows.remove(&id);
        self.row_locks.remove(&id);
        drop(guard);
        Ok(())
    }
}
