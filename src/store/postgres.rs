//! PostgreSQL ledger store
//!
//! A unit of work is one database transaction. The account row is locked
//! with `SELECT ... FOR UPDATE`; waiting is bounded by `SET LOCAL
//! lock_timeout`. Dropping an uncommitted `sqlx::Transaction` rolls it back,
//! which releases the row lock.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use super::{AccountStore, LedgerStore, LedgerUnit, StoreError, TransactionLog};
use crate::account::directory::check_opening_balance;
use crate::account::{Account, AccountDirectory, AccountError, AccountName};
use crate::core_types::AccountId;
use crate::db::SafeRow;
use crate::ledger::types::{NewTransaction, Transaction, TransactionKind};
use crate::money::Amount;

/// SQLSTATE `lock_not_available`, raised when `lock_timeout` expires
const LOCK_NOT_AVAILABLE: &str = "55P03";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(LOCK_NOT_AVAILABLE) => {
                StoreError::LockTimeout
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(e.to_string()),
            _ => StoreError::Backend(e.to_string()),
        }
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get_log(name)
        .ok_or_else(|| StoreError::Backend(format!("unreadable column '{}'", name)))
}

fn account_from_row(row: &PgRow) -> Result<Account, StoreError> {
    Ok(Account {
        id: column(row, "id")?,
        name: column(row, "name")?,
        balance: column(row, "balance")?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction, StoreError> {
    let kind: String = column(row, "type")?;
    let amount: Decimal = column(row, "amount")?;
    Ok(Transaction {
        id: column(row, "id")?,
        account_id: column(row, "account_id")?,
        kind: kind.parse::<TransactionKind>().map_err(StoreError::Backend)?,
        amount: Amount::new(amount)
            .map_err(|e| StoreError::Backend(format!("stored amount {}: {}", amount, e)))?,
        created_at: column(row, "created_at")?,
    })
}

/// Ledger store backed by the shared connection pool
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    /// Begin a transaction with the configured lock timeout applied
    async fn begin_tx(&self) -> Result<sqlx::Transaction<'static, Postgres>, StoreError> {
        let mut tx = self.pool.begin().await?;
        // SET does not take bind parameters; the value is an integer we own
        let set_timeout = format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        );
        sqlx::query(&set_timeout).execute(&mut *tx).await?;
        Ok(tx)
    }
}

/// One database transaction
pub struct PgLedgerUnit {
    tx: sqlx::Transaction<'static, Postgres>,
    locked: HashSet<AccountId>,
}

impl PgLedgerUnit {
    fn ensure_locked(&self, account_id: AccountId) -> Result<(), StoreError> {
        if self.locked.contains(&account_id) {
            Ok(())
        } else {
            Err(StoreError::NotLocked(account_id))
        }
    }
}

#[async_trait]
impl AccountStore for PgLedgerUnit {
    async fn lock_for_update(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query("SELECT id, name, balance FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(account_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        match row {
            Some(row) => {
                self.locked.insert(account_id);
                debug!(account_id, "Row lock granted");
                Ok(Some(account_from_row(&row)?))
            }
            None => Ok(None),
        }
    }

    async fn write_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
    ) -> Result<(), StoreError> {
        self.ensure_locked(account_id)?;

        let result = sqlx::query("UPDATE accounts SET balance = $1 WHERE id = $2")
            .bind(balance)
            .bind(account_id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() != 1 {
            return Err(StoreError::Backend(format!(
                "balance update touched {} rows for account {}",
                result.rows_affected(),
                account_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionLog for PgLedgerUnit {
    async fn append(&mut self, entry: NewTransaction) -> Result<Transaction, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO transactions (account_id, amount, type)
            VALUES ($1, $2, $3)
            RETURNING id, account_id, amount, type, created_at
            "#,
        )
        .bind(entry.account_id)
        .bind(entry.amount.value())
        .bind(entry.kind.as_str())
        .fetch_one(&mut *self.tx)
        .await?;

        transaction_from_row(&row)
    }
}

#[async_trait]
impl LedgerUnit for PgLedgerUnit {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnit + '_>, StoreError> {
        let tx = self.begin_tx().await?;
        Ok(Box::new(PgLedgerUnit {
            tx,
            locked: HashSet::new(),
        }))
    }

    async fn list_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, amount, type, created_at
            FROM transactions
            WHERE account_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl AccountDirectory for PgLedgerStore {
    async fn list(&self) -> Result<Vec<Account>, AccountError> {
        let rows = sqlx::query("SELECT id, name, balance FROM accounts ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from)?;

        Ok(rows
            .iter()
            .map(account_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get(&self, id: AccountId) -> Result<Account, AccountError> {
        let row = sqlx::query("SELECT id, name, balance FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;

        match row {
            Some(row) => Ok(account_from_row(&row)?),
            None => Err(AccountError::NotFound(id)),
        }
    }

    async fn create(
        &self,
        name: &AccountName,
        opening_balance: Decimal,
    ) -> Result<Account, AccountError> {
        check_opening_balance(opening_balance)?;

        let row = sqlx::query(
            "INSERT INTO accounts (name, balance) VALUES ($1, $2) RETURNING id, name, balance",
        )
        .bind(name.as_str())
        .bind(opening_balance)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(account_from_row(&row)?)
    }

    async fn rename(&self, id: AccountId, name: &AccountName) -> Result<Account, AccountError> {
        let row = sqlx::query(
            "UPDATE accounts SET name = $1 WHERE id = $2 RETURNING id, name, balance",
        )
        .bind(name.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;

        match row {
            Some(row) => Ok(account_from_row(&row)?),
            None => Err(AccountError::NotFound(id)),
        }
    }

    async fn delete(&self, id: AccountId) -> Result<(), AccountError> {
        // DELETE waits for the row lock of any in-flight posting; the
        // transaction bounds that wait with lock_timeout
        let mut tx = self.begin_tx().await?;
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        if result.rows_affected() == 0 {
            if let Err(e) = tx.rollback().await {
                warn!(account_id = id, error = %e, "Rollback after empty delete failed");
            }
            return Err(AccountError::NotFound(id));
        }

        tx.commit().await.map_err(StoreError::from)?;
        Ok(())
    }
}
