//! Ledger engine: one credit or debit as one atomic unit
//!
//! ```text
//! Started ─▶ Validated ─▶ Locked ─┬─▶ Committed
//!    │                            ├─▶ RejectedNotFound          (rollback)
//!    │                            ├─▶ RejectedInsufficientFunds (rollback)
//!    │                            └─▶ RolledBackOnFailure
//!    └─▶ RejectedInvalidAmount (no store access)
//! ```
//!
//! The unit is owned by the call. Every early return drops or rolls back
//! the unit, which releases the row lock; the same happens if the request
//! future is cancelled between `begin` and `commit`.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::error::LedgerError;
use super::types::{NewTransaction, Posting, Transaction, TransactionKind};
use crate::core_types::AccountId;
use crate::money::{Amount, MoneyError};
use crate::store::{LedgerStore, LedgerUnit};

/// Applies balance changes against an injected [`LedgerStore`]
#[derive(Clone)]
pub struct LedgerEngine {
    store: Arc<dyn LedgerStore>,
}

impl LedgerEngine {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Apply `amount` to the account and return the created transaction.
    ///
    /// The amount is validated before the store is touched.
    pub async fn apply(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        amount: Decimal,
    ) -> Result<Transaction, LedgerError> {
        let amount = Amount::new(amount)?;
        Ok(self.post(account_id, kind, amount).await?.transaction)
    }

    pub async fn credit(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Transaction, LedgerError> {
        self.apply(account_id, TransactionKind::Credit, amount).await
    }

    pub async fn debit(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Transaction, LedgerError> {
        self.apply(account_id, TransactionKind::Debit, amount).await
    }

    /// Apply an already validated amount; also returns the resulting balance.
    pub async fn post(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        amount: Amount,
    ) -> Result<Posting, LedgerError> {
        let unit = self.store.begin().await.map_err(|e| {
            error!(account_id, %kind, error = %e, "Failed to open ledger unit");
            LedgerError::Persistence(e)
        })?;

        match Self::run(unit, account_id, kind, amount).await {
            Ok(posting) => {
                info!(
                    account_id,
                    %kind,
                    amount = %amount,
                    balance = %posting.balance,
                    tx_id = posting.transaction.id,
                    "Posting committed"
                );
                Ok(posting)
            }
            Err(e) if e.is_rejection() => {
                warn!(account_id, %kind, amount = %amount, reason = %e, "Posting rejected");
                Err(e)
            }
            Err(e) => {
                error!(account_id, %kind, amount = %amount, error = %e, "Posting rolled back");
                Err(e)
            }
        }
    }

    async fn run(
        mut unit: Box<dyn LedgerUnit + '_>,
        account_id: AccountId,
        kind: TransactionKind,
        amount: Amount,
    ) -> Result<Posting, LedgerError> {
        // Existence check and lock are one read
        let account = match unit.lock_for_update(account_id).await? {
            Some(account) => account,
            None => {
                release(unit).await;
                return Err(LedgerError::AccountNotFound(account_id));
            }
        };
        debug!(account_id, balance = %account.balance, "Account locked");

        if kind == TransactionKind::Debit && !account.can_cover(amount.value()) {
            release(unit).await;
            return Err(LedgerError::InsufficientFunds {
                available: account.balance,
                requested: amount.value(),
            });
        }

        let Some(balance) = kind.next_balance(account.balance, amount) else {
            release(unit).await;
            return Err(MoneyError::Overflow {
                balance: account.balance,
                amount: amount.value(),
            }
            .into());
        };

        unit.write_balance(account_id, balance).await?;
        let transaction = unit
            .append(NewTransaction {
                account_id,
                kind,
                amount,
            })
            .await?;
        unit.commit().await?;

        Ok(Posting {
            transaction,
            balance,
        })
    }
}

/// Roll back a unit after a business rejection.
///
/// The rejection is the result the caller sees; a failed rollback has
/// already released the lock (the unit is gone) and is only logged.
async fn release(unit: Box<dyn LedgerUnit + '_>) {
    if let Err(e) = unit.rollback().await {
        warn!(error = %e, "Rollback after rejection failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, AccountDirectory, AccountName};
    use crate::store::{AccountStore, MemoryLedgerStore, StoreError, TransactionLog};
    use async_trait::async_trait;
    use futures::future::join_all;
    use std::time::Duration;

    async fn setup(balance: i64) -> (Arc<MemoryLedgerStore>, LedgerEngine, AccountId) {
        let store = Arc::new(MemoryLedgerStore::new());
        let account = store
            .create(&AccountName::new("test").unwrap(), Decimal::from(balance))
            .await
            .unwrap();
        let engine = LedgerEngine::new(store.clone());
        (store, engine, account.id)
    }

    #[tokio::test]
    async fn test_deposit_into_empty_account() {
        let (store, engine, id) = setup(0).await;

        let tx = engine.credit(id, Decimal::from(100)).await.unwrap();
        assert_eq!(tx.amount.value(), Decimal::from(100));
        assert_eq!(tx.kind, TransactionKind::Credit);
        assert_eq!(tx.account_id, id);

        assert_eq!(store.get(id).await.unwrap().balance, Decimal::from(100));
        assert_eq!(store.list_by_account(id).await.unwrap(), vec![tx]);
    }

    #[tokio::test]
    async fn test_overdraft_is_rejected_without_effect() {
        let (store, engine, id) = setup(100).await;

        let err = engine.debit(id, Decimal::from(150)).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                available: Decimal::from(100),
                requested: Decimal::from(150),
            }
        );
        assert_eq!(store.get(id).await.unwrap().balance, Decimal::from(100));
        assert!(store.list_by_account(id).await.unwrap().is_empty());

        // Lock was released by the rejection
        engine.debit(id, Decimal::from(100)).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().balance, Decimal::ZERO);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_concurrent_deposits() {
        let (store, engine, id) = setup(0).await;

        let (a, b) = tokio::join!(
            engine.credit(id, Decimal::from(50)),
            engine.credit(id, Decimal::from(50))
        );
        assert!(a.is_ok() && b.is_ok());

        assert_eq!(store.get(id).await.unwrap().balance, Decimal::from(100));
        let log = store.list_by_account(id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|tx| tx.amount.value() == Decimal::from(50)));
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let (store, engine, _) = setup(0).await;

        let err = engine.credit(999, Decimal::from(10)).await.unwrap_err();
        assert_eq!(err, LedgerError::AccountNotFound(999));
        assert!(store.list_by_account(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_credit_overflow_rolls_back() {
        let store = Arc::new(MemoryLedgerStore::new());
        let id = store
            .create(&AccountName::new("full").unwrap(), Decimal::MAX)
            .await
            .unwrap()
            .id;
        let engine = LedgerEngine::new(store.clone());

        let err = engine.credit(id, Decimal::ONE).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidAmount(MoneyError::Overflow {
                balance: Decimal::MAX,
                amount: Decimal::ONE,
            })
        );
        assert_eq!(err.http_status(), 400);
        assert!(store.list_by_account(id).await.unwrap().is_empty());
        assert_eq!(store.get(id).await.unwrap().balance, Decimal::MAX);

        // Lock released by the rollback
        engine.debit(id, Decimal::ONE).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_amount_takes_no_lock() {
        let (store, engine, id) = setup(10).await;

        for amount in [Decimal::ZERO, Decimal::from(-5)] {
            let err = engine.credit(id, amount).await.unwrap_err();
            assert_eq!(err, LedgerError::InvalidAmount(MoneyError::NotPositive));
        }
        assert_eq!(store.lock_grants(), 0);
        assert!(store.list_by_account(id).await.unwrap().is_empty());
        assert_eq!(store.get(id).await.unwrap().balance, Decimal::from(10));
    }

    #[tokio::test]
    async fn test_post_returns_new_balance() {
        let (_store, engine, id) = setup(20).await;

        let amount = Amount::new(Decimal::new(525, 2)).unwrap();
        let posting = engine
            .post(id, TransactionKind::Debit, amount)
            .await
            .unwrap();
        assert_eq!(posting.balance, Decimal::new(1475, 2));
        assert_eq!(posting.transaction.kind, TransactionKind::Debit);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_credits_lose_no_update() {
        let (store, engine, id) = setup(7).await;
        let n = 64;

        let results = join_all((0..n).map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.credit(id, Decimal::new(25, 1)).await })
        }))
        .await;
        assert!(results.into_iter().all(|r| matches!(r, Ok(Ok(_)))));

        let expected = Decimal::from(7) + Decimal::new(25, 1) * Decimal::from(n);
        assert_eq!(store.get(id).await.unwrap().balance, expected);
        assert_eq!(store.list_by_account(id).await.unwrap().len(), n as usize);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_debits_never_overdraw() {
        let (store, engine, id) = setup(100).await;

        // 30 debits of 10 against 100: exactly 10 can succeed
        let results = join_all((0..30).map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.debit(id, Decimal::from(10)).await })
        }))
        .await;

        let mut ok = 0;
        let mut rejected = 0;
        for result in results {
            match result.unwrap() {
                Ok(_) => ok += 1,
                Err(LedgerError::InsufficientFunds { .. }) => rejected += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!((ok, rejected), (10, 20));
        assert_eq!(store.get(id).await.unwrap().balance, Decimal::ZERO);
        assert_eq!(store.list_by_account(id).await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_lock_timeout_is_persistence_error() {
        let store = Arc::new(MemoryLedgerStore::with_lock_timeout(Duration::from_millis(20)));
        let id = store
            .create(&AccountName::new("busy").unwrap(), Decimal::from(5))
            .await
            .unwrap()
            .id;
        let engine = LedgerEngine::new(store.clone());

        let mut holder = store.begin().await.unwrap();
        holder.lock_for_update(id).await.unwrap();

        let err = engine.credit(id, Decimal::ONE).await.unwrap_err();
        assert_eq!(err, LedgerError::Persistence(StoreError::LockTimeout));

        holder.rollback().await.unwrap();
        assert_eq!(store.get(id).await.unwrap().balance, Decimal::from(5));
        assert!(store.list_by_account(id).await.unwrap().is_empty());
    }

    // ------------------------------------------------------------------
    // A store whose log refuses appends, to exercise the write-phase rollback
    // ------------------------------------------------------------------

    struct BrokenLogStore {
        inner: MemoryLedgerStore,
    }

    struct BrokenLogUnit<'a> {
        inner: Box<dyn LedgerUnit + 'a>,
    }

    #[async_trait]
    impl<'a> AccountStore for BrokenLogUnit<'a> {
        async fn lock_for_update(
            &mut self,
            account_id: AccountId,
        ) -> Result<Option<Account>, StoreError> {
            self.inner.lock_for_update(account_id).await
        }

        async fn write_balance(
            &mut self,
            account_id: AccountId,
            balance: Decimal,
        ) -> Result<(), StoreError> {
            self.inner.write_balance(account_id, balance).await
        }
    }

    #[async_trait]
    impl<'a> TransactionLog for BrokenLogUnit<'a> {
        async fn append(&mut self, _entry: NewTransaction) -> Result<Transaction, StoreError> {
            Err(StoreError::Unavailable("log offline".to_string()))
        }
    }

    #[async_trait]
    impl<'a> LedgerUnit for BrokenLogUnit<'a> {
        async fn commit(self: Box<Self>) -> Result<(), StoreError> {
            self.inner.commit().await
        }

        async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
            self.inner.rollback().await
        }
    }

    #[async_trait]
    impl LedgerStore for BrokenLogStore {
        async fn begin(&self) -> Result<Box<dyn LedgerUnit + '_>, StoreError> {
            Ok(Box::new(BrokenLogUnit {
                inner: self.inner.begin().await?,
            }))
        }

        async fn list_by_account(
            &self,
            account_id: AccountId,
        ) -> Result<Vec<Transaction>, StoreError> {
            self.inner.list_by_account(account_id).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            self.inner.ping().await
        }
    }

    #[tokio::test]
    async fn test_failed_append_rolls_back_balance() {
        let inner = MemoryLedgerStore::new();
        let id = inner
            .create(&AccountName::new("a").unwrap(), Decimal::from(40))
            .await
            .unwrap()
            .id;
        let store = Arc::new(BrokenLogStore { inner });
        let engine = LedgerEngine::new(store.clone());

        let err = engine.debit(id, Decimal::from(15)).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Persistence(StoreError::Unavailable(_))
        ));
        assert!(!err.is_rejection());

        assert_eq!(
            store.inner.get(id).await.unwrap().balance,
            Decimal::from(40)
        );
        assert!(store.list_by_account(id).await.unwrap().is_empty());

        // The row lock did not leak
        let mut unit = store.inner.begin().await.unwrap();
        assert!(unit.lock_for_update(id).await.unwrap().is_some());
    }
}
