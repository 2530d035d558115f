//! Read-only access to an account's transaction history

use std::sync::Arc;

use super::error::LedgerError;
use super::types::Transaction;
use crate::core_types::AccountId;
use crate::store::LedgerStore;

#[derive(Clone)]
pub struct HistoryQuery {
    store: Arc<dyn LedgerStore>,
}

impl HistoryQuery {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Committed transactions of `account_id`, newest first.
    ///
    /// An account without transactions (or an unknown id) yields an empty
    /// list. Takes no locks.
    pub async fn history(&self, account_id: AccountId) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.store.list_by_account(account_id).await?)
    }
}
