use std::sync::Arc;

use crate::account::AccountDirectory;
use crate::ledger::{HistoryQuery, LedgerEngine};
use crate::store::LedgerStore;

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    pub engine: LedgerEngine,
    pub history: HistoryQuery,
    pub accounts: Arc<dyn AccountDirectory>,
    /// Kept for health checks
    pub store: Arc<dyn LedgerStore>,
}

impl AppState {
    /// Wire every service to one store, so account rows, balances and the
    /// log live in the same place.
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: LedgerStore + AccountDirectory + 'static,
    {
        let ledger: Arc<dyn LedgerStore> = store.clone();
        Self {
            engine: LedgerEngine::new(ledger.clone()),
            history: HistoryQuery::new(ledger.clone()),
            accounts: store,
            store: ledger,
        }
    }
}
