//! Ledger core: balance changes and their history
//!
//! [`LedgerEngine`] applies credits and debits, each as one atomic unit over
//! the account row and the transaction log. [`HistoryQuery`] reads the log.

pub mod engine;
pub mod error;
pub mod history;
pub mod types;

pub use engine::LedgerEngine;
pub use error::LedgerError;
pub use history::HistoryQuery;
pub use types::{NewTransaction, Posting, Transaction, TransactionKind};
