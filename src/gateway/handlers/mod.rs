//! HTTP handlers
//!
//! - [`ledger`]: deposit, withdraw, history and the combined transaction form
//! - [`accounts`]: account CRUD
//! - [`health`]: liveness and the root banner

pub mod accounts;
pub mod health;
pub mod ledger;

pub use accounts::{create_account, delete_account, get_account, list_accounts, update_account};
pub use health::{health_check, root};
pub use ledger::{deposit, legacy_transaction, transaction_history, withdraw};

use crate::core_types::AccountId;

/// Parse a path id. Anything that is not an integer names no account.
pub(crate) fn parse_account_id(raw: &str) -> Option<AccountId> {
    raw.trim().parse().ok()
}
