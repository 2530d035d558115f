//! Account management module
//!
//! Account records (id, name, balance) and the CRUD surface used by the
//! HTTP layer. Balances are read here but only ever written by
//! [`crate::ledger::LedgerEngine`].

pub mod directory;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use directory::{AccountDirectory, AccountError};
pub use models::{Account, PRIMARY_ACCOUNT_NAME};
pub use validation::{AccountName, ValidationError};
