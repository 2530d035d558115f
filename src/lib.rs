//! Bank Ledger - account balances with an append-only transaction history
//!
//! Every credit or debit locks its account row, updates the balance and
//! appends a log entry as one all-or-nothing unit.
//!
//! # Modules
//!
//! - [`core_types`] - Id aliases
//! - [`money`] - Validated amounts and strict decimal parsing
//! - [`ledger`] - Ledger engine, history query, transaction types and errors
//! - [`store`] - Unit-of-work seam with PostgreSQL and in-memory backends
//! - [`account`] - Account model, name validation, CRUD trait
//! - [`db`] - PostgreSQL pool lifecycle and schema
//! - [`config`] - YAML configuration with env overrides
//! - [`logging`] - tracing subscriber setup
//! - [`gateway`] - HTTP API (axum)

// Core types - must be first!
pub mod core_types;

pub mod money;

pub mod account;
pub mod ledger;
pub mod store;

pub mod db;

pub mod config;
pub mod logging;

pub mod gateway;

// Convenient re-exports at crate root
pub use account::{Account, AccountDirectory, AccountError, AccountName};
pub use core_types::{AccountId, TransactionId};
pub use ledger::{HistoryQuery, LedgerEngine, LedgerError, Transaction, TransactionKind};
pub use money::{Amount, MoneyError};
pub use store::{LedgerStore, MemoryLedgerStore, PgLedgerStore, StoreError};
