//! Core types used throughout the system
//!
//! Type aliases that give the database keys a name. Both are `BIGSERIAL`
//! columns, hence `i64`.

/// Account ID - primary key of `accounts`, immutable after assignment.
///
/// # Usage:
/// - Path parameter of every `/accounts/{id}` route
/// - Key of the per-account row lock
pub type AccountId = i64;

/// Transaction ID - primary key of `transactions`.
///
/// Allocated from a sequence, so ids of rolled-back units leave gaps.
/// Ordering between two ids of the same account follows commit order.
pub type TransactionId = i64;
