//! PostgreSQL schema for accounts and the transaction log

use sqlx::PgPool;

/// Account rows. `balance` is guarded by a CHECK as a last line of defence;
/// the engine rejects overdrafts before they reach the database.
pub const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(200) NOT NULL,
    balance NUMERIC NOT NULL DEFAULT 0 CHECK (balance >= 0)
)
"#;

/// Append-only log. Deleting an account removes its history.
///
/// `created_at` uses `clock_timestamp()` rather than `now()`: the row is
/// inserted after the account lock is granted, so timestamps follow lock
/// order instead of transaction start order.
pub const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id BIGSERIAL PRIMARY KEY,
    account_id BIGINT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    amount NUMERIC NOT NULL CHECK (amount > 0),
    type VARCHAR(10) NOT NULL CHECK (type IN ('credit', 'debit')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
)
"#;

pub const CREATE_TRANSACTIONS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_transactions_account_created
    ON transactions (account_id, created_at DESC, id DESC)
"#;

/// Initialize the ledger schema (idempotent)
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Initializing ledger schema...");

    for statement in [
        CREATE_ACCOUNTS_TABLE,
        CREATE_TRANSACTIONS_TABLE,
        CREATE_TRANSACTIONS_INDEX,
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Ledger schema initialized");
    Ok(())
}
