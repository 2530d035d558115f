//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:3000/docs`
//! - OpenAPI JSON: `http://localhost:3000/api-docs/openapi.json`
//!
//! Paths are listed once, relative to the root; the same routes are also
//! served under `/api`.

use utoipa::OpenApi;

use crate::account::Account;
use crate::gateway::error::ErrorBody;
use crate::gateway::types::{
    AmountRequest, CreateAccountRequest, DeleteResponse, HealthResponse,
    LegacyTransactionRequest, LegacyTransactionResponse, TransactionResponse,
    UpdateAccountRequest,
};
use crate::ledger::{Transaction, TransactionKind};

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bank Ledger API",
        version = "0.1.0",
        description = "Account balances with an append-only credit/debit history. Every posting locks its account row and commits balance and log entry together.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::ledger::deposit,
        crate::gateway::handlers::ledger::withdraw,
        crate::gateway::handlers::ledger::transaction_history,
        crate::gateway::handlers::ledger::legacy_transaction,
        crate::gateway::handlers::accounts::list_accounts,
        crate::gateway::handlers::accounts::get_account,
        crate::gateway::handlers::accounts::create_account,
        crate::gateway::handlers::accounts::update_account,
        crate::gateway::handlers::accounts::delete_account,
    ),
    components(
        schemas(
            Account,
            Transaction,
            TransactionKind,
            AmountRequest,
            LegacyTransactionRequest,
            TransactionResponse,
            LegacyTransactionResponse,
            CreateAccountRequest,
            UpdateAccountRequest,
            DeleteResponse,
            HealthResponse,
            ErrorBody,
        )
    ),
    tags(
        (name = "System", description = "Health checks"),
        (name = "Ledger", description = "Deposits, withdrawals and history"),
        (name = "Accounts", description = "Account management"),
    )
)]
pub struct ApiDoc;
