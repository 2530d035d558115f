//! Ledger handlers: deposit, withdraw, history

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde_json::Value;

use super::super::error::{ApiError, ApiResult, ErrorBody, ok};
use super::super::state::AppState;
use super::super::types::{
    AmountRequest, LegacyTransactionRequest, LegacyTransactionResponse, TransactionResponse,
};
use super::parse_account_id;
use crate::core_types::AccountId;
use crate::ledger::{Transaction, TransactionKind};
use crate::money::{Amount, MoneyError};

/// A body that is not JSON (or not an object) carries no usable amount
fn amount_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::from(MoneyError::InvalidFormat(rejection.body_text()))
}

pub(crate) fn unknown_account(raw_id: &str) -> ApiError {
    ApiError::not_found("ACCOUNT_NOT_FOUND", format!("Account not found: {}", raw_id))
}

/// Validate the amount first, then resolve the account id.
async fn post_to_account(
    state: &AppState,
    raw_id: &str,
    kind: TransactionKind,
    body: Result<Json<AmountRequest>, JsonRejection>,
) -> ApiResult<TransactionResponse> {
    let Json(req) = body.map_err(amount_rejection)?;
    let amount = Amount::from_json(req.amount.as_ref())?;

    let account_id = parse_account_id(raw_id).ok_or_else(|| unknown_account(raw_id))?;

    let posting = state.engine.post(account_id, kind, amount).await?;
    ok(TransactionResponse {
        transaction: posting.transaction,
    })
}

/// Deposit into an account
///
/// POST /accounts/{id}/deposit
#[utoipa::path(
    post,
    path = "/accounts/{id}/deposit",
    params(("id" = i64, Path, description = "Account ID")),
    request_body = AmountRequest,
    responses(
        (status = 200, description = "Credit committed", body = TransactionResponse),
        (status = 400, description = "Invalid amount", body = ErrorBody),
        (status = 404, description = "Account not found", body = ErrorBody),
        (status = 500, description = "Persistence error", body = ErrorBody)
    ),
    tag = "Ledger"
)]
pub async fn deposit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<AmountRequest>, JsonRejection>,
) -> ApiResult<TransactionResponse> {
    post_to_account(&state, &id, TransactionKind::Credit, body).await
}

/// Withdraw from an account
///
/// POST /accounts/{id}/withdraw
#[utoipa::path(
    post,
    path = "/accounts/{id}/withdraw",
    params(("id" = i64, Path, description = "Account ID")),
    request_body = AmountRequest,
    responses(
        (status = 200, description = "Debit committed", body = TransactionResponse),
        (status = 400, description = "Invalid amount or insufficient funds", body = ErrorBody),
        (status = 404, description = "Account not found", body = ErrorBody),
        (status = 500, description = "Persistence error", body = ErrorBody)
    ),
    tag = "Ledger"
)]
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<AmountRequest>, JsonRejection>,
) -> ApiResult<TransactionResponse> {
    post_to_account(&state, &id, TransactionKind::Debit, body).await
}

/// Transaction history, newest first
///
/// GET /accounts/{id}/transactions
#[utoipa::path(
    get,
    path = "/accounts/{id}/transactions",
    params(("id" = i64, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Committed transactions, newest first", body = Vec<Transaction>),
        (status = 500, description = "Persistence error", body = ErrorBody)
    ),
    tag = "Ledger"
)]
pub async fn transaction_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Transaction>> {
    let Some(account_id) = parse_account_id(&id) else {
        return ok(Vec::new());
    };
    ok(state.history.history(account_id).await?)
}

/// Account id from the combined form: JSON integer or integer string
fn legacy_account_id(value: Option<&Value>) -> Option<AccountId> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => parse_account_id(s),
        _ => None,
    }
}

/// Credit or debit through one endpoint
///
/// POST /accounts/transaction
///
/// Goes through the same locked unit as deposit and withdraw.
#[utoipa::path(
    post,
    path = "/accounts/transaction",
    request_body = LegacyTransactionRequest,
    responses(
        (status = 200, description = "Posting committed", body = LegacyTransactionResponse),
        (status = 400, description = "Invalid type, invalid amount or insufficient funds", body = ErrorBody),
        (status = 404, description = "Account not found", body = ErrorBody),
        (status = 500, description = "Persistence error", body = ErrorBody)
    ),
    tag = "Ledger"
)]
pub async fn legacy_transaction(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LegacyTransactionRequest>, JsonRejection>,
) -> ApiResult<LegacyTransactionResponse> {
    let Json(req) = body.map_err(amount_rejection)?;

    let kind = match req.kind.as_ref() {
        Some(Value::String(s)) => s.parse::<TransactionKind>().ok(),
        _ => None,
    }
    .ok_or_else(|| ApiError::bad_request("INVALID_TYPE", "Invalid transaction type"))?;

    let amount = Amount::from_json(req.amount.as_ref())?;

    let account_id = legacy_account_id(req.account_id.as_ref()).ok_or_else(|| {
        let raw = req.account_id.as_ref().map(Value::to_string).unwrap_or_default();
        unknown_account(&raw)
    })?;

    let posting = state.engine.post(account_id, kind, amount).await?;
    ok(LegacyTransactionResponse {
        account_id,
        new_balance: posting.balance,
    })
}
