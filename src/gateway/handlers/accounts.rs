//! Account CRUD handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::super::error::{ApiError, ApiResult, ErrorBody, ok};
use super::super::state::AppState;
use super::super::types::{CreateAccountRequest, DeleteResponse, UpdateAccountRequest};
use super::ledger::unknown_account;
use super::parse_account_id;
use crate::account::{Account, AccountError, AccountName};
use crate::money::parse_opening_balance;

fn request_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request("INVALID_REQUEST", rejection.body_text())
}

fn account_name(name: Option<&str>) -> Result<AccountName, ApiError> {
    Ok(AccountName::new(name.unwrap_or_default()).map_err(AccountError::from)?)
}

/// List all accounts
#[utoipa::path(
    get,
    path = "/accounts",
    responses(
        (status = 200, description = "Accounts ordered by id", body = Vec<Account>),
        (status = 500, description = "Persistence error", body = ErrorBody)
    ),
    tag = "Accounts"
)]
pub async fn list_accounts(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Account>> {
    ok(state.accounts.list().await?)
}

/// Get one account
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    params(("id" = i64, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account", body = Account),
        (status = 404, description = "Account not found", body = ErrorBody)
    ),
    tag = "Accounts"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Account> {
    let account_id = parse_account_id(&id).ok_or_else(|| unknown_account(&id))?;
    ok(state.accounts.get(account_id).await?)
}

/// Create an account with an optional opening balance
#[utoipa::path(
    post,
    path = "/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 400, description = "Invalid name or balance", body = ErrorBody),
        (status = 500, description = "Persistence error", body = ErrorBody)
    ),
    tag = "Accounts"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let Json(req) = body.map_err(request_rejection)?;
    let name = account_name(req.name.as_deref())?;
    let balance = parse_opening_balance(req.balance.as_ref()).map_err(AccountError::from)?;

    let account = state.accounts.create(&name, balance).await?;
    tracing::info!(account_id = account.id, balance = %account.balance, "Account created");
    Ok((StatusCode::CREATED, Json(account)))
}

/// Rename an account
///
/// The balance is not writable here; use deposit and withdraw.
#[utoipa::path(
    put,
    path = "/accounts/{id}",
    params(("id" = i64, Path, description = "Account ID")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = Account),
        (status = 400, description = "Invalid name, or balance supplied", body = ErrorBody),
        (status = 404, description = "Account not found", body = ErrorBody)
    ),
    tag = "Accounts"
)]
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> ApiResult<Account> {
    let Json(req) = body.map_err(request_rejection)?;
    if req.balance.is_some() {
        return ApiError::from(AccountError::BalanceNotWritable).into_err();
    }
    let name = account_name(req.name.as_deref())?;

    let account_id = parse_account_id(&id).ok_or_else(|| unknown_account(&id))?;
    ok(state.accounts.rename(account_id, &name).await?)
}

/// Delete an account and its transaction history
#[utoipa::path(
    delete,
    path = "/accounts/{id}",
    params(("id" = i64, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deleted", body = DeleteResponse),
        (status = 404, description = "Account not found", body = ErrorBody),
        (status = 500, description = "Persistence error", body = ErrorBody)
    ),
    tag = "Accounts"
)]
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<DeleteResponse> {
    let account_id = parse_account_id(&id).ok_or_else(|| unknown_account(&id))?;
    state.accounts.delete(account_id).await?;
    tracing::info!(account_id, "Account deleted");
    ok(DeleteResponse { success: true })
}
