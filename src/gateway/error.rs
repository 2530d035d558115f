//! HTTP error mapping
//!
//! Every failure leaves the gateway as `{ "error": <message>, "code": <CODE> }`
//! with the status taken from the domain error.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::account::AccountError;
use crate::ledger::LedgerError;
use crate::money::MoneyError;

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "Insufficient funds: balance 100, requested 150")]
    pub error: String,
    #[schema(example = "INSUFFICIENT_FUNDS")]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub msg: String,
}

/// Handler result: JSON body on success, [`ApiError`] otherwise
pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(data))
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, msg)
    }

    pub fn not_found(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, msg)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg)
    }

    pub fn into_err<T>(self) -> ApiResult<T> {
        Err(self)
    }

    fn from_status(status: u16, code: &'static str, msg: String) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, code, msg)
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        // Store details stay in the logs
        let msg = match &e {
            LedgerError::Persistence(_) => "Ledger is temporarily unavailable".to_string(),
            other => other.to_string(),
        };
        Self::from_status(e.http_status(), e.code(), msg)
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        let msg = match &e {
            AccountError::Store(inner) => {
                tracing::error!(error = %inner, "Account store failure");
                "Account store is temporarily unavailable".to_string()
            }
            other => other.to_string(),
        };
        Self::from_status(e.http_status(), e.code(), msg)
    }
}

impl From<MoneyError> for ApiError {
    fn from(e: MoneyError) -> Self {
        LedgerError::InvalidAmount(e).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.msg,
            code: self.code.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use rust_decimal::Decimal;

    #[test]
    fn test_ledger_error_mapping() {
        let e: ApiError = LedgerError::AccountNotFound(3).into();
        assert_eq!(e.status, StatusCode::NOT_FOUND);
        assert_eq!(e.code, "ACCOUNT_NOT_FOUND");

        let e: ApiError = LedgerError::InsufficientFunds {
            available: Decimal::from(100),
            requested: Decimal::from(150),
        }
        .into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.code, "INSUFFICIENT_FUNDS");

        let e: ApiError = MoneyError::NotPositive.into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.code, "INVALID_AMOUNT");
    }

    #[test]
    fn test_persistence_details_are_hidden() {
        let e: ApiError =
            LedgerError::Persistence(StoreError::Backend("relation missing".into())).into();
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.code, "PERSISTENCE_ERROR");
        assert!(!e.msg.contains("relation"));
    }

    #[test]
    fn test_account_error_mapping() {
        let e: ApiError = AccountError::BalanceNotWritable.into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.code, "BALANCE_NOT_WRITABLE");

        let e: ApiError = AccountError::NotFound(9).into();
        assert_eq!(e.status, StatusCode::NOT_FOUND);
    }
}
