use crate::application::{ErrorKind, catalog::CatalogError, lending::LendingError};
use crate::domain::DomainError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
/// ステータスはエラーの分類（`ErrorKind`）で決まる。
#[derive(Debug)]
pub enum ApiError {
    Lending(LendingError),
    Catalog(CatalogError),
}

impl From<LendingError> for ApiError {
    fn from(err: LendingError) -> Self {
        ApiError::Lending(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Catalog(CatalogError::InvalidInput(err))
    }
}

impl ApiError {
    fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Lending(e) => e.kind(),
            ApiError::Catalog(e) => e.kind(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Lending(e) => match e {
                LendingError::ItemNotFound => "ITEM_NOT_FOUND",
                LendingError::BorrowerNotFound => "BORROWER_NOT_FOUND",
                LendingError::ItemUnavailable => "ITEM_UNAVAILABLE",
                LendingError::LoanNotFound => "LOAN_NOT_FOUND",
                LendingError::InvalidDueDate(_) => "INVALID_DUE_DATE",
                LendingError::TransactionFailed(_) => "TRANSACTION_FAILED",
            },
            ApiError::Catalog(e) => match e {
                CatalogError::ItemNotFound => "ITEM_NOT_FOUND",
                CatalogError::BorrowerNotFound => "BORROWER_NOT_FOUND",
                CatalogError::ItemInUse => "ITEM_IN_USE",
                CatalogError::InvalidInput(_) => "INVALID_INPUT",
                CatalogError::StoreFailure(_) => "STORE_FAILURE",
            },
        }
    }

    fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::StoreFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match self.kind() {
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            ErrorKind::StoreFailure => {
                let source = match &self {
                    ApiError::Lending(LendingError::TransactionFailed(e))
                    | ApiError::Catalog(CatalogError::StoreFailure(e)) => e.to_string(),
                    other => format!("{:?}", other),
                };
                tracing::error!(code, error = %source, "Store failure");
                "An unexpected error occurred".to_string()
            }
            _ => match &self {
                ApiError::Lending(e) => e.to_string(),
                ApiError::Catalog(e) => e.to_string(),
            },
        };

        let body = Json(ErrorResponse::new(code, message));
        (status, body).into_response()
    }
}
