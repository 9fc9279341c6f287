use crate::application::ErrorKind;
use crate::domain::DomainError;
use thiserror::Error;

/// カタログアプリケーション層のエラー
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Item not found")]
    ItemNotFound,

    #[error("Borrower not found")]
    BorrowerNotFound,

    /// 貸出履歴がある資料の削除
    #[error("Item has loan history and cannot be deleted")]
    ItemInUse,

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] DomainError),

    #[error("Catalog store error")]
    StoreFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::ItemNotFound | CatalogError::BorrowerNotFound => ErrorKind::NotFound,
            CatalogError::ItemInUse => ErrorKind::Conflict,
            CatalogError::InvalidInput(_) => ErrorKind::InvalidInput,
            CatalogError::StoreFailure(_) => ErrorKind::StoreFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
