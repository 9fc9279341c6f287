use crate::application::ErrorKind;
use crate::domain::DomainError;
use thiserror::Error;

/// 貸出アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LendingError {
    /// 資料が存在しない
    #[error("Item not found")]
    ItemNotFound,

    /// 利用者が存在しない（登録済み利用者を要求するポリシーの場合）
    #[error("Borrower not found")]
    BorrowerNotFound,

    /// 貸出可能な冊数がない
    #[error("Item is not available for borrowing")]
    ItemUnavailable,

    /// 未返却の貸出がない（未貸出・返却済みの両方を含む）
    #[error("Loan not found or already returned")]
    LoanNotFound,

    /// 返却期限が未来でない
    #[error("Invalid due date: {0}")]
    InvalidDueDate(#[source] DomainError),

    /// ストアのエラー（トランザクションはロールバック済み）
    #[error("Transaction failed")]
    TransactionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LendingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LendingError::ItemNotFound
            | LendingError::BorrowerNotFound
            | LendingError::LoanNotFound => ErrorKind::NotFound,
            LendingError::ItemUnavailable => ErrorKind::Conflict,
            LendingError::InvalidDueDate(_) => ErrorKind::InvalidInput,
            LendingError::TransactionFailed(_) => ErrorKind::StoreFailure,
        }
    }
}

/// 貸出アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LendingError>;
