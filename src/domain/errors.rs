use chrono::{DateTime, Utc};
use thiserror::Error;

/// ドメイン層の検証エラー
///
/// 入力値の形式や業務上の前提条件の違反を表す。
/// ストアに到達する前に検出される。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// 返却期限が貸出時刻より後でない
    #[error("Due date {due_at} must be after {requested_at}")]
    InvalidDueDate {
        requested_at: DateTime<Utc>,
        due_at: DateTime<Utc>,
    },

    /// フィールドの値が不正
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    /// 更新・検索で1つもフィールドが指定されていない
    #[error("At least one of {0} must be provided")]
    NothingToApply(&'static str),
}
