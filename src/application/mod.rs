pub mod catalog;
pub mod lending;

use crate::ports::{Catalog, LedgerStore};
use std::sync::Arc;

/// エラーの分類
///
/// API層はこの分類でHTTPステータスを決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 資料・貸出・利用者が存在しない
    NotFound,
    /// 貸出可能な冊数がない、または削除できない状態
    Conflict,
    /// 入力値が不正
    InvalidInput,
    /// ストアの障害
    StoreFailure,
}

/// 貸出の運用ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingPolicy {
    /// 貸出時に利用者がカタログに登録済みであることを要求する
    pub require_registered_borrower: bool,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            require_registered_borrower: true,
        }
    }
}

/// サービスの依存関係
///
/// データ構造として定義し、振る舞いは持たない。
/// 各ユースケースは関数として実装し、依存関係を引数で受け取る。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub ledger_store: Arc<dyn LedgerStore>,
    pub catalog: Arc<dyn Catalog>,
    pub policy: LendingPolicy,
}
