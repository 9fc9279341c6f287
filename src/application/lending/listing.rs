use crate::application::ServiceDependencies;
use crate::domain::value_objects::{BorrowerId, ItemId};
use crate::ports::{OpenLoan, OverdueLoan};
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};

use super::errors::{LendingError, Result};

/// 利用者の貸出中一覧（読み取り専用）
///
/// 返却期限の近い順。ストリームは遅延評価で、
/// 呼び出すたびに最新の台帳から読み直す。
pub fn list_open_loans_for_borrower(
    deps: &ServiceDependencies,
    borrower_id: BorrowerId,
) -> BoxStream<'_, Result<OpenLoan>> {
    deps.ledger_store
        .open_loans_for_borrower(borrower_id)
        .map_err(LendingError::TransactionFailed)
        .boxed()
}

/// 延滞一覧（読み取り専用）
///
/// 現在時刻で判定する。詳細は `list_overdue_at` を参照。
pub fn list_overdue(deps: &ServiceDependencies) -> BoxStream<'_, Result<OverdueLoan>> {
    list_overdue_at(deps, Utc::now())
}

/// `now` 時点の延滞一覧
///
/// 未返却かつ返却期限が `now` より前のエントリを、返却期限の昇順で返す。
pub fn list_overdue_at(
    deps: &ServiceDependencies,
    now: DateTime<Utc>,
) -> BoxStream<'_, Result<OverdueLoan>> {
    deps.ledger_store
        .overdue_loans(now)
        .map_err(LendingError::TransactionFailed)
        .boxed()
}

/// 表示用の貸出可能数
///
/// 貸出の可否判定には使わない。貸出は条件付き減算だけで判定する。
pub async fn item_availability(deps: &ServiceDependencies, item_id: ItemId) -> Result<u32> {
    deps.ledger_store
        .item_availability(item_id)
        .await
        .map_err(LendingError::TransactionFailed)?
        .ok_or(LendingError::ItemNotFound)
}
