use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BorrowerId, DomainError, ItemId, LoanId};

/// 台帳エントリ - 1冊の1回の貸出の記録
///
/// 不変条件：
/// - `due_at` は `created_at` より後
/// - `returned_at` は一度だけ設定され、解除されない
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub loan_id: LoanId,
    pub item_id: ItemId,
    pub borrower_id: BorrowerId,
    pub created_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    /// 未返却か
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// 純粋関数：返却期限を検証する
///
/// 返却期限は貸出要求時刻より厳密に後でなければならない。
pub fn validate_due_date(
    requested_at: DateTime<Utc>,
    due_at: DateTime<Utc>,
) -> Result<(), DomainError> {
    if due_at <= requested_at {
        return Err(DomainError::InvalidDueDate {
            requested_at,
            due_at,
        });
    }
    Ok(())
}

/// 純粋関数：新しい貸出エントリを作成する
///
/// 副作用なし。IDを採番し、未返却状態のエントリを返す。
pub fn open_entry(
    item_id: ItemId,
    borrower_id: BorrowerId,
    requested_at: DateTime<Utc>,
    due_at: DateTime<Utc>,
) -> Result<LedgerEntry, DomainError> {
    validate_due_date(requested_at, due_at)?;

    Ok(LedgerEntry {
        loan_id: LoanId::new(),
        item_id,
        borrower_id,
        created_at: requested_at,
        due_at,
        returned_at: None,
    })
}

/// 純粋関数：エントリを返却済みにする
///
/// 既に返却済みの場合は `None`。返却時刻を上書きしない。
pub fn close_entry(entry: &LedgerEntry, returned_at: DateTime<Utc>) -> Option<LedgerEntry> {
    if !entry.is_open() {
        return None;
    }
    Some(LedgerEntry {
        returned_at: Some(returned_at),
        ..entry.clone()
    })
}

/// 延滞判定
///
/// 未返却かつ返却期限が `now` より前の場合に延滞とする。
pub fn is_overdue(entry: &LedgerEntry, now: DateTime<Utc>) -> bool {
    entry.is_open() && entry.due_at < now
}

/// 同じ資料・利用者の組で返却対象となるエントリを選ぶ
///
/// 複数の未返却エントリがある場合は最も古いもの（`created_at` 昇順、
/// 同時刻ならID順）を返す。
pub fn oldest_open_entry<'a, I>(
    entries: I,
    item_id: ItemId,
    borrower_id: BorrowerId,
) -> Option<&'a LedgerEntry>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    entries
        .into_iter()
        .filter(|e| e.is_open() && e.item_id == item_id && e.borrower_id == borrower_id)
        .min_by_key(|e| (e.created_at, e.loan_id))
}
