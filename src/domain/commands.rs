use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BorrowerId, ItemId};

/// コマンド：資料を貸し出す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowItem {
    pub item_id: ItemId,
    pub borrower_id: BorrowerId,
    pub due_at: DateTime<Utc>,
    pub requested_at: DateTime<Utc>,
}

/// コマンド：資料を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnItem {
    pub item_id: ItemId,
    pub borrower_id: BorrowerId,
    pub returned_at: DateTime<Utc>,
}
