use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    DomainError,
    catalog::{Borrower, BorrowerPatch, Item, ItemPatch, ItemQuery, NewBorrower, NewItem},
    commands::BorrowItem,
    ledger::LedgerEntry,
    value_objects::{BorrowerId, ItemId},
};
use crate::ports::{BorrowerSummary, ItemSummary, OpenLoan, OverdueLoan};

// ============================================================================
// 貸出
// ============================================================================

/// 貸出リクエスト（POST /loans）
#[derive(Debug, Deserialize)]
pub struct BorrowItemRequest {
    pub item_id: Uuid,
    pub borrower_id: Uuid,
    pub due_at: DateTime<Utc>,
}

impl BorrowItemRequest {
    /// 受付時刻を与えてコマンドに変換する
    pub fn to_command(&self, requested_at: DateTime<Utc>) -> BorrowItem {
        BorrowItem {
            item_id: ItemId::from_uuid(self.item_id),
            borrower_id: BorrowerId::from_uuid(self.borrower_id),
            due_at: self.due_at,
            requested_at,
        }
    }
}

/// 台帳エントリのレスポンス
#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub loan_id: Uuid,
    pub item_id: Uuid,
    pub borrower_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl From<LedgerEntry> for LoanResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            loan_id: entry.loan_id.value(),
            item_id: entry.item_id.value(),
            borrower_id: entry.borrower_id.value(),
            created_at: entry.created_at,
            due_at: entry.due_at,
            returned_at: entry.returned_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemSummaryResponse {
    pub item_id: Uuid,
    pub title: String,
    pub author: String,
}

impl From<ItemSummary> for ItemSummaryResponse {
    fn from(item: ItemSummary) -> Self {
        Self {
            item_id: item.item_id.value(),
            title: item.title,
            author: item.author,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BorrowerSummaryResponse {
    pub borrower_id: Uuid,
    /// カタログから削除された利用者は `null`
    pub name: Option<String>,
}

impl From<BorrowerSummary> for BorrowerSummaryResponse {
    fn from(borrower: BorrowerSummary) -> Self {
        Self {
            borrower_id: borrower.borrower_id.value(),
            name: borrower.name,
        }
    }
}

/// 利用者の貸出中一覧の要素（GET /borrowers/:id/loans）
#[derive(Debug, Serialize)]
pub struct OpenLoanResponse {
    pub item: ItemSummaryResponse,
    pub loan: LoanResponse,
}

impl From<OpenLoan> for OpenLoanResponse {
    fn from(loan: OpenLoan) -> Self {
        Self {
            item: loan.item.into(),
            loan: loan.entry.into(),
        }
    }
}

/// 延滞一覧の要素（GET /loans/overdue）
#[derive(Debug, Serialize)]
pub struct OverdueLoanResponse {
    pub item: ItemSummaryResponse,
    pub loan: LoanResponse,
    pub borrower: BorrowerSummaryResponse,
}

impl From<OverdueLoan> for OverdueLoanResponse {
    fn from(loan: OverdueLoan) -> Self {
        Self {
            item: loan.item.into(),
            loan: loan.entry.into(),
            borrower: loan.borrower.into(),
        }
    }
}

/// 貸出可能数（GET /items/:id/availability）
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub item_id: Uuid,
    pub available_count: u32,
}

// ============================================================================
// カタログ
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub shelf_location: String,
    /// 所蔵冊数
    pub copies: u32,
}

impl CreateItemRequest {
    pub fn to_new_item(&self) -> Result<NewItem, DomainError> {
        NewItem::new(
            &self.title,
            &self.author,
            &self.isbn,
            &self.shelf_location,
            self.copies,
        )
    }
}

/// 資料の部分更新（PUT /items/:id）
///
/// 省略したフィールドは変更しない。
#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub shelf_location: Option<String>,
}

impl UpdateItemRequest {
    pub fn to_patch(&self) -> Result<ItemPatch, DomainError> {
        ItemPatch::new(
            self.title.as_deref(),
            self.author.as_deref(),
            self.isbn.as_deref(),
            self.shelf_location.as_deref(),
        )
    }
}

/// 資料検索のクエリパラメータ（GET /items/search）
#[derive(Debug, Default, Deserialize)]
pub struct SearchItemsQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
}

impl SearchItemsQuery {
    pub fn to_query(&self) -> Result<ItemQuery, DomainError> {
        ItemQuery::new(
            self.title.as_deref(),
            self.author.as_deref(),
            self.isbn.as_deref(),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub item_id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub shelf_location: String,
    pub available_count: u32,
    pub created_at: DateTime<Utc>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            item_id: item.item_id.value(),
            title: item.title,
            author: item.author,
            isbn: item.isbn,
            shelf_location: item.shelf_location,
            available_count: item.available_count,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBorrowerRequest {
    pub name: String,
    pub email: String,
}

impl CreateBorrowerRequest {
    pub fn to_new_borrower(&self) -> Result<NewBorrower, DomainError> {
        NewBorrower::new(&self.name, &self.email)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBorrowerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UpdateBorrowerRequest {
    pub fn to_patch(&self) -> Result<BorrowerPatch, DomainError> {
        BorrowerPatch::new(self.name.as_deref(), self.email.as_deref())
    }
}

#[derive(Debug, Serialize)]
pub struct BorrowerResponse {
    pub borrower_id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<Borrower> for BorrowerResponse {
    fn from(borrower: Borrower) -> Self {
        Self {
            borrower_id: borrower.borrower_id.value(),
            name: borrower.name,
            email: borrower.email,
            created_at: borrower.created_at,
        }
    }
}

// ============================================================================
// エラー
// ============================================================================

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
