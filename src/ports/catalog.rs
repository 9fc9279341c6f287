use crate::domain::{
    catalog::{Borrower, BorrowerPatch, Item, ItemPatch, ItemQuery, NewBorrower, NewItem},
    value_objects::{BorrowerId, ItemId},
};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 資料削除の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemDeletion {
    Deleted(Item),
    NotFound,
    /// 台帳に記録がある資料は削除できない
    InUse,
}

/// カタログポート
///
/// 資料と利用者の登録・更新・削除・検索。
/// 貸出可能数は登録時にのみ設定し、以降は台帳ストアだけが変更する。
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn list_items(&self) -> Result<Vec<Item>>;

    async fn create_item(&self, new_item: NewItem) -> Result<Item>;

    /// 指定されたフィールドだけを更新する。存在しなければ `None`
    async fn update_item(&self, item_id: ItemId, patch: ItemPatch) -> Result<Option<Item>>;

    async fn delete_item(&self, item_id: ItemId) -> Result<ItemDeletion>;

    async fn search_items(&self, query: ItemQuery) -> Result<Vec<Item>>;

    async fn list_borrowers(&self) -> Result<Vec<Borrower>>;

    async fn create_borrower(&self, new_borrower: NewBorrower) -> Result<Borrower>;

    async fn update_borrower(
        &self,
        borrower_id: BorrowerId,
        patch: BorrowerPatch,
    ) -> Result<Option<Borrower>>;

    async fn delete_borrower(&self, borrower_id: BorrowerId) -> Result<Option<Borrower>>;
}
