use crate::domain::{
    catalog::{Borrower, BorrowerPatch, Item, ItemPatch, ItemQuery, NewBorrower, NewItem},
    value_objects::{BorrowerId, ItemId},
};
use crate::ports::catalog::{Catalog as CatalogTrait, ItemDeletion, Result};
use async_trait::async_trait;
use chrono::Utc;

use super::store::MemoryStore;

#[async_trait]
impl CatalogTrait for MemoryStore {
    /// タイトル順で全資料を返す
    async fn list_items(&self) -> Result<Vec<Item>> {
        let tables = self.tables.lock().await;
        let mut items: Vec<Item> = tables.items.values().cloned().collect();
        items.sort_by(|a, b| a.title.cmp(&b.title).then(a.created_at.cmp(&b.created_at)));
        Ok(items)
    }

    async fn create_item(&self, new_item: NewItem) -> Result<Item> {
        let item = new_item.into_item(ItemId::new(), Utc::now());
        let mut tables = self.tables.lock().await;
        tables.items.insert(item.item_id, item.clone());
        Ok(item)
    }

    async fn update_item(&self, item_id: ItemId, patch: ItemPatch) -> Result<Option<Item>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.items.get_mut(&item_id).map(|item| {
            *item = patch.apply(item);
            item.clone()
        }))
    }

    /// 台帳に記録がある資料は削除しない
    async fn delete_item(&self, item_id: ItemId) -> Result<ItemDeletion> {
        let mut tables = self.tables.lock().await;
        if !tables.items.contains_key(&item_id) {
            return Ok(ItemDeletion::NotFound);
        }
        if tables.entries.iter().any(|e| e.item_id == item_id) {
            return Ok(ItemDeletion::InUse);
        }
        Ok(tables
            .items
            .remove(&item_id)
            .map_or(ItemDeletion::NotFound, ItemDeletion::Deleted))
    }

    async fn search_items(&self, query: ItemQuery) -> Result<Vec<Item>> {
        let tables = self.tables.lock().await;
        let mut items: Vec<Item> = tables
            .items
            .values()
            .filter(|item| query.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(items)
    }

    /// 登録順で全利用者を返す
    async fn list_borrowers(&self) -> Result<Vec<Borrower>> {
        let tables = self.tables.lock().await;
        let mut borrowers: Vec<Borrower> = tables.borrowers.values().cloned().collect();
        borrowers.sort_by_key(|b| b.created_at);
        Ok(borrowers)
    }

    async fn create_borrower(&self, new_borrower: NewBorrower) -> Result<Borrower> {
        let borrower = new_borrower.into_borrower(BorrowerId::new(), Utc::now());
        let mut tables = self.tables.lock().await;
        tables
            .borrowers
            .insert(borrower.borrower_id, borrower.clone());
        Ok(borrower)
    }

    async fn update_borrower(
        &self,
        borrower_id: BorrowerId,
        patch: BorrowerPatch,
    ) -> Result<Option<Borrower>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.borrowers.get_mut(&borrower_id).map(|borrower| {
            *borrower = patch.apply(borrower);
            borrower.clone()
        }))
    }

    async fn delete_borrower(&self, borrower_id: BorrowerId) -> Result<Option<Borrower>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.borrowers.remove(&borrower_id))
    }
}
