use crate::application::ServiceDependencies;
use crate::domain::{
    catalog::{Borrower, BorrowerPatch, Item, ItemPatch, ItemQuery, NewBorrower, NewItem},
    value_objects::{BorrowerId, ItemId},
};
use crate::ports::ItemDeletion;

use super::errors::{CatalogError, Result};

pub async fn list_items(deps: &ServiceDependencies) -> Result<Vec<Item>> {
    deps.catalog
        .list_items()
        .await
        .map_err(CatalogError::StoreFailure)
}

/// 資料を登録する
///
/// 所蔵冊数がそのまま貸出可能数の初期値になる。
pub async fn create_item(deps: &ServiceDependencies, new_item: NewItem) -> Result<Item> {
    let item = deps
        .catalog
        .create_item(new_item)
        .await
        .map_err(CatalogError::StoreFailure)?;

    tracing::info!(item_id = %item.item_id, copies = item.available_count, "Item created");
    Ok(item)
}

pub async fn update_item(
    deps: &ServiceDependencies,
    item_id: ItemId,
    patch: ItemPatch,
) -> Result<Item> {
    deps.catalog
        .update_item(item_id, patch)
        .await
        .map_err(CatalogError::StoreFailure)?
        .ok_or(CatalogError::ItemNotFound)
}

/// 資料を削除する
///
/// 台帳に記録がある資料は削除できない（台帳は削除しないため）。
pub async fn delete_item(deps: &ServiceDependencies, item_id: ItemId) -> Result<Item> {
    match deps
        .catalog
        .delete_item(item_id)
        .await
        .map_err(CatalogError::StoreFailure)?
    {
        ItemDeletion::Deleted(item) => {
            tracing::info!(item_id = %item.item_id, "Item deleted");
            Ok(item)
        }
        ItemDeletion::NotFound => Err(CatalogError::ItemNotFound),
        ItemDeletion::InUse => Err(CatalogError::ItemInUse),
    }
}

pub async fn search_items(deps: &ServiceDependencies, query: ItemQuery) -> Result<Vec<Item>> {
    deps.catalog
        .search_items(query)
        .await
        .map_err(CatalogError::StoreFailure)
}

pub async fn list_borrowers(deps: &ServiceDependencies) -> Result<Vec<Borrower>> {
    deps.catalog
        .list_borrowers()
        .await
        .map_err(CatalogError::StoreFailure)
}

pub async fn create_borrower(
    deps: &ServiceDependencies,
    new_borrower: NewBorrower,
) -> Result<Borrower> {
    let borrower = deps
        .catalog
        .create_borrower(new_borrower)
        .await
        .map_err(CatalogError::StoreFailure)?;

    tracing::info!(borrower_id = %borrower.borrower_id, "Borrower registered");
    Ok(borrower)
}

pub async fn update_borrower(
    deps: &ServiceDependencies,
    borrower_id: BorrowerId,
    patch: BorrowerPatch,
) -> Result<Borrower> {
    deps.catalog
        .update_borrower(borrower_id, patch)
        .await
        .map_err(CatalogError::StoreFailure)?
        .ok_or(CatalogError::BorrowerNotFound)
}

/// 利用者を削除する
///
/// 台帳エントリは残る。延滞一覧では名前なしで表示される。
pub async fn delete_borrower(deps: &ServiceDependencies, borrower_id: BorrowerId) -> Result<Borrower> {
    let borrower = deps
        .catalog
        .delete_borrower(borrower_id)
        .await
        .map_err(CatalogError::StoreFailure)?
        .ok_or(CatalogError::BorrowerNotFound)?;

    tracing::info!(borrower_id = %borrower.borrower_id, "Borrower deleted");
    Ok(borrower)
}
