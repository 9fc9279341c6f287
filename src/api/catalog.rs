use crate::application::catalog as service;
use crate::domain::value_objects::{BorrowerId, ItemId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    handlers::AppState,
    types::{
        BorrowerResponse, CreateBorrowerRequest, CreateItemRequest, ItemResponse,
        SearchItemsQuery, UpdateBorrowerRequest, UpdateItemRequest,
    },
};

// ============================================================================
// Items
// ============================================================================

/// GET /items - 全資料をタイトル順で取得
pub async fn list_items(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = service::list_items(&state.service_deps).await?;

    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// POST /items - 資料を登録
///
/// `copies` が登録時の貸出可能数になる。ISBNはチェックディジットを検証する。
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let new_item = req.to_new_item()?;

    let item = service::create_item(&state.service_deps, new_item).await?;

    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

/// PUT /items/:id - 資料の部分更新
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    let patch = req.to_patch()?;

    let item = service::update_item(&state.service_deps, ItemId::from_uuid(item_id), patch).await?;

    Ok(Json(ItemResponse::from(item)))
}

/// DELETE /items/:id - 資料を削除
///
/// 貸出履歴のある資料は409を返す。
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = service::delete_item(&state.service_deps, ItemId::from_uuid(item_id)).await?;

    Ok(Json(ItemResponse::from(item)))
}

/// GET /items/search?title=&author=&isbn= - 資料検索
pub async fn search_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchItemsQuery>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let query = query.to_query()?;

    let items = service::search_items(&state.service_deps, query).await?;

    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

// ============================================================================
// Borrowers
// ============================================================================

pub async fn list_borrowers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BorrowerResponse>>, ApiError> {
    let borrowers = service::list_borrowers(&state.service_deps).await?;

    Ok(Json(
        borrowers.into_iter().map(BorrowerResponse::from).collect(),
    ))
}

pub async fn create_borrower(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBorrowerRequest>,
) -> Result<(StatusCode, Json<BorrowerResponse>), ApiError> {
    let new_borrower = req.to_new_borrower()?;

    let borrower = service::create_borrower(&state.service_deps, new_borrower).await?;

    Ok((StatusCode::CREATED, Json(BorrowerResponse::from(borrower))))
}

pub async fn update_borrower(
    State(state): State<Arc<AppState>>,
    Path(borrower_id): Path<Uuid>,
    Json(req): Json<UpdateBorrowerRequest>,
) -> Result<Json<BorrowerResponse>, ApiError> {
    let patch = req.to_patch()?;

    let borrower =
        service::update_borrower(&state.service_deps, BorrowerId::from_uuid(borrower_id), patch)
            .await?;

    Ok(Json(BorrowerResponse::from(borrower)))
}

/// DELETE /borrowers/:id - 利用者を削除
///
/// 台帳の記録は残る。
pub async fn delete_borrower(
    State(state): State<Arc<AppState>>,
    Path(borrower_id): Path<Uuid>,
) -> Result<Json<BorrowerResponse>, ApiError> {
    let borrower =
        service::delete_borrower(&state.service_deps, BorrowerId::from_uuid(borrower_id)).await?;

    Ok(Json(BorrowerResponse::from(borrower)))
}
