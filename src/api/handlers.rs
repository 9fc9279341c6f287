use crate::application::{
    ServiceDependencies,
    lending::{
        borrow_item as execute_borrow_item, item_availability,
        list_open_loans_for_borrower as query_open_loans, list_overdue as query_overdue,
        return_item as execute_return_item,
    },
};
use crate::domain::{
    commands::ReturnItem,
    value_objects::{BorrowerId, ItemId},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use futures::stream::TryStreamExt;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{
        AvailabilityResponse, BorrowItemRequest, LoanResponse, OpenLoanResponse,
        OverdueLoanResponse,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Command handlers
// ============================================================================

/// POST /loans - 資料を貸し出す
///
/// 強制されるビジネスルール:
/// - 返却期限が受付時刻より後であること
/// - 貸出可能な冊数が残っていること（条件付き減算で判定）
/// - 設定により、利用者が登録済みであること
pub async fn borrow_item(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BorrowItemRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let cmd = req.to_command(chrono::Utc::now());

    let entry = execute_borrow_item(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(LoanResponse::from(entry))))
}

/// PUT /loans/return/:borrower_id/:item_id - 資料を返却する
///
/// 利用者がその資料について持つ最も古い未返却の貸出を閉じる。
/// 未返却の貸出がなければ404（二重返却は冊数を変えない）。
pub async fn return_item(
    State(state): State<Arc<AppState>>,
    Path((borrower_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<LoanResponse>, ApiError> {
    let cmd = ReturnItem {
        item_id: ItemId::from_uuid(item_id),
        borrower_id: BorrowerId::from_uuid(borrower_id),
        returned_at: chrono::Utc::now(),
    };

    let entry = execute_return_item(&state.service_deps, cmd).await?;

    Ok(Json(LoanResponse::from(entry)))
}

// ============================================================================
// Query handlers
// ============================================================================

/// GET /borrowers/:id/loans - 利用者の貸出中一覧
pub async fn list_open_loans(
    State(state): State<Arc<AppState>>,
    Path(borrower_id): Path<Uuid>,
) -> Result<Json<Vec<OpenLoanResponse>>, ApiError> {
    let loans: Vec<OpenLoanResponse> =
        query_open_loans(&state.service_deps, BorrowerId::from_uuid(borrower_id))
            .map_ok(OpenLoanResponse::from)
            .try_collect()
            .await?;

    Ok(Json(loans))
}

/// GET /loans/overdue - 延滞中の貸出一覧
pub async fn list_overdue(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OverdueLoanResponse>>, ApiError> {
    let loans: Vec<OverdueLoanResponse> = query_overdue(&state.service_deps)
        .map_ok(OverdueLoanResponse::from)
        .try_collect()
        .await?;

    Ok(Json(loans))
}

/// GET /items/:id/availability - 表示用の貸出可能数
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let available_count = item_availability(&state.service_deps, ItemId::from_uuid(item_id)).await?;

    Ok(Json(AvailabilityResponse {
        item_id,
        available_count,
    }))
}
