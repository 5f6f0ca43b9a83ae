use crate::application::lending::{
    ServiceDependencies, all_records, borrow_book as execute_borrow_book,
    borrow_history as query_borrow_history, borrows_for_user,
    cancel_reservation as execute_cancel_reservation, renew_borrow as execute_renew_borrow,
    reservations_for_user, reserve_book as execute_reserve_book,
    return_book as execute_return_book, sweep_overdue,
};
use crate::domain::commands::{BorrowBook, CancelReservation, RenewBorrow, ReserveBook, ReturnBook};
use crate::domain::value_objects::{BookId, BorrowId};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    identity::Identity,
    types::{BorrowRecordResponse, RecordListResponse, SuccessResponse, SweepResponse},
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

/// 職員（司書または管理者）専用エンドポイントのガード
fn require_staff(identity: &Identity) -> Result<(), ApiError> {
    if identity.role.is_staff() {
        Ok(())
    } else {
        Err(ApiError::StaffOnly)
    }
}

// ============================================================================
// Command handlers
// ============================================================================

/// POST /borrows/borrow/:book_id - 書籍を借りる
///
/// 強制されるビジネスルール:
/// - 書籍が存在すること
/// - 貸出可能な冊数が1冊以上あること
/// - 同じ書籍の貸出中の記録がないこと
/// - 貸出中の記録が上限（5冊）未満であること
pub async fn borrow_book(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(book_id): Path<Uuid>,
) -> Result<(StatusCode, Json<SuccessResponse<BorrowRecordResponse>>), ApiError> {
    let cmd = BorrowBook {
        book_id: BookId::from_uuid(book_id),
        user_id: identity.user_id,
    };

    let record = execute_borrow_book(&state.service_deps, cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(record.into())),
    ))
}

/// POST /borrows/reserve/:book_id - 書籍を予約する
///
/// 在庫がなくても予約できる。強制されるビジネスルール:
/// - 書籍が存在すること
/// - 同じ書籍の有効な予約がないこと
pub async fn reserve_book(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(book_id): Path<Uuid>,
) -> Result<(StatusCode, Json<SuccessResponse<BorrowRecordResponse>>), ApiError> {
    let cmd = ReserveBook {
        book_id: BookId::from_uuid(book_id),
        user_id: identity.user_id,
    };

    let record = execute_reserve_book(&state.service_deps, cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(record.into())),
    ))
}

/// PUT /borrows/return/:borrow_id - 書籍を返却する
///
/// 延滞している場合は料金を確定する。呼び出し元が記録の所有者で
/// あること。
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(borrow_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<BorrowRecordResponse>>, ApiError> {
    let cmd = ReturnBook {
        borrow_id: BorrowId::from_uuid(borrow_id),
        user_id: identity.user_id,
    };

    let record = execute_return_book(&state.service_deps, cmd).await?;

    Ok(Json(SuccessResponse::new(record.into())))
}

/// PUT /borrows/renew/:borrow_id - 貸出を更新する
///
/// 返却期限を14日延ばす。強制されるビジネスルール:
/// - 呼び出し元が記録の所有者であること
/// - 更新回数が上限（3回）未満であること
/// - 延滞していないこと
pub async fn renew_borrow(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(borrow_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<BorrowRecordResponse>>, ApiError> {
    let cmd = RenewBorrow {
        borrow_id: BorrowId::from_uuid(borrow_id),
        user_id: identity.user_id,
    };

    let record = execute_renew_borrow(&state.service_deps, cmd).await?;

    Ok(Json(SuccessResponse::new(record.into())))
}

/// DELETE /borrows/cancel/:borrow_id - 予約をキャンセルする
///
/// 記録は削除されず、キャンセル済みに遷移する。
pub async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(borrow_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<BorrowRecordResponse>>, ApiError> {
    let cmd = CancelReservation {
        borrow_id: BorrowId::from_uuid(borrow_id),
        user_id: identity.user_id,
    };

    let record = execute_cancel_reservation(&state.service_deps, cmd).await?;

    Ok(Json(SuccessResponse::new(record.into())))
}

// ============================================================================
// Query handlers
// ============================================================================

/// GET /borrows/my-borrows - 自分の貸出中の記録
pub async fn my_borrows(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<SuccessResponse<RecordListResponse>>, ApiError> {
    let records = borrows_for_user(&state.service_deps, identity.user_id).await?;
    Ok(Json(SuccessResponse::new(records.into())))
}

/// GET /borrows/my-reservations - 自分の有効な予約
pub async fn my_reservations(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<SuccessResponse<RecordListResponse>>, ApiError> {
    let records = reservations_for_user(&state.service_deps, identity.user_id).await?;
    Ok(Json(SuccessResponse::new(records.into())))
}

/// GET /borrows/history - 自分の貸出履歴（直近50件）
pub async fn borrow_history(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<SuccessResponse<RecordListResponse>>, ApiError> {
    let records = query_borrow_history(&state.service_deps, identity.user_id).await?;
    Ok(Json(SuccessResponse::new(records.into())))
}

/// GET /borrows/all - すべての記録（職員専用、直近100件）
pub async fn all_borrows(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<SuccessResponse<RecordListResponse>>, ApiError> {
    require_staff(&identity)?;
    let records = all_records(&state.service_deps).await?;
    Ok(Json(SuccessResponse::new(records.into())))
}

/// GET /borrows/overdue - 延滞スキャンを実行して結果を返す（職員専用）
///
/// 返却期限を過ぎたActive状態の貸出をOverdueに遷移させ、
/// 期限超過中の全記録を返す。再実行しても安全。
pub async fn overdue_borrows(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<SuccessResponse<SweepResponse>>, ApiError> {
    require_staff(&identity)?;
    let report = sweep_overdue(&state.service_deps).await?;
    Ok(Json(SuccessResponse::new(report.into())))
}
