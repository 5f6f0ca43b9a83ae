use crate::domain::{self, commands::*, value_objects::*};
use crate::ports::*;
use std::sync::Arc;

use super::errors::{LendingError, Result};

/// 利用者1人あたりの最大貸出冊数
pub const MAX_ACTIVE_BORROWS: u64 = 5;

/// 貸出履歴クエリの上限件数
const HISTORY_LIMIT: u32 = 50;

/// 全記録クエリ（職員用）の上限件数
const ALL_RECORDS_LIMIT: u32 = 100;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
///
/// ストレージと時刻ソースは明示的に注入される。グローバルな接続や
/// 暗黙のシングルトンは持たない。初期化と破棄はプロセスの
/// エントリポイントが所有する。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub catalog_store: Arc<dyn CatalogStore>,
    pub borrow_store: Arc<dyn BorrowStore>,
    pub clock: Arc<dyn Clock>,
}

/// ストアから記録を取得するヘルパー関数
///
/// return_book, renew_borrow, cancel_reservationで共通利用される。
async fn load_record(
    borrow_store: &Arc<dyn BorrowStore>,
    borrow_id: BorrowId,
) -> Result<domain::BorrowRecord> {
    borrow_store
        .get(borrow_id)
        .await
        .map_err(LendingError::BorrowStoreError)?
        .ok_or(LendingError::RecordNotFound)
}

/// 書籍を借りる
///
/// ビジネスルール（確認順に、それぞれ別個の失敗）：
/// 1. 書籍が存在すること
/// 2. 貸出可能な冊数が1冊以上あること
/// 3. 同じ書籍の貸出中（active/overdue）の記録がないこと
/// 4. 貸出中の記録が5件未満であること
///
/// 効果：在庫カウンターを原子的に1減らし、返却期限を14日後とする
/// 記録を作成する。
///
/// # 一貫性
///
/// 在庫の引き落としと記録の保存は別ストアへの2操作であり、最後の
/// 1冊を巡る競合は `adjust_available` の範囲チェックで決着する。
/// 2つの貸出が競合した場合、勝者は1つで、敗者には在庫なしの失敗が
/// 返る。引き落とし後に記録の保存が失敗した場合のロールバックは
/// 行わない（ストレージ障害として呼び出し元に伝播する）。
pub async fn borrow_book(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<domain::BorrowRecord> {
    // 1. 書籍の存在確認
    let book = deps
        .catalog_store
        .get_book(cmd.book_id)
        .await
        .map_err(LendingError::CatalogStoreError)?
        .ok_or(LendingError::BookNotFound)?;

    // 2. 貸出可能性の確認
    if book.available == 0 {
        return Err(LendingError::BookNotAvailable);
    }

    // 3. 重複貸出の確認
    let duplicate_filter = BorrowFilter {
        book_id: Some(cmd.book_id),
        ..BorrowFilter::active_borrows_for_user(cmd.user_id)
    };
    let duplicates = deps
        .borrow_store
        .count(&duplicate_filter)
        .await
        .map_err(LendingError::BorrowStoreError)?;
    if duplicates > 0 {
        return Err(LendingError::AlreadyBorrowed);
    }

    // 4. 貸出上限の確認（5冊まで）
    let active_borrows = deps
        .borrow_store
        .count(&BorrowFilter::active_borrows_for_user(cmd.user_id))
        .await
        .map_err(LendingError::BorrowStoreError)?;
    if active_borrows >= MAX_ACTIVE_BORROWS {
        return Err(LendingError::BorrowLimitExceeded);
    }

    // 5. 在庫カウンターを原子的に引き落とす
    //    事前確認をすり抜けた競合はここで決着する
    match deps
        .catalog_store
        .adjust_available(cmd.book_id, -1)
        .await
        .map_err(LendingError::CatalogStoreError)?
    {
        AvailabilityUpdate::Adjusted => {}
        AvailabilityUpdate::OutOfRange => return Err(LendingError::BookNotAvailable),
        AvailabilityUpdate::NotFound => return Err(LendingError::BookNotFound),
    }

    // 6. ドメイン層の純粋関数で記録を作成し、保存する
    let now = deps.clock.now();
    let record = domain::BorrowRecord::Borrow(domain::borrow_book(cmd.book_id, cmd.user_id, now));

    deps.borrow_store
        .save(&record)
        .await
        .map_err(LendingError::BorrowStoreError)?;

    tracing::info!(
        borrow_id = %record.borrow_id().value(),
        book_id = %cmd.book_id.value(),
        user_id = %cmd.user_id.value(),
        "book borrowed"
    );

    Ok(record)
}

/// 書籍を予約する
///
/// ビジネスルール：
/// - 書籍が存在すること
/// - 同じ書籍の有効な予約がないこと
///
/// 在庫は条件にしない。人気書籍の順番待ちを許すため、在庫が
/// 尽きていても予約できる。在庫カウンターには触れない。
pub async fn reserve_book(
    deps: &ServiceDependencies,
    cmd: ReserveBook,
) -> Result<domain::BorrowRecord> {
    // 1. 書籍の存在確認
    deps.catalog_store
        .get_book(cmd.book_id)
        .await
        .map_err(LendingError::CatalogStoreError)?
        .ok_or(LendingError::BookNotFound)?;

    // 2. 重複予約の確認
    let duplicate_filter = BorrowFilter {
        book_id: Some(cmd.book_id),
        ..BorrowFilter::active_reservations_for_user(cmd.user_id)
    };
    let duplicates = deps
        .borrow_store
        .count(&duplicate_filter)
        .await
        .map_err(LendingError::BorrowStoreError)?;
    if duplicates > 0 {
        return Err(LendingError::AlreadyReserved);
    }

    // 3. 記録を作成し、保存する
    let now = deps.clock.now();
    let record =
        domain::BorrowRecord::Reservation(domain::reserve_book(cmd.book_id, cmd.user_id, now));

    deps.borrow_store
        .save(&record)
        .await
        .map_err(LendingError::BorrowStoreError)?;

    tracing::info!(
        borrow_id = %record.borrow_id().value(),
        book_id = %cmd.book_id.value(),
        user_id = %cmd.user_id.value(),
        "book reserved"
    );

    Ok(record)
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 記録が存在し、貸出記録（kind=Borrow）であること
/// - 呼び出し元が記録の所有者であること
/// - 返却済みでないこと（冪等な再返却は受理せず、失敗として返す）
///
/// 効果：延滞している場合は更新前の返却期限に対して現在時刻で料金を
/// 再計算し、返却済みに遷移させ、在庫カウンターを1戻す。
/// 戻し入れも範囲チェック付きの原子的更新で行い、`available`が
/// `quantity`を超えることはない。
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<domain::BorrowRecord> {
    // 1. 記録の取得と種別・所有者の確認
    let record = load_record(&deps.borrow_store, cmd.borrow_id).await?;

    let entry = match &record {
        domain::BorrowRecord::Borrow(entry) => entry,
        domain::BorrowRecord::Reservation(_) => return Err(LendingError::NotABorrow),
    };

    if entry.user_id != cmd.user_id {
        return Err(LendingError::NotRecordOwner);
    }

    // 2. ドメイン層の純粋関数で遷移させる
    let now = deps.clock.now();
    let returned = domain::return_book(entry, now).map_err(|e| match e {
        domain::ReturnBookError::AlreadyReturned => LendingError::AlreadyReturned,
    })?;

    let fine_cents = returned.fine.amount_cents;
    let book_id = returned.book_id;
    let updated = domain::BorrowRecord::Borrow(returned);

    // 3. 記録を保存し、在庫カウンターを戻す
    deps.borrow_store
        .save(&updated)
        .await
        .map_err(LendingError::BorrowStoreError)?;

    match deps
        .catalog_store
        .adjust_available(book_id, 1)
        .await
        .map_err(LendingError::CatalogStoreError)?
    {
        AvailabilityUpdate::Adjusted => {}
        // 全冊が在庫にある状態での返却はデータ不整合の兆候
        AvailabilityUpdate::OutOfRange => {
            tracing::warn!(
                book_id = %book_id.value(),
                "check-in would exceed owned quantity"
            );
            return Err(LendingError::InventoryInconsistent);
        }
        AvailabilityUpdate::NotFound => return Err(LendingError::BookNotFound),
    }

    tracing::info!(
        borrow_id = %cmd.borrow_id.value(),
        fine_cents,
        "book returned"
    );

    Ok(updated)
}

/// 貸出を更新する
///
/// ビジネスルール：
/// - 記録が存在し、貸出記録であること
/// - 呼び出し元が記録の所有者であること
/// - 更新回数が3回未満であること
/// - 延滞していないこと
///
/// 効果：返却期限を14日延ばし、更新回数を1増やす。延滞していない
/// 貸出のみ更新できるため、料金は変わらない。
pub async fn renew_borrow(deps: &ServiceDependencies, cmd: RenewBorrow) -> Result<domain::BorrowRecord> {
    // 1. 記録の取得と種別・所有者の確認
    let record = load_record(&deps.borrow_store, cmd.borrow_id).await?;

    let entry = match &record {
        domain::BorrowRecord::Borrow(entry) => entry,
        domain::BorrowRecord::Reservation(_) => return Err(LendingError::NotABorrow),
    };

    if entry.user_id != cmd.user_id {
        return Err(LendingError::NotRecordOwner);
    }

    // 2. ドメイン層の純粋関数で遷移させる
    let now = deps.clock.now();
    let renewed = domain::renew_borrow(entry, now).map_err(|e| match e {
        domain::RenewBorrowError::AlreadyReturned => LendingError::AlreadyReturned,
        domain::RenewBorrowError::RenewalLimitExceeded => LendingError::RenewalLimitExceeded,
        domain::RenewBorrowError::CannotRenewOverdue => LendingError::CannotRenewOverdue,
    })?;

    let updated = domain::BorrowRecord::Borrow(renewed);

    // 3. 保存する
    deps.borrow_store
        .save(&updated)
        .await
        .map_err(LendingError::BorrowStoreError)?;

    Ok(updated)
}

/// 予約をキャンセルする
///
/// ビジネスルール：
/// - 記録が存在し、予約記録（kind=Reservation）であること
/// - 呼び出し元が記録の所有者であること
///
/// 効果：キャンセル済みに遷移させる。在庫カウンターには触れない。
/// 記録は削除されず、監査証跡として残る。
pub async fn cancel_reservation(
    deps: &ServiceDependencies,
    cmd: CancelReservation,
) -> Result<domain::BorrowRecord> {
    // 1. 記録の取得と種別・所有者の確認
    let record = load_record(&deps.borrow_store, cmd.borrow_id).await?;

    let entry = match &record {
        domain::BorrowRecord::Reservation(entry) => entry,
        domain::BorrowRecord::Borrow(_) => return Err(LendingError::NotAReservation),
    };

    if entry.user_id != cmd.user_id {
        return Err(LendingError::NotRecordOwner);
    }

    // 2. ドメイン層の純粋関数で遷移させる
    let now = deps.clock.now();
    let cancelled = domain::cancel_reservation(entry, now).map_err(|e| match e {
        domain::CancelReservationError::NotActive => LendingError::ReservationNotActive,
    })?;

    let updated = domain::BorrowRecord::Reservation(cancelled);

    // 3. 保存する
    deps.borrow_store
        .save(&updated)
        .await
        .map_err(LendingError::BorrowStoreError)?;

    Ok(updated)
}

// ============================================================================
// クエリ
// ============================================================================

/// 利用者の貸出中の記録を新しい順に返す
pub async fn borrows_for_user(
    deps: &ServiceDependencies,
    user_id: UserId,
) -> Result<Vec<domain::BorrowRecord>> {
    deps.borrow_store
        .find(&BorrowFilter::active_borrows_for_user(user_id))
        .await
        .map_err(LendingError::BorrowStoreError)
}

/// 利用者の有効な予約を新しい順に返す
pub async fn reservations_for_user(
    deps: &ServiceDependencies,
    user_id: UserId,
) -> Result<Vec<domain::BorrowRecord>> {
    deps.borrow_store
        .find(&BorrowFilter::active_reservations_for_user(user_id))
        .await
        .map_err(LendingError::BorrowStoreError)
}

/// 利用者の貸出履歴（返却済みを含む）を新しい順に返す
pub async fn borrow_history(
    deps: &ServiceDependencies,
    user_id: UserId,
) -> Result<Vec<domain::BorrowRecord>> {
    let filter = BorrowFilter {
        user_id: Some(user_id),
        kind: Some(domain::BorrowKind::Borrow),
        limit: Some(HISTORY_LIMIT),
        ..BorrowFilter::default()
    };
    deps.borrow_store
        .find(&filter)
        .await
        .map_err(LendingError::BorrowStoreError)
}

/// すべての記録を新しい順に返す（職員用）
pub async fn all_records(deps: &ServiceDependencies) -> Result<Vec<domain::BorrowRecord>> {
    let filter = BorrowFilter {
        limit: Some(ALL_RECORDS_LIMIT),
        ..BorrowFilter::default()
    };
    deps.borrow_store
        .find(&filter)
        .await
        .map_err(LendingError::BorrowStoreError)
}
