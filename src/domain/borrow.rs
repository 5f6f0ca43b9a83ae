use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{CancelReservationError, RenewBorrowError, ReturnBookError};
use super::value_objects::{BookId, BorrowId, Fine, RenewalCount, UserId};

/// 貸出期間（日数）
pub const BORROW_PERIOD_DAYS: i64 = 14;

/// 予約の有効期間（日数）
pub const RESERVATION_PERIOD_DAYS: i64 = 7;

/// 延滞料金（1日あたり、セント単位）
pub const FINE_PER_DAY_CENTS: i64 = 50;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// 記録の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowKind {
    Borrow,
    Reservation,
}

impl BorrowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowKind::Borrow => "borrow",
            BorrowKind::Reservation => "reservation",
        }
    }
}

impl std::str::FromStr for BorrowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrow" => Ok(BorrowKind::Borrow),
            "reservation" => Ok(BorrowKind::Reservation),
            _ => Err(format!("Invalid borrow kind: {}", s)),
        }
    }
}

/// 貸出の状態
///
/// 遷移：`Active -> {Overdue, Returned}`、`Overdue -> Returned`
/// Returnedは終端状態（監査証跡のため記録は削除されない）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowStatus {
    Active,
    Overdue,
    Returned,
}

/// 予約の状態
///
/// 遷移：`Active -> {Cancelled, Fulfilled, Expired}`
/// FulfilledとExpiredは充足・失効コラボレーターが設定する状態値。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Active,
    Cancelled,
    Fulfilled,
    Expired,
}

/// 永続化・クエリ用の統合ステータス
///
/// 種別ごとの状態enumを1つの文字列表現に射影する。
/// フィルタ述語とストレージアダプターで使用される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Overdue,
    Returned,
    Cancelled,
    Fulfilled,
    Expired,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Overdue => "overdue",
            RecordStatus::Returned => "returned",
            RecordStatus::Cancelled => "cancelled",
            RecordStatus::Fulfilled => "fulfilled",
            RecordStatus::Expired => "expired",
        }
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RecordStatus::Active),
            "overdue" => Ok(RecordStatus::Overdue),
            "returned" => Ok(RecordStatus::Returned),
            "cancelled" => Ok(RecordStatus::Cancelled),
            "fulfilled" => Ok(RecordStatus::Fulfilled),
            "expired" => Ok(RecordStatus::Expired),
            _ => Err(format!("Invalid record status: {}", s)),
        }
    }
}

impl From<BorrowStatus> for RecordStatus {
    fn from(status: BorrowStatus) -> Self {
        match status {
            BorrowStatus::Active => RecordStatus::Active,
            BorrowStatus::Overdue => RecordStatus::Overdue,
            BorrowStatus::Returned => RecordStatus::Returned,
        }
    }
}

impl From<ReservationStatus> for RecordStatus {
    fn from(status: ReservationStatus) -> Self {
        match status {
            ReservationStatus::Active => RecordStatus::Active,
            ReservationStatus::Cancelled => RecordStatus::Cancelled,
            ReservationStatus::Fulfilled => RecordStatus::Fulfilled,
            ReservationStatus::Expired => RecordStatus::Expired,
        }
    }
}

impl TryFrom<RecordStatus> for BorrowStatus {
    type Error = String;

    fn try_from(status: RecordStatus) -> Result<Self, Self::Error> {
        match status {
            RecordStatus::Active => Ok(BorrowStatus::Active),
            RecordStatus::Overdue => Ok(BorrowStatus::Overdue),
            RecordStatus::Returned => Ok(BorrowStatus::Returned),
            other => Err(format!("{} is not a borrow status", other.as_str())),
        }
    }
}

impl TryFrom<RecordStatus> for ReservationStatus {
    type Error = String;

    fn try_from(status: RecordStatus) -> Result<Self, Self::Error> {
        match status {
            RecordStatus::Active => Ok(ReservationStatus::Active),
            RecordStatus::Cancelled => Ok(ReservationStatus::Cancelled),
            RecordStatus::Fulfilled => Ok(ReservationStatus::Fulfilled),
            RecordStatus::Expired => Ok(ReservationStatus::Expired),
            other => Err(format!("{} is not a reservation status", other.as_str())),
        }
    }
}

/// 貸出記録（kind=Borrow）
///
/// 返却期限が必須であることを型で保証する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowEntry {
    pub borrow_id: BorrowId,
    pub book_id: BookId,
    pub user_id: UserId,
    pub status: BorrowStatus,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub renewal_count: RenewalCount,
    pub fine: Fine,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 予約記録（kind=Reservation）
///
/// 失効日時が必須であることを型で保証する。予約は在庫に紐付かない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationEntry {
    pub borrow_id: BorrowId,
    pub book_id: BookId,
    pub user_id: UserId,
    pub status: ReservationStatus,
    pub reserved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 貸出台帳の記録 - 1回の貸出または予約のトランザクション
///
/// 種別ごとの必須フィールドの違い（返却期限 vs 失効日時）を
/// 型安全なバリアントで表現する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BorrowRecord {
    Borrow(BorrowEntry),
    Reservation(ReservationEntry),
}

impl BorrowRecord {
    pub fn borrow_id(&self) -> BorrowId {
        match self {
            BorrowRecord::Borrow(e) => e.borrow_id,
            BorrowRecord::Reservation(e) => e.borrow_id,
        }
    }

    pub fn book_id(&self) -> BookId {
        match self {
            BorrowRecord::Borrow(e) => e.book_id,
            BorrowRecord::Reservation(e) => e.book_id,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            BorrowRecord::Borrow(e) => e.user_id,
            BorrowRecord::Reservation(e) => e.user_id,
        }
    }

    pub fn kind(&self) -> BorrowKind {
        match self {
            BorrowRecord::Borrow(_) => BorrowKind::Borrow,
            BorrowRecord::Reservation(_) => BorrowKind::Reservation,
        }
    }

    pub fn status(&self) -> RecordStatus {
        match self {
            BorrowRecord::Borrow(e) => e.status.into(),
            BorrowRecord::Reservation(e) => e.status.into(),
        }
    }

    /// 記録の開始日時（貸出日または予約日）。一覧の並び替えに使用される。
    pub fn started_at(&self) -> DateTime<Utc> {
        match self {
            BorrowRecord::Borrow(e) => e.borrowed_at,
            BorrowRecord::Reservation(e) => e.reserved_at,
        }
    }

    /// 延滞判定。予約は延滞しない。
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self {
            BorrowRecord::Borrow(e) => is_overdue(e, now),
            BorrowRecord::Reservation(_) => false,
        }
    }
}

// ============================================================================
// 純粋関数：状態遷移
// ============================================================================

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール：
/// - 貸出期間は14日間
/// - 状態はActive
/// - 更新回数は0
///
/// 副作用なし。新しいBorrowEntryを返す。
/// 在庫の確認と引き落としは貸出サービスの責務。
pub fn borrow_book(book_id: BookId, user_id: UserId, now: DateTime<Utc>) -> BorrowEntry {
    BorrowEntry {
        borrow_id: BorrowId::new(),
        book_id,
        user_id,
        status: BorrowStatus::Active,
        borrowed_at: now,
        due_date: now + Duration::days(BORROW_PERIOD_DAYS),
        returned_at: None,
        renewal_count: RenewalCount::new(),
        fine: Fine::none(),
        created_at: now,
        updated_at: now,
    }
}

/// 純粋関数：書籍を予約する
///
/// ビジネスルール：
/// - 予約の有効期間は7日間
/// - 在庫がなくても予約できる（人気書籍の順番待ちを許す意図的な設計）
///
/// 副作用なし。新しいReservationEntryを返す。
pub fn reserve_book(book_id: BookId, user_id: UserId, now: DateTime<Utc>) -> ReservationEntry {
    ReservationEntry {
        borrow_id: BorrowId::new(),
        book_id,
        user_id,
        status: ReservationStatus::Active,
        reserved_at: now,
        expires_at: now + Duration::days(RESERVATION_PERIOD_DAYS),
        created_at: now,
        updated_at: now,
    }
}

/// 純粋関数：延滞料金を計算する
///
/// 返却済みの記録と期限内の記録は0。それ以外は
/// 延滞日数（端数は切り上げ）× 1日あたり50セント。
pub fn calculate_fine(entry: &BorrowEntry, now: DateTime<Utc>) -> i64 {
    if entry.status == BorrowStatus::Returned || now <= entry.due_date {
        return 0;
    }
    let overdue_seconds = (now - entry.due_date).num_seconds();
    // 1日未満の延滞も1日として数える
    let days_overdue = (overdue_seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    days_overdue * FINE_PER_DAY_CENTS
}

/// 純粋関数：延滞判定
pub fn is_overdue(entry: &BorrowEntry, now: DateTime<Utc>) -> bool {
    entry.status != BorrowStatus::Returned && now > entry.due_date
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 延滞していても返却は受け付ける
/// - 延滞している場合、料金は更新前の返却期限に対して現在時刻で再計算する
/// - 返却済みの記録の再返却は不可（冪等な受理はしない）
///
/// 副作用なし。新しいBorrowEntryを返す。
/// 在庫の戻し入れは貸出サービスの責務。
pub fn return_book(entry: &BorrowEntry, now: DateTime<Utc>) -> Result<BorrowEntry, ReturnBookError> {
    if entry.status == BorrowStatus::Returned {
        return Err(ReturnBookError::AlreadyReturned);
    }

    // 更新前のdue_dateに対して判定・計算する
    let fine = if is_overdue(entry, now) {
        Fine {
            amount_cents: calculate_fine(entry, now),
            paid: entry.fine.paid,
        }
    } else {
        entry.fine
    };

    Ok(BorrowEntry {
        status: BorrowStatus::Returned,
        returned_at: Some(now),
        fine,
        updated_at: now,
        ..entry.clone()
    })
}

/// 純粋関数：貸出を更新する
///
/// ビジネスルール：
/// - 更新は3回まで
/// - 延滞中は更新不可
/// - 返却済みは更新不可
/// - 更新時：現在の返却期限 + 14日間
///
/// 延滞していない貸出のみ更新できるため、料金は変わらない。
pub fn renew_borrow(entry: &BorrowEntry, now: DateTime<Utc>) -> Result<BorrowEntry, RenewBorrowError> {
    if entry.status == BorrowStatus::Returned {
        return Err(RenewBorrowError::AlreadyReturned);
    }

    if !entry.renewal_count.can_renew() {
        return Err(RenewBorrowError::RenewalLimitExceeded);
    }

    if is_overdue(entry, now) {
        return Err(RenewBorrowError::CannotRenewOverdue);
    }

    let renewal_count = entry.renewal_count.increment()?;

    Ok(BorrowEntry {
        due_date: entry.due_date + Duration::days(BORROW_PERIOD_DAYS),
        renewal_count,
        updated_at: now,
        ..entry.clone()
    })
}

/// 純粋関数：予約をキャンセルする
///
/// 終端状態からの再キャンセルは不可。
pub fn cancel_reservation(
    entry: &ReservationEntry,
    now: DateTime<Utc>,
) -> Result<ReservationEntry, CancelReservationError> {
    if entry.status != ReservationStatus::Active {
        return Err(CancelReservationError::NotActive);
    }

    Ok(ReservationEntry {
        status: ReservationStatus::Cancelled,
        updated_at: now,
        ..entry.clone()
    })
}

/// 純粋関数：延滞を記録する（延滞スイーパー用の遷移）
///
/// Active状態かつ返却期限を過ぎた貸出のみ遷移する。
/// 遷移時に料金を計算して確定する（検出時点で固定、以後スイーパーは
/// 再計算しない。返却時には現在時刻で再計算され、その額が確定値）。
///
/// 対象外の記録には`None`を返す。既にOverdueの記録を変更しないことが
/// スイーパーの冪等性を支える。
pub fn flag_overdue(entry: &BorrowEntry, now: DateTime<Utc>) -> Option<BorrowEntry> {
    if entry.status != BorrowStatus::Active || now <= entry.due_date {
        return None;
    }

    Some(BorrowEntry {
        status: BorrowStatus::Overdue,
        fine: Fine {
            amount_cents: calculate_fine(entry, now),
            paid: entry.fine.paid,
        },
        updated_at: now,
        ..entry.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    // TDD: borrow_book() のテスト
    #[test]
    fn test_borrow_book_creates_entry_with_correct_due_date() {
        let book_id = BookId::new();
        let user_id = UserId::new();
        let now = Utc::now();

        let entry = borrow_book(book_id, user_id, now);

        // 貸出期間は14日間
        assert_eq!(entry.due_date, now + Duration::days(14));
        assert_eq!(entry.status, BorrowStatus::Active);
        assert_eq!(entry.renewal_count.value(), 0);
        assert_eq!(entry.fine, Fine::none());
        assert_eq!(entry.book_id, book_id);
        assert_eq!(entry.user_id, user_id);
        assert!(entry.returned_at.is_none());
    }

    // TDD: reserve_book() のテスト
    #[test]
    fn test_reserve_book_creates_entry_with_correct_expiry() {
        let book_id = BookId::new();
        let user_id = UserId::new();
        let now = Utc::now();

        let entry = reserve_book(book_id, user_id, now);

        // 予約の有効期間は7日間
        assert_eq!(entry.expires_at, now + Duration::days(7));
        assert_eq!(entry.status, ReservationStatus::Active);
        assert_eq!(entry.book_id, book_id);
        assert_eq!(entry.user_id, user_id);
    }

    // TDD: calculate_fine() のテスト
    #[test]
    fn test_calculate_fine_three_whole_days_overdue() {
        let mut entry = borrow_book(BookId::new(), UserId::new(), at(2023, 12, 18));
        entry.due_date = at(2024, 1, 1);

        // 期限 2024-01-01、現在 2024-01-04 → 3日 × 50セント = 150セント
        assert_eq!(calculate_fine(&entry, at(2024, 1, 4)), 150);
    }

    #[test]
    fn test_calculate_fine_zero_when_not_past_due() {
        let mut entry = borrow_book(BookId::new(), UserId::new(), at(2023, 12, 18));
        entry.due_date = at(2024, 1, 1);

        assert_eq!(calculate_fine(&entry, at(2023, 12, 25)), 0);
        // 期限ちょうどは延滞ではない
        assert_eq!(calculate_fine(&entry, at(2024, 1, 1)), 0);
    }

    #[test]
    fn test_calculate_fine_partial_day_counts_as_full_day() {
        let mut entry = borrow_book(BookId::new(), UserId::new(), at(2023, 12, 18));
        entry.due_date = at(2024, 1, 1);

        // 1時間の延滞でも1日分
        let now = at(2024, 1, 1) + Duration::hours(1);
        assert_eq!(calculate_fine(&entry, now), 50);

        // 3日と1秒 → 4日分
        let now = at(2024, 1, 4) + Duration::seconds(1);
        assert_eq!(calculate_fine(&entry, now), 200);
    }

    #[test]
    fn test_calculate_fine_zero_for_returned_entry() {
        let entry = borrow_book(BookId::new(), UserId::new(), at(2024, 1, 1));
        let returned = return_book(&entry, at(2024, 1, 5)).unwrap();

        assert_eq!(calculate_fine(&returned, at(2024, 3, 1)), 0);
    }

    // TDD: is_overdue() のテスト
    #[test]
    fn test_is_overdue_false_before_due_date() {
        let now = Utc::now();
        let entry = borrow_book(BookId::new(), UserId::new(), now);
        assert!(!is_overdue(&entry, now + Duration::days(7)));
    }

    #[test]
    fn test_is_overdue_true_after_due_date() {
        let now = Utc::now();
        let entry = borrow_book(BookId::new(), UserId::new(), now);
        assert!(is_overdue(&entry, now + Duration::days(20)));
    }

    #[test]
    fn test_is_overdue_false_when_returned() {
        let now = Utc::now();
        let entry = borrow_book(BookId::new(), UserId::new(), now);
        let returned = return_book(&entry, now + Duration::days(7)).unwrap();
        assert!(!is_overdue(&returned, now + Duration::days(20)));
    }

    #[test]
    fn test_record_is_overdue_always_false_for_reservations() {
        let now = Utc::now();
        let entry = reserve_book(BookId::new(), UserId::new(), now);
        let record = BorrowRecord::Reservation(entry);
        assert!(!record.is_overdue(now + Duration::days(30)));
    }

    // TDD: return_book() のテスト
    #[test]
    fn test_return_book_on_time_leaves_no_fine() {
        let now = Utc::now();
        let entry = borrow_book(BookId::new(), UserId::new(), now);
        let returned_at = now + Duration::days(7);

        let returned = return_book(&entry, returned_at).unwrap();

        assert_eq!(returned.status, BorrowStatus::Returned);
        assert_eq!(returned.returned_at, Some(returned_at));
        assert_eq!(returned.fine.amount_cents, 0);
    }

    #[test]
    fn test_return_book_overdue_computes_fine_against_current_time() {
        let mut entry = borrow_book(BookId::new(), UserId::new(), at(2023, 12, 18));
        entry.due_date = at(2024, 1, 1);

        let returned = return_book(&entry, at(2024, 1, 4)).unwrap();

        assert_eq!(returned.status, BorrowStatus::Returned);
        assert_eq!(returned.fine.amount_cents, 150);
        assert!(!returned.fine.paid);
    }

    #[test]
    fn test_return_book_recomputes_fine_frozen_by_sweeper() {
        let mut entry = borrow_book(BookId::new(), UserId::new(), at(2023, 12, 18));
        entry.due_date = at(2024, 1, 1);

        // スイーパーが1日延滞時点で検出
        let flagged = flag_overdue(&entry, at(2024, 1, 2)).unwrap();
        assert_eq!(flagged.fine.amount_cents, 50);

        // 返却は現在時刻で再計算し、その額が確定値になる
        let returned = return_book(&flagged, at(2024, 1, 4)).unwrap();
        assert_eq!(returned.fine.amount_cents, 150);
    }

    #[test]
    fn test_return_book_fails_when_already_returned() {
        let now = Utc::now();
        let entry = borrow_book(BookId::new(), UserId::new(), now);
        let returned = return_book(&entry, now + Duration::days(7)).unwrap();

        let result = return_book(&returned, now + Duration::days(8));
        assert_eq!(result.unwrap_err(), ReturnBookError::AlreadyReturned);
    }

    // TDD: renew_borrow() のテスト
    #[test]
    fn test_renew_borrow_extends_due_date_by_14_days() {
        let now = Utc::now();
        let entry = borrow_book(BookId::new(), UserId::new(), now);

        let renewed = renew_borrow(&entry, now + Duration::days(5)).unwrap();

        assert_eq!(renewed.due_date, entry.due_date + Duration::days(14));
        assert_eq!(renewed.renewal_count.value(), 1);
        assert_eq!(renewed.status, BorrowStatus::Active);
        // 延滞していない貸出のみ更新できるため料金は変わらない
        assert_eq!(renewed.fine, entry.fine);
    }

    #[test]
    fn test_renew_borrow_succeeds_exactly_three_times() {
        let now = Utc::now();
        let mut entry = borrow_book(BookId::new(), UserId::new(), now);

        for expected_count in 1..=3u8 {
            entry = renew_borrow(&entry, now + Duration::days(1)).unwrap();
            assert_eq!(entry.renewal_count.value(), expected_count);
        }

        let result = renew_borrow(&entry, now + Duration::days(2));
        assert_eq!(result.unwrap_err(), RenewBorrowError::RenewalLimitExceeded);
    }

    #[test]
    fn test_renew_borrow_fails_when_overdue() {
        let now = Utc::now();
        let entry = borrow_book(BookId::new(), UserId::new(), now);

        let result = renew_borrow(&entry, now + Duration::days(20));
        assert_eq!(result.unwrap_err(), RenewBorrowError::CannotRenewOverdue);
    }

    #[test]
    fn test_renew_borrow_fails_on_overdue_status() {
        let now = Utc::now();
        let entry = borrow_book(BookId::new(), UserId::new(), now);
        let flagged = flag_overdue(&entry, now + Duration::days(20)).unwrap();

        let result = renew_borrow(&flagged, now + Duration::days(21));
        assert_eq!(result.unwrap_err(), RenewBorrowError::CannotRenewOverdue);
    }

    #[test]
    fn test_renew_borrow_fails_when_returned() {
        let now = Utc::now();
        let entry = borrow_book(BookId::new(), UserId::new(), now);
        let returned = return_book(&entry, now + Duration::days(7)).unwrap();

        let result = renew_borrow(&returned, now + Duration::days(8));
        assert_eq!(result.unwrap_err(), RenewBorrowError::AlreadyReturned);
    }

    // TDD: cancel_reservation() のテスト
    #[test]
    fn test_cancel_reservation_success() {
        let now = Utc::now();
        let entry = reserve_book(BookId::new(), UserId::new(), now);

        let cancelled = cancel_reservation(&entry, now + Duration::days(1)).unwrap();

        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    }

    #[test]
    fn test_cancel_reservation_fails_when_not_active() {
        let now = Utc::now();
        let entry = reserve_book(BookId::new(), UserId::new(), now);
        let cancelled = cancel_reservation(&entry, now).unwrap();

        let result = cancel_reservation(&cancelled, now + Duration::days(1));
        assert_eq!(result.unwrap_err(), CancelReservationError::NotActive);
    }

    // TDD: flag_overdue() のテスト
    #[test]
    fn test_flag_overdue_transitions_active_entry() {
        let mut entry = borrow_book(BookId::new(), UserId::new(), at(2023, 12, 18));
        entry.due_date = at(2024, 1, 1);

        let flagged = flag_overdue(&entry, at(2024, 1, 4)).unwrap();

        assert_eq!(flagged.status, BorrowStatus::Overdue);
        assert_eq!(flagged.fine.amount_cents, 150);
    }

    #[test]
    fn test_flag_overdue_skips_entry_within_due_date() {
        let now = Utc::now();
        let entry = borrow_book(BookId::new(), UserId::new(), now);

        assert!(flag_overdue(&entry, now + Duration::days(7)).is_none());
    }

    #[test]
    fn test_flag_overdue_skips_already_overdue_entry() {
        let now = Utc::now();
        let entry = borrow_book(BookId::new(), UserId::new(), now);
        let flagged = flag_overdue(&entry, now + Duration::days(20)).unwrap();

        // 既にOverdueの記録は対象外。料金は検出時点の額で固定される。
        assert!(flag_overdue(&flagged, now + Duration::days(30)).is_none());
    }

    #[test]
    fn test_flag_overdue_skips_returned_entry() {
        let now = Utc::now();
        let entry = borrow_book(BookId::new(), UserId::new(), now);
        let returned = return_book(&entry, now + Duration::days(7)).unwrap();

        assert!(flag_overdue(&returned, now + Duration::days(30)).is_none());
    }

    // BorrowRecord のテスト
    #[test]
    fn test_record_accessors_for_both_kinds() {
        let now = Utc::now();
        let book_id = BookId::new();
        let user_id = UserId::new();

        let borrow = BorrowRecord::Borrow(borrow_book(book_id, user_id, now));
        assert_eq!(borrow.kind(), BorrowKind::Borrow);
        assert_eq!(borrow.status(), RecordStatus::Active);
        assert_eq!(borrow.book_id(), book_id);
        assert_eq!(borrow.user_id(), user_id);
        assert_eq!(borrow.started_at(), now);

        let reservation = BorrowRecord::Reservation(reserve_book(book_id, user_id, now));
        assert_eq!(reservation.kind(), BorrowKind::Reservation);
        assert_eq!(reservation.status(), RecordStatus::Active);
        assert_eq!(reservation.started_at(), now);
    }

    #[test]
    fn test_record_status_string_round_trip() {
        let statuses = [
            RecordStatus::Active,
            RecordStatus::Overdue,
            RecordStatus::Returned,
            RecordStatus::Cancelled,
            RecordStatus::Fulfilled,
            RecordStatus::Expired,
        ];
        for status in statuses {
            assert_eq!(status.as_str().parse::<RecordStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_record_status_projection_is_kind_consistent() {
        assert!(BorrowStatus::try_from(RecordStatus::Cancelled).is_err());
        assert!(ReservationStatus::try_from(RecordStatus::Overdue).is_err());
        assert_eq!(
            BorrowStatus::try_from(RecordStatus::Overdue).unwrap(),
            BorrowStatus::Overdue
        );
        assert_eq!(
            ReservationStatus::try_from(RecordStatus::Expired).unwrap(),
            ReservationStatus::Expired
        );
    }
}
