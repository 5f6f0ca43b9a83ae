use crate::domain::borrow::{BorrowKind, BorrowRecord, RecordStatus};
use crate::domain::value_objects::{BookId, BorrowId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 一覧の並び順
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorrowSort {
    /// 開始日時（貸出日・予約日）の降順
    #[default]
    NewestFirst,
    /// 返却期限の昇順（延滞スキャン用）
    DueDateAsc,
}

/// 貸出記録のフィルタ述語
///
/// 貸出サービスが必要とするクエリの組み合わせをすべて表現する：
/// - (user, book, kind, status集合) … 重複貸出・重複予約の検出
/// - (user, kind, status集合) … 貸出上限の確認、利用者の一覧
/// - (kind, status集合, due_date < now) … 延滞スキャン
#[derive(Debug, Clone, Default)]
pub struct BorrowFilter {
    pub user_id: Option<UserId>,
    pub book_id: Option<BookId>,
    pub kind: Option<BorrowKind>,
    /// 空でない場合、この集合に含まれるステータスのみ
    pub statuses: Vec<RecordStatus>,
    pub due_before: Option<DateTime<Utc>>,
    pub sort: BorrowSort,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl BorrowFilter {
    /// 利用者の貸出中（active/overdue）の貸出記録
    pub fn active_borrows_for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            kind: Some(BorrowKind::Borrow),
            statuses: vec![RecordStatus::Active, RecordStatus::Overdue],
            ..Self::default()
        }
    }

    /// 利用者の有効な予約
    pub fn active_reservations_for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            kind: Some(BorrowKind::Reservation),
            statuses: vec![RecordStatus::Active],
            ..Self::default()
        }
    }

    /// 延滞候補：返却期限を過ぎた貸出中の記録
    pub fn overdue_candidates(now: DateTime<Utc>) -> Self {
        Self {
            kind: Some(BorrowKind::Borrow),
            statuses: vec![RecordStatus::Active, RecordStatus::Overdue],
            due_before: Some(now),
            sort: BorrowSort::DueDateAsc,
            ..Self::default()
        }
    }

    /// 記録がこのフィルタに一致するか
    ///
    /// インメモリ実装の判定に使用される。SQL実装はWHERE句に変換する。
    pub fn matches(&self, record: &BorrowRecord) -> bool {
        if let Some(user_id) = self.user_id {
            if record.user_id() != user_id {
                return false;
            }
        }
        if let Some(book_id) = self.book_id {
            if record.book_id() != book_id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if record.kind() != kind {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&record.status()) {
            return false;
        }
        if let Some(cutoff) = self.due_before {
            match record {
                BorrowRecord::Borrow(entry) => {
                    if entry.due_date >= cutoff {
                        return false;
                    }
                }
                // 予約に返却期限はない
                BorrowRecord::Reservation(_) => return false,
            }
        }
        true
    }
}

/// 貸出台帳ストアポート
///
/// 記録は物理削除されない（監査証跡）。キャンセル・返却は
/// 終端ステータスへの遷移として保存される。
#[async_trait]
pub trait BorrowStore: Send + Sync {
    /// IDで記録を取得する
    async fn get(&self, borrow_id: BorrowId) -> Result<Option<BorrowRecord>>;

    /// 記録を保存する（upsert）
    ///
    /// 貸出サービスだけが記録を変更する。保存は常に完全な状態を書き込む。
    async fn save(&self, record: &BorrowRecord) -> Result<()>;

    /// フィルタに一致する記録を検索する
    async fn find(&self, filter: &BorrowFilter) -> Result<Vec<BorrowRecord>>;

    /// フィルタに一致する記録の件数
    ///
    /// 貸出上限（利用者ごと最大5冊）の確認に使用される。
    async fn count(&self, filter: &BorrowFilter) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::borrow::{borrow_book, reserve_book};
    use chrono::Duration;

    #[test]
    fn test_filter_matches_on_user_kind_and_status() {
        let now = Utc::now();
        let user_id = UserId::new();
        let record = BorrowRecord::Borrow(borrow_book(BookId::new(), user_id, now));

        assert!(BorrowFilter::active_borrows_for_user(user_id).matches(&record));
        assert!(!BorrowFilter::active_borrows_for_user(UserId::new()).matches(&record));
        assert!(!BorrowFilter::active_reservations_for_user(user_id).matches(&record));
    }

    #[test]
    fn test_filter_due_before_excludes_reservations() {
        let now = Utc::now();
        let reservation = BorrowRecord::Reservation(reserve_book(BookId::new(), UserId::new(), now));

        // 予約は延滞スキャンの対象外
        assert!(!BorrowFilter::overdue_candidates(now + Duration::days(30)).matches(&reservation));
    }

    #[test]
    fn test_overdue_candidates_filter() {
        let now = Utc::now();
        let record = BorrowRecord::Borrow(borrow_book(BookId::new(), UserId::new(), now));

        // 期限内は候補にならない
        assert!(!BorrowFilter::overdue_candidates(now + Duration::days(7)).matches(&record));
        // 期限超過で候補になる
        assert!(BorrowFilter::overdue_candidates(now + Duration::days(20)).matches(&record));
    }

    #[test]
    fn test_empty_status_set_matches_any_status() {
        let now = Utc::now();
        let user_id = UserId::new();
        let record = BorrowRecord::Borrow(borrow_book(BookId::new(), user_id, now));

        let filter = BorrowFilter {
            user_id: Some(user_id),
            kind: Some(BorrowKind::Borrow),
            ..BorrowFilter::default()
        };
        assert!(filter.matches(&record));
    }
}
