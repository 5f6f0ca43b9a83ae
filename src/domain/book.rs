use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::BookId;

/// 評価集計
///
/// レビューの投稿はカタログコラボレーターの責務。
/// コアは集計値を保持するのみで、変更しない。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: f64,
    pub count: u32,
}

impl Default for Rating {
    fn default() -> Self {
        Self {
            average: 0.0,
            count: 0,
        }
    }
}

/// 書籍ステータス（派生値）
///
/// `available > 0` の純粋関数。保存される状態ではない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Available,
    Unavailable,
}

/// 在庫操作エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// 貸出可能な冊数がない
    NoCopiesAvailable,
    /// 全冊が既に在庫にある（返却の重複など、データ不整合の兆候）
    AllCopiesPresent,
}

/// 書籍エンティティ
///
/// 不変条件：`0 <= available <= quantity`
/// `available` はコアが変更する唯一のカタログフィールド。
/// 在庫の増減は必ず `checkout` / `check_in` を通す。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    /// 所蔵冊数
    pub quantity: u32,
    /// 貸出されていない冊数
    pub available: u32,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// 新規書籍を作成する。全冊が貸出可能な状態で始まる。
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: Option<String>,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            book_id: BookId::new(),
            title: title.into(),
            author: author.into(),
            isbn,
            quantity,
            available: quantity,
            rating: Rating::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 派生ステータス
    pub fn status(&self) -> BookStatus {
        if self.available > 0 {
            BookStatus::Available
        } else {
            BookStatus::Unavailable
        }
    }

    /// 1冊を貸出在庫から引き落とす
    pub fn checkout(&mut self, now: DateTime<Utc>) -> Result<(), InventoryError> {
        if self.available == 0 {
            return Err(InventoryError::NoCopiesAvailable);
        }
        self.available -= 1;
        self.updated_at = now;
        Ok(())
    }

    /// 1冊を貸出在庫に戻す
    ///
    /// `available` が `quantity` を超えることはない。超えそうな場合は
    /// 返却の重複などの不整合としてエラーを返す。
    pub fn check_in(&mut self, now: DateTime<Utc>) -> Result<(), InventoryError> {
        if self.available >= self.quantity {
            return Err(InventoryError::AllCopiesPresent);
        }
        self.available += 1;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(quantity: u32) -> Book {
        Book::new("Dune", "Frank Herbert", None, quantity, Utc::now())
    }

    #[test]
    fn test_new_book_starts_fully_available() {
        let book = book(3);
        assert_eq!(book.quantity, 3);
        assert_eq!(book.available, 3);
        assert_eq!(book.status(), BookStatus::Available);
    }

    #[test]
    fn test_status_is_derived_from_available() {
        let mut book = book(1);
        assert_eq!(book.status(), BookStatus::Available);

        book.checkout(Utc::now()).unwrap();
        assert_eq!(book.available, 0);
        assert_eq!(book.status(), BookStatus::Unavailable);
    }

    #[test]
    fn test_checkout_fails_when_no_copies_available() {
        let mut book = book(1);
        book.checkout(Utc::now()).unwrap();

        let result = book.checkout(Utc::now());
        assert_eq!(result.unwrap_err(), InventoryError::NoCopiesAvailable);
        // 失敗しても在庫は変わらない
        assert_eq!(book.available, 0);
    }

    #[test]
    fn test_check_in_restores_availability() {
        let mut book = book(2);
        book.checkout(Utc::now()).unwrap();
        book.check_in(Utc::now()).unwrap();
        assert_eq!(book.available, 2);
    }

    #[test]
    fn test_check_in_never_exceeds_quantity() {
        let mut book = book(2);
        let result = book.check_in(Utc::now());
        assert_eq!(result.unwrap_err(), InventoryError::AllCopiesPresent);
        assert_eq!(book.available, 2);
    }

    #[test]
    fn test_availability_stays_within_bounds_through_lifecycle() {
        let mut book = book(2);
        for _ in 0..2 {
            book.checkout(Utc::now()).unwrap();
            assert!(book.available <= book.quantity);
        }
        assert!(book.checkout(Utc::now()).is_err());
        for _ in 0..2 {
            book.check_in(Utc::now()).unwrap();
            assert!(book.available <= book.quantity);
        }
        assert!(book.check_in(Utc::now()).is_err());
    }
}
