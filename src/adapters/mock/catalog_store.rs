use crate::domain::book::Book;
use crate::domain::value_objects::BookId;
use crate::ports::catalog_store::{AvailabilityUpdate, CatalogStore as CatalogStoreTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// CatalogStoreのインメモリ実装
///
/// 書籍を登録して状態を持ったテストをサポートする。
/// `adjust_available`はMutexの下で確認と更新を1操作として行い、
/// 本番実装の条件付きUPDATEと同じ原子性を持つ。
pub struct CatalogStore {
    books: Mutex<HashMap<BookId, Book>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(HashMap::new()),
        }
    }

    /// テスト用に書籍を登録する
    pub fn add_book(&self, book: Book) {
        self.books.lock().unwrap().insert(book.book_id, book);
    }

    /// 現在の在庫数を返す（テストの検証用）
    pub fn available_copies(&self, book_id: BookId) -> Option<u32> {
        self.books.lock().unwrap().get(&book_id).map(|b| b.available)
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStoreTrait for CatalogStore {
    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>> {
        Ok(self.books.lock().unwrap().get(&book_id).cloned())
    }

    async fn save_book(&self, book: &Book) -> Result<()> {
        self.books
            .lock()
            .unwrap()
            .insert(book.book_id, book.clone());
        Ok(())
    }

    /// ロックの下で範囲を確認してから更新する
    async fn adjust_available(&self, book_id: BookId, delta: i32) -> Result<AvailabilityUpdate> {
        let mut books = self.books.lock().unwrap();
        let Some(book) = books.get_mut(&book_id) else {
            return Ok(AvailabilityUpdate::NotFound);
        };

        let next = book.available as i64 + delta as i64;
        if next < 0 || next > book.quantity as i64 {
            return Ok(AvailabilityUpdate::OutOfRange);
        }

        book.available = next as u32;
        Ok(AvailabilityUpdate::Adjusted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_adjust_available_respects_bounds() {
        let store = CatalogStore::new();
        let book = Book::new("Dune", "Frank Herbert", None, 1, Utc::now());
        let book_id = book.book_id;
        store.add_book(book);

        // 1冊目の引き落としは成功、2冊目は範囲外
        assert_eq!(
            store.adjust_available(book_id, -1).await.unwrap(),
            AvailabilityUpdate::Adjusted
        );
        assert_eq!(
            store.adjust_available(book_id, -1).await.unwrap(),
            AvailabilityUpdate::OutOfRange
        );
        assert_eq!(store.available_copies(book_id), Some(0));

        // 戻し入れは所蔵冊数まで
        assert_eq!(
            store.adjust_available(book_id, 1).await.unwrap(),
            AvailabilityUpdate::Adjusted
        );
        assert_eq!(
            store.adjust_available(book_id, 1).await.unwrap(),
            AvailabilityUpdate::OutOfRange
        );
    }

    #[tokio::test]
    async fn test_adjust_available_unknown_book() {
        let store = CatalogStore::new();
        assert_eq!(
            store.adjust_available(BookId::new(), -1).await.unwrap(),
            AvailabilityUpdate::NotFound
        );
    }
}
