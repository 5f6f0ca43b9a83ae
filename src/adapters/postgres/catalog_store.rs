use crate::domain::book::{Book, Rating};
use crate::domain::value_objects::BookId;
use crate::ports::catalog_store::{AvailabilityUpdate, CatalogStore as CatalogStoreTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// PostgreSQLの行データをBookに変換する
///
/// quantityとavailableのi32からu32への変換でエラーハンドリングを行う。
fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let quantity_i32: i32 = row.get("quantity");
    let quantity: u32 = quantity_i32
        .try_into()
        .map_err(|_| invalid_data(format!("quantity out of range: {}", quantity_i32)))?;

    let available_i32: i32 = row.get("available");
    let available: u32 = available_i32
        .try_into()
        .map_err(|_| invalid_data(format!("available out of range: {}", available_i32)))?;

    let rating_count_i32: i32 = row.get("rating_count");
    let rating_count: u32 = rating_count_i32
        .try_into()
        .map_err(|_| invalid_data(format!("rating_count out of range: {}", rating_count_i32)))?;

    Ok(Book {
        book_id: BookId::from_uuid(row.get("book_id")),
        title: row.get("title"),
        author: row.get("author"),
        isbn: row.get("isbn"),
        quantity,
        available,
        rating: Rating {
            average: row.get("rating_average"),
            count: rating_count,
        },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// CatalogStoreのPostgreSQL実装
pub struct CatalogStore {
    pool: PgPool,
}

impl CatalogStore {
    /// PostgreSQLコネクションプールから新しいCatalogStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStoreTrait for CatalogStore {
    /// IDで書籍を取得
    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT
                book_id,
                title,
                author,
                isbn,
                quantity,
                available,
                rating_average,
                rating_count,
                created_at,
                updated_at
            FROM books
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    /// 書籍を保存（upsert）
    ///
    /// INSERT ... ON CONFLICT UPDATEを使用して冪等性を保証する。
    async fn save_book(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (
                book_id,
                title,
                author,
                isbn,
                quantity,
                available,
                rating_average,
                rating_count,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (book_id)
            DO UPDATE SET
                title = EXCLUDED.title,
                author = EXCLUDED.author,
                isbn = EXCLUDED.isbn,
                quantity = EXCLUDED.quantity,
                available = EXCLUDED.available,
                rating_average = EXCLUDED.rating_average,
                rating_count = EXCLUDED.rating_count,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.quantity as i32)
        .bind(book.available as i32)
        .bind(book.rating.average)
        .bind(book.rating.count as i32)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 在庫カウンターを原子的に増減する
    ///
    /// 条件付きUPDATEで確認と更新を1文にまとめる。並行する貸出が
    /// 同じ最後の1冊を取り合っても、成功するのは1つだけ。
    async fn adjust_available(&self, book_id: BookId, delta: i32) -> Result<AvailabilityUpdate> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available = available + $2,
                updated_at = NOW()
            WHERE book_id = $1
              AND available + $2 BETWEEN 0 AND quantity
            "#,
        )
        .bind(book_id.value())
        .bind(delta)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(AvailabilityUpdate::Adjusted);
        }

        // 更新されなかった理由（存在しない／範囲外）を区別する
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE book_id = $1)")
                .bind(book_id.value())
                .fetch_one(&self.pool)
                .await?;

        if exists {
            Ok(AvailabilityUpdate::OutOfRange)
        } else {
            Ok(AvailabilityUpdate::NotFound)
        }
    }
}
