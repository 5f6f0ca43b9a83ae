use crate::domain::borrow::{
    BorrowEntry, BorrowKind, BorrowRecord, BorrowStatus, RecordStatus, ReservationEntry,
    ReservationStatus,
};
use crate::domain::value_objects::{BookId, BorrowId, Fine, RenewalCount, UserId};
use crate::ports::borrow_store::{BorrowFilter, BorrowSort, BorrowStore as BorrowStoreTrait, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use std::str::FromStr;

fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// PostgreSQLの行データをBorrowRecordに変換する
///
/// kind列で判別し、種別ごとの必須列（due_date / expires_at）が
/// NULLの場合はデータ不整合としてエラーを返す。
fn map_row_to_record(row: &PgRow) -> Result<BorrowRecord> {
    let borrow_id = BorrowId::from_uuid(row.get("borrow_id"));
    let book_id = BookId::from_uuid(row.get("book_id"));
    let user_id = UserId::from_uuid(row.get("user_id"));

    let kind_str: &str = row.get("kind");
    let kind = BorrowKind::from_str(kind_str).map_err(invalid_data)?;

    let status_str: &str = row.get("status");
    let status = RecordStatus::from_str(status_str).map_err(invalid_data)?;

    let started_at: DateTime<Utc> = row.get("started_at");
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    match kind {
        BorrowKind::Borrow => {
            let status = BorrowStatus::try_from(status).map_err(invalid_data)?;

            let due_date: Option<DateTime<Utc>> = row.get("due_date");
            let due_date = due_date
                .ok_or_else(|| invalid_data(format!("borrow {} has no due_date", borrow_id.value())))?;

            let renewal_count_i16: Option<i16> = row.get("renewal_count");
            let renewal_count_u8: u8 = renewal_count_i16
                .unwrap_or(0)
                .try_into()
                .map_err(|_| invalid_data(format!("renewal_count out of range: {:?}", renewal_count_i16)))?;
            let renewal_count = RenewalCount::try_from(renewal_count_u8)
                .map_err(|_| invalid_data(format!("renewal_count out of range: {}", renewal_count_u8)))?;

            let fine_cents: Option<i64> = row.get("fine_cents");
            let fine_paid: Option<bool> = row.get("fine_paid");

            Ok(BorrowRecord::Borrow(BorrowEntry {
                borrow_id,
                book_id,
                user_id,
                status,
                borrowed_at: started_at,
                due_date,
                returned_at: row.get("returned_at"),
                renewal_count,
                fine: Fine {
                    amount_cents: fine_cents.unwrap_or(0),
                    paid: fine_paid.unwrap_or(false),
                },
                created_at,
                updated_at,
            }))
        }
        BorrowKind::Reservation => {
            let status = ReservationStatus::try_from(status).map_err(invalid_data)?;

            let expires_at: Option<DateTime<Utc>> = row.get("expires_at");
            let expires_at = expires_at.ok_or_else(|| {
                invalid_data(format!("reservation {} has no expires_at", borrow_id.value()))
            })?;

            Ok(BorrowRecord::Reservation(ReservationEntry {
                borrow_id,
                book_id,
                user_id,
                status,
                reserved_at: started_at,
                expires_at,
                created_at,
                updated_at,
            }))
        }
    }
}

/// フィルタ述語をWHERE句に変換する
///
/// インメモリ実装の`BorrowFilter::matches`と同じ判定をSQLで行う。
fn push_filter_conditions(builder: &mut QueryBuilder<'_, Postgres>, filter: &BorrowFilter) {
    if let Some(user_id) = filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id.value());
    }
    if let Some(book_id) = filter.book_id {
        builder.push(" AND book_id = ").push_bind(book_id.value());
    }
    if let Some(kind) = filter.kind {
        builder.push(" AND kind = ").push_bind(kind.as_str());
    }
    if !filter.statuses.is_empty() {
        let statuses: Vec<String> = filter
            .statuses
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        builder.push(" AND status = ANY(").push_bind(statuses).push(")");
    }
    if let Some(cutoff) = filter.due_before {
        // 予約に返却期限はない
        builder
            .push(" AND kind = 'borrow' AND due_date < ")
            .push_bind(cutoff);
    }
}

/// BorrowStoreのPostgreSQL実装
///
/// 記録は物理削除されない。終端ステータスへの遷移もupsertで保存する。
pub struct BorrowStore {
    pool: PgPool,
}

impl BorrowStore {
    /// PostgreSQLコネクションプールから新しいBorrowStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowStoreTrait for BorrowStore {
    /// IDで記録を取得
    async fn get(&self, borrow_id: BorrowId) -> Result<Option<BorrowRecord>> {
        let row = sqlx::query(
            r#"
            SELECT
                borrow_id,
                book_id,
                user_id,
                kind,
                status,
                started_at,
                due_date,
                returned_at,
                renewal_count,
                fine_cents,
                fine_paid,
                expires_at,
                created_at,
                updated_at
            FROM borrow_records
            WHERE borrow_id = $1
            "#,
        )
        .bind(borrow_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_record).transpose()
    }

    /// 記録を保存（upsert）
    ///
    /// INSERT ... ON CONFLICT UPDATEを使用して冪等性を保証する。
    /// 種別に存在しない列はNULLで保存する。
    async fn save(&self, record: &BorrowRecord) -> Result<()> {
        let (due_date, returned_at, renewal_count, fine_cents, fine_paid, expires_at) =
            match record {
                BorrowRecord::Borrow(e) => (
                    Some(e.due_date),
                    e.returned_at,
                    Some(e.renewal_count.value() as i16),
                    Some(e.fine.amount_cents),
                    Some(e.fine.paid),
                    None,
                ),
                BorrowRecord::Reservation(e) => {
                    (None, None, None, None, None, Some(e.expires_at))
                }
            };

        let (created_at, updated_at) = match record {
            BorrowRecord::Borrow(e) => (e.created_at, e.updated_at),
            BorrowRecord::Reservation(e) => (e.created_at, e.updated_at),
        };

        sqlx::query(
            r#"
            INSERT INTO borrow_records (
                borrow_id,
                book_id,
                user_id,
                kind,
                status,
                started_at,
                due_date,
                returned_at,
                renewal_count,
                fine_cents,
                fine_paid,
                expires_at,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (borrow_id)
            DO UPDATE SET
                status = EXCLUDED.status,
                due_date = EXCLUDED.due_date,
                returned_at = EXCLUDED.returned_at,
                renewal_count = EXCLUDED.renewal_count,
                fine_cents = EXCLUDED.fine_cents,
                fine_paid = EXCLUDED.fine_paid,
                expires_at = EXCLUDED.expires_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(record.borrow_id().value())
        .bind(record.book_id().value())
        .bind(record.user_id().value())
        .bind(record.kind().as_str())
        .bind(record.status().as_str())
        .bind(record.started_at())
        .bind(due_date)
        .bind(returned_at)
        .bind(renewal_count)
        .bind(fine_cents)
        .bind(fine_paid)
        .bind(expires_at)
        .bind(created_at)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// フィルタに一致する記録を検索
    ///
    /// (user_id, book_id, status)と(status, due_date)のインデックスを
    /// 使用してパフォーマンスを最適化。
    async fn find(&self, filter: &BorrowFilter) -> Result<Vec<BorrowRecord>> {
        let mut builder = QueryBuilder::new(
            r#"
            SELECT
                borrow_id,
                book_id,
                user_id,
                kind,
                status,
                started_at,
                due_date,
                returned_at,
                renewal_count,
                fine_cents,
                fine_paid,
                expires_at,
                created_at,
                updated_at
            FROM borrow_records
            WHERE TRUE
            "#,
        );
        push_filter_conditions(&mut builder, filter);

        match filter.sort {
            BorrowSort::NewestFirst => builder.push(" ORDER BY started_at DESC"),
            BorrowSort::DueDateAsc => builder.push(" ORDER BY due_date ASC"),
        };

        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }
        if let Some(offset) = filter.offset {
            builder.push(" OFFSET ").push_bind(offset as i64);
        }

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(map_row_to_record).collect()
    }

    /// フィルタに一致する記録の件数
    async fn count(&self, filter: &BorrowFilter) -> Result<u64> {
        let mut builder =
            QueryBuilder::new("SELECT COUNT(*) FROM borrow_records WHERE TRUE");
        push_filter_conditions(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}
