use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::application::lending::SweepReport;
use crate::domain::borrow::BorrowRecord;

/// 成功レスポンスの封筒
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub status: &'static str,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

/// エラーレスポンスの封筒
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

/// 貸出記録レスポンス
///
/// 種別に存在しないフィールドはnullになる。
#[derive(Debug, Serialize)]
pub struct BorrowRecordResponse {
    pub borrow_id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub status: String,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub renewal_count: Option<u8>,
    pub fine_cents: Option<i64>,
    pub fine_paid: Option<bool>,
    pub reserved_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BorrowRecord> for BorrowRecordResponse {
    fn from(record: BorrowRecord) -> Self {
        let kind = record.kind().as_str().to_string();
        let status = record.status().as_str().to_string();
        match record {
            BorrowRecord::Borrow(e) => Self {
                borrow_id: e.borrow_id.value(),
                book_id: e.book_id.value(),
                user_id: e.user_id.value(),
                kind,
                status,
                borrowed_at: Some(e.borrowed_at),
                due_date: Some(e.due_date),
                returned_at: e.returned_at,
                renewal_count: Some(e.renewal_count.value()),
                fine_cents: Some(e.fine.amount_cents),
                fine_paid: Some(e.fine.paid),
                reserved_at: None,
                expires_at: None,
                created_at: e.created_at,
                updated_at: e.updated_at,
            },
            BorrowRecord::Reservation(e) => Self {
                borrow_id: e.borrow_id.value(),
                book_id: e.book_id.value(),
                user_id: e.user_id.value(),
                kind,
                status,
                borrowed_at: None,
                due_date: None,
                returned_at: None,
                renewal_count: None,
                fine_cents: None,
                fine_paid: None,
                reserved_at: Some(e.reserved_at),
                expires_at: Some(e.expires_at),
                created_at: e.created_at,
                updated_at: e.updated_at,
            },
        }
    }
}

/// 記録一覧レスポンス
#[derive(Debug, Serialize)]
pub struct RecordListResponse {
    pub count: usize,
    pub records: Vec<BorrowRecordResponse>,
}

impl From<Vec<BorrowRecord>> for RecordListResponse {
    fn from(records: Vec<BorrowRecord>) -> Self {
        let records: Vec<BorrowRecordResponse> =
            records.into_iter().map(BorrowRecordResponse::from).collect();
        Self {
            count: records.len(),
            records,
        }
    }
}

/// 延滞スキャンレスポンス（GET /borrows/overdue）
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    /// 今回のスキャンでOverdueに遷移した件数
    pub flagged: usize,
    pub count: usize,
    pub records: Vec<BorrowRecordResponse>,
}

impl From<SweepReport> for SweepResponse {
    fn from(report: SweepReport) -> Self {
        let records: Vec<BorrowRecordResponse> = report
            .records
            .into_iter()
            .map(BorrowRecordResponse::from)
            .collect();
        Self {
            flagged: report.flagged,
            count: records.len(),
            records,
        }
    }
}
