use thiserror::Error;

/// 失敗の分類
///
/// API層はこの分類をHTTPステータスコードに写像する。
/// ビジネスルール違反は呼び出し元に説明的な失敗として返され、
/// 自動リトライは行われない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 書籍または記録が存在しない
    NotFound,
    /// 所有者の不一致
    Forbidden,
    /// ビジネスルール違反（重複貸出、上限超過、返却済みなど）
    Conflict,
    /// 入力が不正
    InvalidArgument,
    /// ストレージ障害
    Unavailable,
}

/// 貸出アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LendingError {
    /// 書籍が見つからない
    #[error("Book not found")]
    BookNotFound,

    /// 貸出記録が見つからない
    #[error("Borrow record not found")]
    RecordNotFound,

    /// 貸出可能な冊数がない
    #[error("Book is currently not available")]
    BookNotAvailable,

    /// 同じ書籍を既に借りている
    #[error("You have already borrowed this book")]
    AlreadyBorrowed,

    /// 同じ書籍を既に予約している
    #[error("You have already reserved this book")]
    AlreadyReserved,

    /// 貸出上限（5冊）に達している
    #[error("You have reached the maximum borrow limit of 5 books")]
    BorrowLimitExceeded,

    /// 記録の所有者ではない
    #[error("Not authorized to modify this record")]
    NotRecordOwner,

    /// 既に返却済み
    #[error("Book has already been returned")]
    AlreadyReturned,

    /// 更新回数の上限（3回）に達している
    #[error("Maximum renewal limit (3) reached")]
    RenewalLimitExceeded,

    /// 延滞中は更新できない
    #[error("Cannot renew overdue books")]
    CannotRenewOverdue,

    /// 貸出記録ではない
    #[error("This is not a borrow")]
    NotABorrow,

    /// 予約記録ではない
    #[error("This is not a reservation")]
    NotAReservation,

    /// 予約が有効ではない（キャンセル・充足・失効済み）
    #[error("Reservation is no longer active")]
    ReservationNotActive,

    /// 在庫カウンターが不整合（返却で所蔵冊数を超えるなど）
    #[error("Catalog inventory is inconsistent")]
    InventoryInconsistent,

    /// カタログストアのエラー
    #[error("Catalog store error")]
    CatalogStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 貸出台帳ストアのエラー
    #[error("Borrow store error")]
    BorrowStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LendingError {
    /// 失敗の分類を返す
    pub fn class(&self) -> ErrorClass {
        match self {
            LendingError::BookNotFound | LendingError::RecordNotFound => ErrorClass::NotFound,
            LendingError::NotRecordOwner => ErrorClass::Forbidden,
            LendingError::BookNotAvailable
            | LendingError::AlreadyBorrowed
            | LendingError::AlreadyReserved
            | LendingError::BorrowLimitExceeded
            | LendingError::AlreadyReturned
            | LendingError::RenewalLimitExceeded
            | LendingError::CannotRenewOverdue
            | LendingError::NotABorrow
            | LendingError::NotAReservation
            | LendingError::ReservationNotActive => ErrorClass::Conflict,
            LendingError::InventoryInconsistent
            | LendingError::CatalogStoreError(_)
            | LendingError::BorrowStoreError(_) => ErrorClass::Unavailable,
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LendingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes_cover_taxonomy() {
        assert_eq!(LendingError::BookNotFound.class(), ErrorClass::NotFound);
        assert_eq!(LendingError::RecordNotFound.class(), ErrorClass::NotFound);
        assert_eq!(LendingError::NotRecordOwner.class(), ErrorClass::Forbidden);
        assert_eq!(LendingError::AlreadyBorrowed.class(), ErrorClass::Conflict);
        assert_eq!(LendingError::BorrowLimitExceeded.class(), ErrorClass::Conflict);
        assert_eq!(LendingError::AlreadyReturned.class(), ErrorClass::Conflict);
        assert_eq!(
            LendingError::InventoryInconsistent.class(),
            ErrorClass::Unavailable
        );
    }
}
