use super::value_objects::RenewalError;

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnBookError {
    /// 既に返却済み
    AlreadyReturned,
}

/// 更新のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewBorrowError {
    /// 既に返却済み
    AlreadyReturned,
    /// 更新回数の上限（3回）を超えた
    RenewalLimitExceeded,
    /// 延滞中のため更新不可
    CannotRenewOverdue,
}

impl From<RenewalError> for RenewBorrowError {
    fn from(err: RenewalError) -> Self {
        match err {
            RenewalError::LimitExceeded => RenewBorrowError::RenewalLimitExceeded,
        }
    }
}

/// 予約キャンセルのエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReservationError {
    /// Active状態ではない（キャンセル・充足・失効済み）
    NotActive,
}
