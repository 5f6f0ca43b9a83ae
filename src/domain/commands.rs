use serde::{Deserialize, Serialize};

use super::{BookId, BorrowId, UserId};

/// コマンド：書籍を借りる
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowBook {
    pub book_id: BookId,
    pub user_id: UserId,
}

/// コマンド：書籍を予約する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveBook {
    pub book_id: BookId,
    pub user_id: UserId,
}

/// コマンド：書籍を返却する
///
/// `user_id`は認証コラボレーターが確認した呼び出し元。
/// 記録の所有者と一致しない場合、操作は拒否される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub borrow_id: BorrowId,
    pub user_id: UserId,
}

/// コマンド：貸出を更新する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewBorrow {
    pub borrow_id: BorrowId,
    pub user_id: UserId,
}

/// コマンド：予約をキャンセルする
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelReservation {
    pub borrow_id: BorrowId,
    pub user_id: UserId,
}
