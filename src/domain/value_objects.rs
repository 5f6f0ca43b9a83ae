use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 貸出記録ID - 貸出台帳コンテキストの集約ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BorrowId(Uuid);

impl BorrowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BorrowId {
    fn default() -> Self {
        Self::new()
    }
}

/// 書籍ID - カタログコンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

/// 利用者ID - 認証コンテキストへの参照
///
/// コアは安定した識別子のみを必要とし、認証情報は所有しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// 利用者ロール
///
/// 認証コラボレーターから信頼済み入力として渡される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Librarian,
    Admin,
}

impl Role {
    /// 職員（司書または管理者）か
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Librarian | Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Librarian => "librarian",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "librarian" => Ok(Role::Librarian),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// 更新回数エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewalError {
    /// 更新回数の上限を超えた
    LimitExceeded,
}

/// 更新回数の上限
pub const MAX_RENEWALS: u8 = 3;

/// 貸出更新回数
///
/// 不変条件：更新は3回まで。
/// 型システムでこの制約を強制し、不正な値（4以上）を作成できないようにする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalCount(u8);

impl RenewalCount {
    /// 新規作成（0回）
    pub fn new() -> Self {
        Self(0)
    }

    /// 更新回数を増やす
    ///
    /// # エラー
    /// 既に3回更新済みの場合は`RenewalError::LimitExceeded`を返す
    pub fn increment(self) -> Result<Self, RenewalError> {
        if self.0 >= MAX_RENEWALS {
            return Err(RenewalError::LimitExceeded);
        }
        Ok(Self(self.0 + 1))
    }

    /// 現在の回数
    pub fn value(&self) -> u8 {
        self.0
    }

    /// 更新可能か（上限に達していないか）
    pub fn can_renew(&self) -> bool {
        self.0 < MAX_RENEWALS
    }
}

impl Default for RenewalCount {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<u8> for RenewalCount {
    type Error = RenewalError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > MAX_RENEWALS {
            return Err(RenewalError::LimitExceeded);
        }
        Ok(Self(value))
    }
}

/// 延滞料金
///
/// 金額はセント単位の整数で保持する（浮動小数点の誤差を避けるため）。
/// 支払い処理はスコープ外のため、支払い済みフラグのみ持つ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fine {
    pub amount_cents: i64,
    pub paid: bool,
}

impl Fine {
    /// 料金なし
    pub fn none() -> Self {
        Self {
            amount_cents: 0,
            paid: false,
        }
    }

    pub fn is_due(&self) -> bool {
        self.amount_cents > 0 && !self.paid
    }
}

impl Default for Fine {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // TDD: RenewalCount のテスト
    #[test]
    fn test_renewal_count_new() {
        let count = RenewalCount::new();
        assert_eq!(count.value(), 0);
    }

    #[test]
    fn test_renewal_count_can_renew_initially() {
        let count = RenewalCount::new();
        assert!(count.can_renew());
    }

    #[test]
    fn test_renewal_count_increment_success() {
        let count = RenewalCount::new();
        let result = count.increment();
        assert!(result.is_ok());
        assert_eq!(result.unwrap().value(), 1);
    }

    #[test]
    fn test_renewal_count_allows_exactly_three_renewals() {
        let count = RenewalCount::new()
            .increment()
            .unwrap()
            .increment()
            .unwrap()
            .increment()
            .unwrap();
        assert_eq!(count.value(), 3);
        assert!(!count.can_renew());
    }

    #[test]
    fn test_renewal_count_increment_fails_after_three() {
        let count = RenewalCount::new()
            .increment()
            .unwrap()
            .increment()
            .unwrap()
            .increment()
            .unwrap();
        let result = count.increment();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err(), RenewalError::LimitExceeded);
    }

    #[test]
    fn test_renewal_count_try_from_valid() {
        for value in 0..=3u8 {
            let count = RenewalCount::try_from(value);
            assert!(count.is_ok());
            assert_eq!(count.unwrap().value(), value);
        }
    }

    #[test]
    fn test_renewal_count_try_from_invalid() {
        let count = RenewalCount::try_from(4);
        assert!(count.is_err());
        assert_eq!(count.unwrap_err(), RenewalError::LimitExceeded);

        let count = RenewalCount::try_from(255);
        assert!(count.is_err());
    }

    // ID value objects のテスト
    #[test]
    fn test_borrow_id_creation() {
        let id1 = BorrowId::new();
        let id2 = BorrowId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_borrow_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = BorrowId::from_uuid(uuid);
        assert_eq!(id.value(), uuid);
    }

    #[test]
    fn test_book_id_creation() {
        let id1 = BookId::new();
        let id2 = BookId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_user_id_creation() {
        let id1 = UserId::new();
        let id2 = UserId::new();
        assert_ne!(id1, id2);
    }

    // Role のテスト
    #[test]
    fn test_role_is_staff() {
        assert!(!Role::User.is_staff());
        assert!(Role::Librarian.is_staff());
        assert!(Role::Admin.is_staff());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::User, Role::Librarian, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_from_str_invalid() {
        assert!("staff".parse::<Role>().is_err());
    }

    // Fine のテスト
    #[test]
    fn test_fine_none_is_not_due() {
        assert!(!Fine::none().is_due());
    }

    #[test]
    fn test_fine_unpaid_amount_is_due() {
        let fine = Fine {
            amount_cents: 150,
            paid: false,
        };
        assert!(fine.is_due());
    }

    #[test]
    fn test_fine_paid_amount_is_not_due() {
        let fine = Fine {
            amount_cents: 150,
            paid: true,
        };
        assert!(!fine.is_due());
    }
}
