use crate::domain::book::Book;
use crate::domain::value_objects::BookId;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 在庫カウンター更新の結果
///
/// `available`はコアが変更する唯一の共有フィールドであり、
/// 更新の成否を呼び出し側が区別できる必要がある。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityUpdate {
    /// 更新に成功した
    Adjusted,
    /// 更新すると `0 <= available <= quantity` を外れるため拒否された
    OutOfRange,
    /// 書籍が存在しない
    NotFound,
}

/// カタログストアポート
///
/// 貸出コンテキストとカタログコンテキストの境界を維持する。
/// カタログのCRUD（登録・検索・レビュー）はコラボレーターの責務で、
/// コアは在庫カウンターの読み取りと増減のみを行う。
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// IDで書籍を取得する
    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>>;

    /// 書籍を保存する（upsert）
    async fn save_book(&self, book: &Book) -> Result<()>;

    /// 在庫カウンターを原子的に増減する
    ///
    /// 実装は check-then-act をストレージ側の1操作（トランザクション
    /// または条件付きUPDATE）で行い、読み取り・計算・書き戻しの
    /// 競合による負の在庫や所蔵超過を防がなければならない。
    async fn adjust_available(&self, book_id: BookId, delta: i32) -> Result<AvailabilityUpdate>;
}
