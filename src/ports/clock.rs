use chrono::{DateTime, Utc};

/// 時刻ソースポート
///
/// 決定的なテストのため、現在時刻の取得を注入可能にする。
/// 期限・延滞・料金の判定はすべてこのポート経由の時刻を使う。
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 本番用のシステム時刻
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
