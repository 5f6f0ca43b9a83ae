use crate::ports::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// 手動で進める時刻ソース
///
/// テストから期限超過や料金計算を決定的に検証するために使う。
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// 時刻を設定する
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    /// 時刻を進める
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
