use crate::domain::{self, BorrowRecord};
use crate::ports::BorrowFilter;

use super::errors::{LendingError, Result};
use super::lending_service::ServiceDependencies;

/// 延滞スキャンの結果
#[derive(Debug)]
pub struct SweepReport {
    /// 今回のスキャンでOverdueに遷移した件数
    pub flagged: usize,
    /// 返却期限を過ぎた貸出記録（遷移済みを含む、期限の古い順）
    pub records: Vec<BorrowRecord>,
}

/// 延滞スキャン（Overdue Sweeper）
///
/// 外部の呼び出し元（定期ジョブまたは職員の照会）から起動され、
/// 返却期限を過ぎた貸出記録を1回のスキャンで処理する。常駐ループは
/// 持たない。
///
/// ビジネスルール：
/// - 返却期限（due_date）を過ぎたActive状態の貸出をOverdueとする
/// - 遷移時に料金を計算して確定する
/// - 既にOverdueの記録は変更しない（料金は最初の検出時点で固定。
///   返却時に現在時刻で再計算され、その額が確定値となる）
/// - 返却済みの記録は対象外
///
/// 冪等性：時刻が進まない限り、再実行しても記録の状態は変わらない。
///
/// # 戻り値
/// 遷移件数と、期限超過中の全貸出記録
pub async fn sweep_overdue(deps: &ServiceDependencies) -> Result<SweepReport> {
    let now = deps.clock.now();
    let mut flagged = 0;

    // 1. 期限を過ぎたactive/overdueの貸出記録を取得
    let candidates = deps
        .borrow_store
        .find(&BorrowFilter::overdue_candidates(now))
        .await
        .map_err(LendingError::BorrowStoreError)?;

    // 2. まだActiveの記録のみ遷移させる
    let mut records = Vec::with_capacity(candidates.len());
    for record in candidates {
        let entry = match &record {
            BorrowRecord::Borrow(entry) => entry,
            // フィルタは貸出記録のみ返すが、型の上では予約もあり得る
            BorrowRecord::Reservation(_) => continue,
        };

        match domain::flag_overdue(entry, now) {
            Some(updated) => {
                let updated = BorrowRecord::Borrow(updated);
                deps.borrow_store
                    .save(&updated)
                    .await
                    .map_err(LendingError::BorrowStoreError)?;
                flagged += 1;
                records.push(updated);
            }
            // 既にOverdueの記録はそのまま報告に含める
            None => records.push(record),
        }
    }

    tracing::info!(flagged, total = records.len(), "overdue sweep completed");

    Ok(SweepReport { flagged, records })
}
