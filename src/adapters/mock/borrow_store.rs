use crate::domain::borrow::BorrowRecord;
use crate::domain::value_objects::BorrowId;
use crate::ports::borrow_store::{BorrowFilter, BorrowSort, BorrowStore as BorrowStoreTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory implementation of BorrowStore
///
/// Backs the integration tests and local runs without a database.
/// Filtering, sorting and pagination mirror the SQL implementation.
pub struct BorrowStore {
    records: Mutex<HashMap<BorrowId, BorrowRecord>>,
}

impl BorrowStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for BorrowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BorrowStoreTrait for BorrowStore {
    async fn get(&self, borrow_id: BorrowId) -> Result<Option<BorrowRecord>> {
        Ok(self.records.lock().unwrap().get(&borrow_id).cloned())
    }

    async fn save(&self, record: &BorrowRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .insert(record.borrow_id(), record.clone());
        Ok(())
    }

    async fn find(&self, filter: &BorrowFilter) -> Result<Vec<BorrowRecord>> {
        let records = self.records.lock().unwrap();
        let mut matched: Vec<BorrowRecord> = records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();

        match filter.sort {
            BorrowSort::NewestFirst => {
                matched.sort_by(|a, b| b.started_at().cmp(&a.started_at()));
            }
            BorrowSort::DueDateAsc => {
                // due_beforeフィルタを通った記録はすべて貸出記録
                matched.sort_by_key(|r| match r {
                    BorrowRecord::Borrow(e) => e.due_date,
                    BorrowRecord::Reservation(e) => e.expires_at,
                });
            }
        }

        let offset = filter.offset.unwrap_or(0) as usize;
        let matched: Vec<BorrowRecord> = match filter.limit {
            Some(limit) => matched.into_iter().skip(offset).take(limit as usize).collect(),
            None => matched.into_iter().skip(offset).collect(),
        };

        Ok(matched)
    }

    async fn count(&self, filter: &BorrowFilter) -> Result<u64> {
        let records = self.records.lock().unwrap();
        Ok(records.values().filter(|r| filter.matches(r)).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::borrow::{BorrowKind, borrow_book};
    use crate::domain::value_objects::{BookId, UserId};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_find_sorts_newest_first_and_applies_limit() {
        let store = BorrowStore::new();
        let user_id = UserId::new();
        let base = Utc::now();

        for day in 0..3 {
            let entry = borrow_book(BookId::new(), user_id, base + Duration::days(day));
            store.save(&BorrowRecord::Borrow(entry)).await.unwrap();
        }

        let filter = BorrowFilter {
            user_id: Some(user_id),
            kind: Some(BorrowKind::Borrow),
            limit: Some(2),
            ..BorrowFilter::default()
        };
        let found = store.find(&filter).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].started_at(), base + Duration::days(2));
        assert_eq!(found[1].started_at(), base + Duration::days(1));
    }

    #[tokio::test]
    async fn test_save_is_an_upsert() {
        let store = BorrowStore::new();
        let entry = borrow_book(BookId::new(), UserId::new(), Utc::now());
        let record = BorrowRecord::Borrow(entry.clone());

        store.save(&record).await.unwrap();
        store.save(&record).await.unwrap();

        assert_eq!(store.count(&BorrowFilter::default()).await.unwrap(), 1);
        let loaded = store.get(entry.borrow_id).await.unwrap().unwrap();
        assert_eq!(loaded, record);
    }
}
