//! Audit history of estado changes.

use log::info;
use shared::{HistoryEntry, HistoryListResponse};

use crate::backend::domain::filters::HistoryFilter;
use crate::backend::domain::models::DomainError;
use crate::backend::storage::SharedRepository;

#[derive(Clone)]
pub struct HistoryService {
    repository: SharedRepository,
}

impl HistoryService {
    pub fn new(repository: SharedRepository) -> Self {
        Self { repository }
    }

    /// Full history, newest first, narrowed by `filter`
    pub async fn list(&self, filter: &HistoryFilter) -> Result<HistoryListResponse, DomainError> {
        let entries = self.recent(None).await?;
        let total = entries.len();
        let entries = filter.apply(entries);
        info!("Listing {} of {} history entries", entries.len(), total);

        Ok(HistoryListResponse {
            filtered: entries.len(),
            total,
            entries,
        })
    }

    /// Newest entries first, at most `limit` when given
    pub async fn recent(&self, limit: Option<u32>) -> Result<Vec<HistoryEntry>, DomainError> {
        self.repository
            .list_history(limit)
            .await
            .map_err(DomainError::operation_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::InMemoryRepository;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use shared::{Estado, StateChange};
    use std::sync::Arc;
    use uuid::Uuid;

    fn change(offset_days: i64, reason: &str) -> StateChange {
        let base = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        StateChange {
            id: Uuid::new_v4(),
            unit_id: Uuid::new_v4(),
            from_estado: Some(Estado::Libre),
            to_estado: Estado::Bloqueada,
            manager_id: None,
            responsible_id: None,
            reason: Some(reason.to_string()),
            actor_user_id: None,
            actor_name: None,
            created_at: base + Duration::days(offset_days),
        }
    }

    fn setup() -> HistoryService {
        let repository = Arc::new(InMemoryRepository::new());
        for (offset, reason) in [(0, "primera"), (5, "segunda"), (6, "tercera")] {
            repository.seed_change(change(offset, reason)).unwrap();
        }
        HistoryService::new(repository)
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_filtered() {
        let service = setup();

        let all = service.list(&HistoryFilter::default()).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.entries[0].change.reason.as_deref(), Some("tercera"));

        let filter = HistoryFilter {
            date_to: NaiveDate::from_ymd_opt(2024, 1, 15),
            ..Default::default()
        };
        let until_15 = service.list(&filter).await.unwrap();
        assert_eq!(until_15.filtered, 2);
        assert_eq!(until_15.total, 3);
    }

    #[tokio::test]
    async fn test_recent_respects_limit() {
        let service = setup();
        let recent = service.recent(Some(2)).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].change.reason.as_deref(), Some("segunda"));
    }
}
