//! In-memory processed-webhook ledger.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

#[derive(Default)]
pub struct InMemoryWebhookEventRepository {
    records: RwLock<HashMap<String, WebhookEventRecord>>,
}

impl InMemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.records.read().await.get(event_id).cloned())
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.event_id) {
            return Ok(SaveResult::AlreadyExists);
        }
        records.insert(record.event_id.clone(), record);
        Ok(SaveResult::Inserted)
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !r.processed_at.is_before(&cutoff));
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::WebhookOutcome;

    fn record(id: &str) -> WebhookEventRecord {
        WebhookEventRecord::applied(id, "payment_intent.succeeded", serde_json::json!({}))
    }

    #[tokio::test]
    async fn second_save_of_same_event_is_rejected() {
        let repo = InMemoryWebhookEventRepository::new();
        assert_eq!(repo.save(record("evt_1")).await.unwrap(), SaveResult::Inserted);
        assert_eq!(
            repo.save(record("evt_1")).await.unwrap(),
            SaveResult::AlreadyExists
        );

        let stored = repo.find_by_event_id("evt_1").await.unwrap().unwrap();
        assert_eq!(stored.outcome, WebhookOutcome::Applied);
    }

    #[tokio::test]
    async fn delete_before_purges_old_entries() {
        let repo = InMemoryWebhookEventRepository::new();
        let mut old = record("evt_old");
        old.processed_at =
            Timestamp::from_datetime(chrono::Utc::now() - chrono::Duration::days(40));
        repo.save(old).await.unwrap();
        repo.save(record("evt_new")).await.unwrap();

        let cutoff = Timestamp::from_datetime(chrono::Utc::now() - chrono::Duration::days(30));
        assert_eq!(repo.delete_before(cutoff).await.unwrap(), 1);
        assert!(repo.find_by_event_id("evt_old").await.unwrap().is_none());
        assert!(repo.find_by_event_id("evt_new").await.unwrap().is_some());
    }
}
