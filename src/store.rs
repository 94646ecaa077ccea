//! Event persistence.

pub mod dynamodb;
pub mod memory;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::errors::RecorderError;
use crate::models::SeismicEvent;

pub use dynamodb::DynamoDbStore;
pub use memory::MemoryEventStore;

/// How a new batch relates to previously stored events.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// Clear previously stored events, then write the batch. The store
    /// holds only the latest report.
    #[default]
    Replace,
    /// Write the batch next to whatever is already stored.
    Append,
}

/// Keyed storage for normalized events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Write every event in the batch, one item per event.
    async fn put_events(&self, events: &[SeismicEvent]) -> Result<(), RecorderError>;

    /// List ids of all stored events.
    async fn scan_ids(&self) -> Result<Vec<String>, RecorderError>;

    /// Delete the events with the given ids.
    async fn delete_events(&self, ids: &[String]) -> Result<(), RecorderError>;

    /// Read one event by id.
    async fn get_event(&self, id: &str) -> Result<Option<SeismicEvent>, RecorderError>;
}

/// Write a batch according to `mode`.
///
/// Replace clears the store first, so a failure while clearing leaves the
/// run with nothing written. Writes go one item at a time and are not
/// transactional; a mid-batch failure can leave earlier events stored.
pub async fn persist<S: EventStore + ?Sized>(
    store: &S,
    mode: PersistenceMode,
    events: &[SeismicEvent],
) -> Result<(), RecorderError> {
    if mode == PersistenceMode::Replace {
        let existing = store.scan_ids().await?;
        if !existing.is_empty() {
            info!(count = existing.len(), "Clearing previously stored events");
            store.delete_events(&existing).await?;
        }
    }
    store.put_events(events).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventAttributes, RawEpoch};

    fn event(source_id: &str) -> SeismicEvent {
        SeismicEvent::from_attributes(EventAttributes {
            source_id: Some(source_id.to_string()),
            event_time: RawEpoch::Millis(1_700_000_000_000),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn replace_clears_previous_events() {
        let store = MemoryEventStore::new();
        persist(&store, PersistenceMode::Replace, &[event("1"), event("2")])
            .await
            .unwrap();
        persist(&store, PersistenceMode::Replace, &[event("3")])
            .await
            .unwrap();

        let stored = store.snapshot().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].source_id, "3");
    }

    #[tokio::test]
    async fn append_keeps_previous_events() {
        let store = MemoryEventStore::new();
        persist(&store, PersistenceMode::Append, &[event("1"), event("2")])
            .await
            .unwrap();
        persist(&store, PersistenceMode::Append, &[event("3")])
            .await
            .unwrap();

        assert_eq!(store.snapshot().await.len(), 3);
    }

    #[tokio::test]
    async fn replace_with_empty_batch_clears_the_store() {
        let store = MemoryEventStore::new();
        persist(&store, PersistenceMode::Append, &[event("1")])
            .await
            .unwrap();
        persist(&store, PersistenceMode::Replace, &[]).await.unwrap();

        assert!(store.snapshot().await.is_empty());
    }
}
