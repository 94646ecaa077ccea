//! In-memory store, for tests and local runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::RecorderError;
use crate::models::SeismicEvent;
use crate::store::EventStore;

/// [`EventStore`] backed by a shared map. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    events: Arc<RwLock<HashMap<String, SeismicEvent>>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store events directly, outside any persistence mode.
    pub async fn seed(&self, events: Vec<SeismicEvent>) {
        let mut guard = self.events.write().await;
        for event in events {
            guard.insert(event.id.clone(), event);
        }
    }

    /// All stored events, in no particular order.
    pub async fn snapshot(&self) -> Vec<SeismicEvent> {
        self.events.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn put_events(&self, events: &[SeismicEvent]) -> Result<(), RecorderError> {
        let mut guard = self.events.write().await;
        for event in events {
            guard.insert(event.id.clone(), event.clone());
        }
        Ok(())
    }

    async fn scan_ids(&self) -> Result<Vec<String>, RecorderError> {
        Ok(self.events.read().await.keys().cloned().collect())
    }

    async fn delete_events(&self, ids: &[String]) -> Result<(), RecorderError> {
        let mut guard = self.events.write().await;
        for id in ids {
            guard.remove(id);
        }
        Ok(())
    }

    async fn get_event(&self, id: &str) -> Result<Option<SeismicEvent>, RecorderError> {
        Ok(self.events.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventAttributes;

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let store = MemoryEventStore::new();
        let event = SeismicEvent::from_attributes(EventAttributes::default());
        let id = event.id.clone();

        store.put_events(&[event.clone()]).await.unwrap();
        assert_eq!(store.get_event(&id).await.unwrap(), Some(event));
        assert_eq!(store.scan_ids().await.unwrap(), vec![id.clone()]);

        store.delete_events(&[id.clone()]).await.unwrap();
        assert_eq!(store.get_event(&id).await.unwrap(), None);
        assert!(store.scan_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clones_share_contents() {
        let store = MemoryEventStore::new();
        let other = store.clone();

        store
            .seed(vec![SeismicEvent::from_attributes(
                EventAttributes::default(),
            )])
            .await;

        assert_eq!(other.snapshot().await.len(), 1);
    }
}
