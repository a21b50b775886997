//! JSON persistence gateway over a key-value store

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use super::{KeyValueStore, PersistenceGateway, StorageError};
use crate::state::{HistoryEntry, Timer};

pub const TIMERS_KEY: &str = "timers";
pub const HISTORY_KEY: &str = "history";

/// Stores timers and history as two independently keyed JSON arrays
#[derive(Debug)]
pub struct JsonGateway<K> {
    kv: K,
}

impl<K: KeyValueStore> JsonGateway<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    async fn load_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.kv.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read persisted {}, starting empty: {}", key, e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!("Persisted {} is malformed, starting empty: {}", key, e);
                Vec::new()
            }
        }
    }

    async fn save_list<T: Serialize + Sync>(&self, key: &str, items: &[T]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(items)?;
        self.kv.set(key, raw).await
    }
}

#[async_trait]
impl<K: KeyValueStore> PersistenceGateway for JsonGateway<K> {
    async fn load_timers(&self) -> Vec<Timer> {
        self.load_list(TIMERS_KEY).await
    }

    async fn save_timers(&self, timers: &[Timer]) -> Result<(), StorageError> {
        self.save_list(TIMERS_KEY, timers).await
    }

    async fn load_history(&self) -> Vec<HistoryEntry> {
        self.load_list(HISTORY_KEY).await
    }

    async fn save_history(&self, history: &[HistoryEntry]) -> Result<(), StorageError> {
        self.save_list(HISTORY_KEY, history).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{state::TimerStatus, storage::MemoryKeyValueStore};

    #[tokio::test]
    async fn timers_round_trip_in_order() {
        let gateway = JsonGateway::new(MemoryKeyValueStore::new());
        let mut running = Timer::new("Laundry", "Home", 3600, true);
        running.start();
        running.remaining = 1200;
        let timers = vec![running, Timer::new("Stretch", "Health", 300, false)];

        gateway.save_timers(&timers).await.unwrap();
        assert_eq!(gateway.load_timers().await, timers);
    }

    #[tokio::test]
    async fn history_round_trip() {
        let gateway = JsonGateway::new(MemoryKeyValueStore::new());
        let timer = Timer::new("Laundry", "Home", 3600, true);
        let history = vec![HistoryEntry::completed(&timer, Utc::now())];

        gateway.save_history(&history).await.unwrap();
        assert_eq!(gateway.load_history().await, history);
    }

    #[tokio::test]
    async fn empty_storage_loads_empty() {
        let gateway = JsonGateway::new(MemoryKeyValueStore::new());
        assert!(gateway.load_timers().await.is_empty());
        assert!(gateway.load_history().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_storage_loads_empty() {
        let gateway = JsonGateway::new(MemoryKeyValueStore::with_entry(TIMERS_KEY, "{not json"));
        assert!(gateway.load_timers().await.is_empty());

        let wrong_shape = JsonGateway::new(MemoryKeyValueStore::with_entry(HISTORY_KEY, r#"{"name":"x"}"#));
        assert!(wrong_shape.load_history().await.is_empty());
    }

    #[tokio::test]
    async fn reads_documents_written_by_hand() {
        let raw = r#"[{"id":"a1","name":"Bread","category":"Kitchen","duration":40,"remaining":0,"status":"Completed","halfwayAlert":false}]"#;
        let gateway = JsonGateway::new(MemoryKeyValueStore::with_entry(TIMERS_KEY, raw));
        let timers = gateway.load_timers().await;
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].id, "a1");
        assert_eq!(timers[0].status, TimerStatus::Completed);
    }
}
