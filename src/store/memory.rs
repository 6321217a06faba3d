// src/store/memory.rs
use super::{RecordStore, StoreError};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

/// In-process record store keyed by `(entity, id)`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<(String, String), Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(entity: &str, id: &str) -> (String, String) {
        (entity.to_string(), id.to_string())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, entity: &str) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == entity)
            .map(|entry| entry.key().1.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn read(&self, entity: &str, id: &str) -> Result<Value, StoreError> {
        self.records
            .get(&Self::key(entity, id))
            .map(|record| record.value().clone())
            .ok_or_else(|| StoreError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            })
    }

    async fn update(&self, entity: &str, id: &str, record: &Value) -> Result<(), StoreError> {
        match self.records.get_mut(&Self::key(entity, id)) {
            Some(mut existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn create(&self, entity: &str, id: &str, record: &Value) -> Result<(), StoreError> {
        match self.records.entry(Self::key(entity, id)) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists {
                entity: entity.to_string(),
                id: id.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn delete(&self, entity: &str, id: &str) -> Result<(), StoreError> {
        self.records
            .remove(&Self::key(entity, id))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_entities_are_separate() {
        let store = MemoryStore::new();
        store.create("checks", "a", &json!(1)).await.unwrap();
        store.create("users", "a", &json!(2)).await.unwrap();

        assert_eq!(store.list("checks").await.unwrap(), vec!["a"]);
        assert_eq!(store.read("users", "a").await.unwrap(), json!(2));
        assert!(store.update("checks", "b", &json!(3)).await.is_err());
    }
}
