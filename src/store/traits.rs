// src/store/traits.rs
use super::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// Durable keyed storage for records, addressed by entity type and id.
///
/// The monitor only needs `list`, `read` and `update`; `create` and `delete`
/// belong to whatever owns record lifecycle.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self, entity: &str) -> Result<Vec<String>, StoreError>;

    async fn read(&self, entity: &str, id: &str) -> Result<Value, StoreError>;

    /// Replace an existing record. Fails with `NotFound` if it does not exist.
    async fn update(&self, entity: &str, id: &str, record: &Value) -> Result<(), StoreError>;

    /// Insert a new record. Fails with `AlreadyExists` if it does.
    async fn create(&self, entity: &str, id: &str, record: &Value) -> Result<(), StoreError>;

    async fn delete(&self, entity: &str, id: &str) -> Result<(), StoreError>;
}
