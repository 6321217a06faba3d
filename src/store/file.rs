// src/store/file.rs
use super::{RecordStore, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

const EXTENSION: &str = ".json";

/// One JSON document per record at `<base>/<entity>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn path_for(&self, entity: &str, id: &str) -> Result<PathBuf, StoreError> {
        check_key(entity)?;
        check_key(id)?;
        Ok(self.base_dir.join(entity).join(format!("{}{}", id, EXTENSION)))
    }
}

// Keys become path components; anything that could escape the entity dir is refused.
fn check_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.contains(&['/', '\\'][..]) || key == "." || key == ".." {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn not_found(entity: &str, id: &str) -> StoreError {
    StoreError::NotFound {
        entity: entity.to_string(),
        id: id.to_string(),
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn list(&self, entity: &str) -> Result<Vec<String>, StoreError> {
        check_key(entity)?;
        let mut dir = match fs::read_dir(self.base_dir.join(entity)).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut ids = Vec::new();

        while let Some(entry) = dir.next_entry().await? {
            if let Some(id) = entry.file_name().to_str().and_then(|n| n.strip_suffix(EXTENSION)) {
                ids.push(id.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }

    async fn read(&self, entity: &str, id: &str) -> Result<Value, StoreError> {
        let path = self.path_for(entity, id)?;
        let contents = match fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found(entity, id)),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&contents)?)
    }

    async fn update(&self, entity: &str, id: &str, record: &Value) -> Result<(), StoreError> {
        let path = self.path_for(entity, id)?;
        let body = serde_json::to_vec(record)?;

        match fs::metadata(&path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found(entity, id)),
            Err(e) => return Err(e.into()),
        }

        // Write aside and rename so a failed write never leaves a torn record.
        let staging = path.with_extension("json.tmp");
        let mut file = fs::File::create(&staging).await?;
        file.write_all(&body).await?;
        file.sync_all().await?;
        fs::rename(&staging, &path).await?;
        Ok(())
    }

    async fn create(&self, entity: &str, id: &str, record: &Value) -> Result<(), StoreError> {
        let path = self.path_for(entity, id)?;
        let body = serde_json::to_vec(record)?;
        fs::create_dir_all(self.base_dir.join(entity)).await?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists {
                    entity: entity.to_string(),
                    id: id.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&body).await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn delete(&self, entity: &str, id: &str) -> Result<(), StoreError> {
        let path = self.path_for(entity, id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(entity, id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_read_update_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.create("checks", "a", &json!({"n": 1})).await.unwrap();
        store.create("checks", "b", &json!({"n": 2})).await.unwrap();
        assert_eq!(store.read("checks", "a").await.unwrap(), json!({"n": 1}));

        store.update("checks", "a", &json!({"n": 10})).await.unwrap();
        assert_eq!(store.read("checks", "a").await.unwrap(), json!({"n": 10}));

        assert_eq!(store.list("checks").await.unwrap(), vec!["a", "b"]);

        store.delete("checks", "b").await.unwrap();
        assert_eq!(store.list("checks").await.unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_update_missing_record_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.create("checks", "a", &json!({})).await.unwrap();

        let err = store.update("checks", "zzz", &json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.create("checks", "a", &json!({})).await.unwrap();

        let err = store.create("checks", "a", &json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_list_of_unknown_entity_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.list("checks").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_path_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let err = store.read("checks", "../secret").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }
}
