// src/store/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found: {entity}/{id}")]
    NotFound { entity: String, id: String },

    #[error("record already exists: {entity}/{id}")]
    AlreadyExists { entity: String, id: String },

    #[error("invalid record key: {0}")]
    InvalidKey(String),

    #[error("record store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to (de)serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
}
