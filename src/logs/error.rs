// src/logs/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("invalid log id: {0}")]
    InvalidId(String),

    #[error("log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize log entry: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("archive is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("compression task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
