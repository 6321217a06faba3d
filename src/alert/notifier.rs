// src/alert/notifier.rs
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("invalid phone number: {0:?}")]
    InvalidPhone(String),

    #[error("message must be 1 to 1600 characters, got {0}")]
    InvalidMessage(usize),

    #[error("provider rejected the message with status {0}")]
    Rejected(u16),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Sends a text message to a phone number.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError>;
}

/// Writes alerts to the process log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError> {
        info!(%phone, %message, "alert (no SMS provider configured)");
        Ok(())
    }
}
