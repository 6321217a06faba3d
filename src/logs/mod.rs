// src/logs/mod.rs
mod entry;
mod error;
mod files;
mod logger;
mod rotator;

pub use entry::LogEntry;
pub use error::LogError;
pub use files::{archive_check_id, LogFiles};
pub use logger::CheckLogger;
pub use rotator::{LogRotator, Rotation};
