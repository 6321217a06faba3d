// src/logs/logger.rs
use super::{LogEntry, LogError, LogFiles};
use tracing::debug;

/// Appends probe outcomes to the log named after each check's id.
#[derive(Debug, Clone)]
pub struct CheckLogger {
    files: LogFiles,
}

impl CheckLogger {
    pub fn new(files: LogFiles) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &LogFiles {
        &self.files
    }

    pub async fn log(&self, entry: &LogEntry) -> Result<(), LogError> {
        let line = serde_json::to_string(entry)?;
        self.files.append(entry.log_id(), &line).await?;
        debug!(check = %entry.log_id(), state = %entry.state, alert = entry.alert, "outcome logged");
        Ok(())
    }
}
