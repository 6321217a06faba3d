// src/logs/rotator.rs
use super::{LogError, LogFiles};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs::{self, OpenOptions};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rotation {
    /// Nothing to archive.
    Empty,
    /// New archive ids, oldest content first.
    Archived(Vec<String>),
}

/// Moves a check's accumulated log into a compressed archive and leaves the
/// active log empty.
///
/// The active log is renamed aside under the log's append lock, so appends
/// racing the rotation land in a fresh active log. The detached copy is only removed
/// once its archive is on disk; one left behind by an interrupted run is
/// archived on the next rotation.
#[derive(Debug, Clone)]
pub struct LogRotator {
    files: LogFiles,
}

impl LogRotator {
    pub fn new(files: LogFiles) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &LogFiles {
        &self.files
    }

    pub async fn rotate(&self, log_id: &str) -> Result<Rotation, LogError> {
        let active = self.files.active_path(log_id)?;
        let pending = self.files.pending_path(log_id)?;
        let mut archived = Vec::new();

        if exists(&pending).await? {
            debug!(log = %log_id, "archiving log left by an earlier rotation");
            archived.push(self.archive(log_id, &pending).await?);
        }

        let detached = {
            let _held = self.files.lock(log_id).await;
            if non_empty(&active).await? {
                fs::rename(&active, &pending).await?;
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&active)
                    .await?;
                true
            } else {
                false
            }
        };
        if detached {
            archived.push(self.archive(log_id, &pending).await?);
        }

        if archived.is_empty() {
            return Ok(Rotation::Empty);
        }

        info!(log = %log_id, archives = ?archived, "log rotated");
        Ok(Rotation::Archived(archived))
    }

    async fn archive(&self, log_id: &str, pending: &Path) -> Result<String, LogError> {
        let archive_id = self.files.compress(log_id, pending).await?;
        fs::remove_file(pending).await?;
        Ok(archive_id)
    }
}

async fn exists(path: &Path) -> Result<bool, LogError> {
    match fs::metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn non_empty(path: &Path) -> Result<bool, LogError> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta.len() > 0),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn archived_text(files: &LogFiles, rotation: Rotation) -> String {
        let Rotation::Archived(ids) = rotation else {
            panic!("expected an archive");
        };
        let mut text = String::new();
        for id in ids {
            text.push_str(&files.decompress(&id).await.unwrap());
        }
        text
    }

    #[tokio::test]
    async fn test_rotation_moves_everything_and_empties_active() {
        let dir = tempfile::tempdir().unwrap();
        let files = LogFiles::new(dir.path());
        let rotator = LogRotator::new(files.clone());

        files.append("abc", "one").await.unwrap();
        files.append("abc", "two").await.unwrap();

        let rotation = rotator.rotate("abc").await.unwrap();
        assert_eq!(archived_text(&files, rotation).await, "one\ntwo\n");
        assert_eq!(files.read_active("abc").await.unwrap(), "");
        assert!(!exists(&files.pending_path("abc").unwrap()).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_log_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let files = LogFiles::new(dir.path());
        let rotator = LogRotator::new(files.clone());

        files.append("abc", "one").await.unwrap();
        rotator.rotate("abc").await.unwrap();

        assert_eq!(rotator.rotate("abc").await.unwrap(), Rotation::Empty);
        assert_eq!(rotator.rotate("never-written").await.unwrap(), Rotation::Empty);
    }

    #[tokio::test]
    async fn test_successive_rotations_neither_lose_nor_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let files = LogFiles::new(dir.path());
        let rotator = LogRotator::new(files.clone());

        files.append("abc", "a").await.unwrap();
        let first = rotator.rotate("abc").await.unwrap();
        files.append("abc", "b").await.unwrap();
        files.append("abc", "c").await.unwrap();
        let second = rotator.rotate("abc").await.unwrap();

        assert_eq!(archived_text(&files, first).await, "a\n");
        assert_eq!(archived_text(&files, second).await, "b\nc\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_appends_during_rotation_are_never_lost() {
        let dir = tempfile::tempdir().unwrap();
        let files = LogFiles::new(dir.path());
        let rotator = LogRotator::new(files.clone());
        let writers = 4;
        let lines_per_writer = 250;

        let appends: Vec<_> = (0..writers)
            .map(|w| {
                let files = files.clone();
                tokio::spawn(async move {
                    for n in 0..lines_per_writer {
                        files.append("abc", &format!("{}-{}", w, n)).await.unwrap();
                    }
                })
            })
            .collect();

        let rotations = tokio::spawn({
            let rotator = rotator.clone();
            async move {
                let mut archives = Vec::new();
                for _ in 0..100 {
                    if let Rotation::Archived(ids) = rotator.rotate("abc").await.unwrap() {
                        archives.extend(ids);
                    }
                    tokio::task::yield_now().await;
                }
                archives
            }
        });

        for append in appends {
            append.await.unwrap();
        }
        let mut archives = rotations.await.unwrap();
        if let Rotation::Archived(ids) = rotator.rotate("abc").await.unwrap() {
            archives.extend(ids);
        }

        let mut lines = Vec::new();
        for id in &archives {
            let text = files.decompress(id).await.unwrap();
            lines.extend(text.lines().map(str::to_string));
        }
        lines.extend(files.read_active("abc").await.unwrap().lines().map(str::to_string));

        let total = writers * lines_per_writer;
        assert_eq!(lines.len(), total);
        let distinct: std::collections::HashSet<_> = lines.iter().collect();
        assert_eq!(distinct.len(), total);
    }

    #[tokio::test]
    async fn test_leftover_pending_log_is_archived() {
        let dir = tempfile::tempdir().unwrap();
        let files = LogFiles::new(dir.path());
        let rotator = LogRotator::new(files.clone());

        fs::write(files.pending_path("abc").unwrap(), "stale\n").await.unwrap();
        files.append("abc", "fresh").await.unwrap();
        assert_eq!(files.list(false).await.unwrap(), vec!["abc"]);

        let rotation = rotator.rotate("abc").await.unwrap();
        assert_eq!(archived_text(&files, rotation).await, "stale\nfresh\n");
        assert_eq!(files.read_active("abc").await.unwrap(), "");
    }
}
