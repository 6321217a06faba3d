// src/logs/files.rs
use super::LogError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dashmap::DashMap;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::BTreeSet;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OwnedMutexGuard};

const ACTIVE_EXT: &str = ".log";
const PENDING_EXT: &str = ".log.rotating";
const ARCHIVE_EXT: &str = ".gz.b64";

/// The directory holding every check's active log and its archives.
///
/// - `<id>.log`: active, append-only, one JSON line per probe
/// - `<id>.log.rotating`: detached by a rotation that has not archived it yet
/// - `<id>-<marker>.gz.b64`: gzip + base64 archive of a former active log
///
/// Clones share one lock per log id. Appends hold it for the whole write, and
/// rotation holds it while it detaches the active log, so no writer can still
/// have a detached log open.
#[derive(Debug, Clone)]
pub struct LogFiles {
    dir: PathBuf,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl LogFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Exclusive access to one log's active file.
    pub(crate) async fn lock(&self, log_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(log_id.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    pub fn active_path(&self, log_id: &str) -> Result<PathBuf, LogError> {
        check_id(log_id)?;
        Ok(self.dir.join(format!("{}{}", log_id, ACTIVE_EXT)))
    }

    pub fn pending_path(&self, log_id: &str) -> Result<PathBuf, LogError> {
        check_id(log_id)?;
        Ok(self.dir.join(format!("{}{}", log_id, PENDING_EXT)))
    }

    fn archive_path(&self, archive_id: &str) -> Result<PathBuf, LogError> {
        check_id(archive_id)?;
        Ok(self.dir.join(format!("{}{}", archive_id, ARCHIVE_EXT)))
    }

    /// Append one line to the active log, creating it if needed.
    pub async fn append(&self, log_id: &str, line: &str) -> Result<(), LogError> {
        let path = self.active_path(log_id)?;
        fs::create_dir_all(&self.dir).await?;

        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');

        let _held = self.lock(log_id).await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(record.as_bytes()).await?;
        file.sync_data().await?;
        Ok(())
    }

    /// Ids of logs with content that may need rotating. With
    /// `include_archives`, archive ids (`<id>-<marker>`) are listed too.
    pub async fn list(&self, include_archives: bool) -> Result<Vec<String>, LogError> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = BTreeSet::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };

            if let Some(id) = name
                .strip_suffix(ACTIVE_EXT)
                .or_else(|| name.strip_suffix(PENDING_EXT))
            {
                ids.insert(id.to_string());
            } else if include_archives {
                if let Some(id) = name.strip_suffix(ARCHIVE_EXT) {
                    ids.insert(id.to_string());
                }
            }
        }

        Ok(ids.into_iter().collect())
    }

    pub async fn read_active(&self, log_id: &str) -> Result<String, LogError> {
        let path = self.active_path(log_id)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Compress `source` into a new archive for `log_id` and return the
    /// archive id. The archive is synced before this returns.
    pub(crate) async fn compress(&self, log_id: &str, source: &Path) -> Result<String, LogError> {
        let raw = fs::read(source).await?;
        let encoded = tokio::task::spawn_blocking(move || -> Result<String, LogError> {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&raw)?;
            Ok(STANDARD.encode(encoder.finish()?))
        })
        .await??;

        let mut marker = chrono::Utc::now().timestamp_millis();
        loop {
            let archive_id = format!("{}-{}", log_id, marker);
            let path = self.archive_path(&archive_id)?;

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    file.write_all(encoded.as_bytes()).await?;
                    file.sync_all().await?;
                    return Ok(archive_id);
                }
                // Two rotations of the same log within a millisecond.
                Err(e) if e.kind() == ErrorKind::AlreadyExists => marker += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// The original text of an archive.
    pub async fn decompress(&self, archive_id: &str) -> Result<String, LogError> {
        let encoded = fs::read_to_string(self.archive_path(archive_id)?).await?;
        tokio::task::spawn_blocking(move || -> Result<String, LogError> {
            let compressed = STANDARD.decode(encoded.trim())?;
            let mut text = String::new();
            GzDecoder::new(compressed.as_slice()).read_to_string(&mut text)?;
            Ok(text)
        })
        .await?
    }
}

/// Recover the check id an archive belongs to.
pub fn archive_check_id(archive_id: &str) -> Option<&str> {
    let archive_id = archive_id.strip_suffix(ARCHIVE_EXT).unwrap_or(archive_id);
    archive_id
        .rsplit_once('-')
        .map(|(id, _)| id)
        .filter(|id| !id.is_empty())
}

fn check_id(id: &str) -> Result<(), LogError> {
    if id.is_empty() || id.contains(&['/', '\\'][..]) || id == "." || id == ".." {
        return Err(LogError::InvalidId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let files = LogFiles::new(dir.path().join("logs"));

        files.append("abc", "first").await.unwrap();
        files.append("abc", "second").await.unwrap();

        assert_eq!(files.read_active("abc").await.unwrap(), "first\nsecond\n");
        assert_eq!(files.list(false).await.unwrap(), vec!["abc"]);
    }

    #[tokio::test]
    async fn test_compress_then_decompress() {
        let dir = tempfile::tempdir().unwrap();
        let files = LogFiles::new(dir.path());
        files.append("abc", "{\"n\":1}").await.unwrap();

        let source = files.active_path("abc").unwrap();
        let archive = files.compress("abc", &source).await.unwrap();

        assert_eq!(archive_check_id(&archive), Some("abc"));
        assert_eq!(files.decompress(&archive).await.unwrap(), "{\"n\":1}\n");
        assert_eq!(files.list(true).await.unwrap(), vec!["abc".to_string(), archive]);
    }

    #[tokio::test]
    async fn test_compress_never_overwrites_archive() {
        let dir = tempfile::tempdir().unwrap();
        let files = LogFiles::new(dir.path());
        files.append("abc", "x").await.unwrap();
        let source = files.active_path("abc").unwrap();

        let first = files.compress("abc", &source).await.unwrap();
        let second = files.compress("abc", &source).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_missing_dir_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let files = LogFiles::new(dir.path().join("absent"));
        assert!(files.list(true).await.unwrap().is_empty());
    }

    #[test]
    fn test_archive_check_id() {
        assert_eq!(archive_check_id("abcdefghij0123456789-1700000000000"), Some("abcdefghij0123456789"));
        assert_eq!(archive_check_id("abc-17.gz.b64"), Some("abc"));
        assert_eq!(archive_check_id("nomarker"), None);
    }
}
