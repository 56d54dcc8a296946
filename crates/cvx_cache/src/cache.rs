//! Flat-file store for agent output, keyed by [`cache_key`](crate::cache_key).

use crate::KEY_LEN;
use cvx_error::{CvxResult, StorageError, StorageErrorKind};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, instrument};

/// Cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = ".cvx/cache/agent";

/// An arbitrary JSON object produced by the agent.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The two documents a tailoring agent returns.
///
/// Stored on disk as `{"cv": {...}, "letter": {...}}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Getters)]
pub struct AgentOutput {
    #[serde(default)]
    cv: JsonObject,
    #[serde(default)]
    letter: JsonObject,
}

impl AgentOutput {
    /// Pair a CV and a letter.
    pub fn new(cv: JsonObject, letter: JsonObject) -> Self {
        Self { cv, letter }
    }

    /// Split into `(cv, letter)`.
    pub fn into_parts(self) -> (JsonObject, JsonObject) {
        (self.cv, self.letter)
    }
}

#[derive(Serialize)]
struct AgentOutputRef<'a> {
    cv: &'a JsonObject,
    letter: &'a JsonObject,
}

/// Agent output cache rooted at one directory.
///
/// Entries are never evicted. A refreshed build overwrites its key in place.
/// Concurrent writers to the same key are last-writer-wins; each write is
/// atomic, so readers see either the old or the new entry.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct AgentCache {
    dir: PathBuf,
}

impl AgentCache {
    /// Cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache rooted at `.cvx/cache/agent` under the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be determined.
    pub fn in_current_dir() -> CvxResult<Self> {
        let cwd = std::env::current_dir().map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidPath(format!(
                "cannot resolve working directory: {}",
                e
            )))
        })?;
        Ok(Self::new(cwd.join(DEFAULT_CACHE_DIR)))
    }

    /// Cache rooted at `dir` resolved against the current working directory.
    ///
    /// Absolute paths are used unchanged.
    pub fn relative_to_current_dir(dir: impl AsRef<Path>) -> CvxResult<Self> {
        let dir = dir.as_ref();
        if dir.is_absolute() {
            return Ok(Self::new(dir));
        }
        let cwd = std::env::current_dir().map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidPath(format!(
                "cannot resolve working directory: {}",
                e
            )))
        })?;
        Ok(Self::new(cwd.join(dir)))
    }

    /// File holding the entry for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn validate_key(key: &str) -> CvxResult<()> {
        let well_formed = key.len() == KEY_LEN
            && key
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(StorageError::new(StorageErrorKind::InvalidPath(format!(
                "not a cache key: {:?}",
                key
            )))
            .into());
        }
        Ok(())
    }

    /// True if an entry is stored for `key`.
    #[instrument(skip(self))]
    pub async fn exists(&self, key: &str) -> bool {
        if Self::validate_key(key).is_err() {
            return false;
        }
        tokio::fs::try_exists(self.path_for(key))
            .await
            .unwrap_or(false)
    }

    /// Load the entry for `key`.
    ///
    /// # Errors
    ///
    /// `StorageErrorKind::NotFound` when there is no entry (an ordinary miss),
    /// `StorageErrorKind::Corrupt` when the file does not decode, and
    /// `StorageErrorKind::FileRead` for other I/O failures.
    #[instrument(skip(self))]
    pub async fn read(&self, key: &str) -> CvxResult<AgentOutput> {
        Self::validate_key(key)?;
        let path = self.path_for(key);

        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(key.to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        let output: AgentOutput = serde_json::from_slice(&data).map_err(|e| {
            StorageError::new(StorageErrorKind::Corrupt(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;

        debug!(path = %path.display(), size = data.len(), "Cache hit");
        Ok(output)
    }

    /// Store `cv` and `letter` under `key`, replacing any existing entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written. Other entries are never touched.
    #[instrument(skip(self, cv, letter))]
    pub async fn write(&self, key: &str, cv: &JsonObject, letter: &JsonObject) -> CvxResult<()> {
        Self::validate_key(key)?;
        let path = self.path_for(key);

        let data = serde_json::to_vec_pretty(&AgentOutputRef { cv, letter }).map_err(|e| {
            StorageError::new(StorageErrorKind::Serialize(e.to_string()))
        })?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                self.dir.display(),
                e
            )))
        })?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.dir.join(format!(
            "{}.{}.{}.tmp",
            key,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = Self::replace_with(&temp_path, &path, &data).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        info!(path = %path.display(), size = data.len(), "Wrote agent output to cache");
        Ok(())
    }

    /// Write `data` to `temp_path`, then rename it over `path`.
    ///
    /// The caller removes `temp_path` when this fails at either step.
    async fn replace_with(temp_path: &Path, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        tokio::fs::write(temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(temp_path, path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })
    }
}

/// [`AgentCache::exists`] against the current working directory.
pub async fn exists(key: &str) -> bool {
    match AgentCache::in_current_dir() {
        Ok(cache) => cache.exists(key).await,
        Err(_) => false,
    }
}

/// [`AgentCache::read`] against the current working directory.
pub async fn read(key: &str) -> CvxResult<AgentOutput> {
    AgentCache::in_current_dir()?.read(key).await
}

/// [`AgentCache::write`] against the current working directory.
pub async fn write(key: &str, cv: &JsonObject, letter: &JsonObject) -> CvxResult<()> {
    AgentCache::in_current_dir()?.write(key, cv, letter).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_is_key_dot_json() {
        let cache = AgentCache::new("/tmp/project/.cvx/cache/agent");
        let key = "a".repeat(KEY_LEN);
        assert_eq!(
            cache.path_for(&key),
            PathBuf::from(format!("/tmp/project/.cvx/cache/agent/{}.json", key))
        );
    }

    #[test]
    fn test_keys_must_be_lowercase_hex() {
        assert!(AgentCache::validate_key(&"0".repeat(KEY_LEN)).is_ok());
        assert!(AgentCache::validate_key(&"A".repeat(KEY_LEN)).is_err());
        assert!(AgentCache::validate_key("abc").is_err());
        assert!(AgentCache::validate_key(&format!("../{}", "0".repeat(KEY_LEN - 3))).is_err());
    }

    #[test]
    fn test_relative_dir_is_resolved_against_cwd() {
        let cache = AgentCache::relative_to_current_dir(DEFAULT_CACHE_DIR).unwrap();
        assert!(cache.dir().is_absolute());
        assert!(cache.dir().ends_with(DEFAULT_CACHE_DIR));
    }
}
