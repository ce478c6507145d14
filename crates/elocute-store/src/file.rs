//! JSON-file progress store.
//!
//! The whole store is one JSON document. Every operation reads the file,
//! and every write replaces it atomically through a temporary file in the
//! same directory, so a crash never leaves a half-written store behind.
//! Operations within one process are serialized by an async mutex.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use elocute_core::error::StoreError;
use elocute_core::model::{AwardedBadge, ProgressKey, ProgressRecord};
use elocute_core::traits::ProgressStore;

use crate::state::StoreState;

/// Progress store persisted to a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store at `path`. The file is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_state(&self) -> Result<StoreState, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoreState::default()),
            Err(e) => return Err(StoreError::Io(format!("{}: {e}", self.path.display()))),
        };
        if content.trim().is_empty() {
            return Ok(StoreState::default());
        }
        serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    fn write_state(&self, state: &StoreState) -> Result<(), StoreError> {
        let io = |e: std::io::Error| StoreError::Io(format!("{}: {e}", self.path.display()));

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(io)?;

        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| StoreError::Corrupt(format!("failed to serialize store: {e}")))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io)?;
        tmp.write_all(&json).map_err(io)?;
        tmp.as_file().sync_all().map_err(io)?;
        tmp.persist(&self.path).map_err(|e| io(e.error))?;

        debug!(path = %self.path.display(), records = state.progress.len(), "store written");
        Ok(())
    }

    /// Every record of every user.
    pub async fn all_progress(&self) -> Result<Vec<ProgressRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_state()?.progress)
    }
}

#[async_trait]
impl ProgressStore for JsonFileStore {
    async fn load_progress(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_state()?.load(key))
    }

    async fn save_progress(
        &self,
        record: &ProgressRecord,
        session_id: Uuid,
    ) -> Result<ProgressRecord, StoreError> {
        let _guard = self.lock.lock().await;
        let mut state = self.read_state()?;
        let stored = state.save(record, session_id)?;
        self.write_state(&state)?;
        Ok(stored)
    }

    async fn list_progress(&self, user: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_state()?.list(user))
    }

    async fn awarded_badges(&self, user: &str) -> Result<Vec<AwardedBadge>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_state()?.awards(user))
    }

    async fn record_award(&self, award: &AwardedBadge) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut state = self.read_state()?;
        if !state.record_award(award) {
            return Ok(false);
        }
        self.write_state(&state)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("progress.json");
        let key = ProgressKey::new("ana", "beginner");

        {
            let store = JsonFileStore::open(&path);
            let record = ProgressRecord {
                readings_completed: 3,
                ..ProgressRecord::empty(&key)
            };
            store.save_progress(&record, Uuid::new_v4()).await.unwrap();
            let award = AwardedBadge {
                user: "ana".into(),
                badge_id: "first".into(),
                badge_name: "First".into(),
                date_earned: Utc::now(),
            };
            assert!(store.record_award(&award).await.unwrap());
        }

        let store = JsonFileStore::open(&path);
        let loaded = store.load_progress(&key).await.unwrap().unwrap();
        assert_eq!(loaded.readings_completed, 3);
        assert_eq!(loaded.version, 1);
        assert_eq!(store.awarded_badges("ana").await.unwrap().len(), 1);
        assert_eq!(store.all_progress().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn applied_sessions_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let key = ProgressKey::new("ana", "beginner");
        let session = Uuid::new_v4();

        let saved = JsonFileStore::open(&path)
            .save_progress(&ProgressRecord::empty(&key), session)
            .await
            .unwrap();

        let err = JsonFileStore::open(&path)
            .save_progress(&saved, session)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyApplied(_)));
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("absent.json"));
        assert!(store.list_progress("ana").await.unwrap().is_empty());
        assert!(!dir.path().join("absent.json").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::open(&path)
            .list_progress("ana")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
