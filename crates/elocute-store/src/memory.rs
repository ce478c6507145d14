//! In-process progress store.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use elocute_core::error::StoreError;
use elocute_core::model::{AwardedBadge, ProgressKey, ProgressRecord};
use elocute_core::traits::ProgressStore;

use crate::state::StoreState;

/// A store that lives as long as the process. Used for tests and for
/// one-shot CLI runs that do not persist progress.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every record of every user.
    pub fn all_progress(&self) -> Vec<ProgressRecord> {
        self.state().progress.clone()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn load_progress(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>, StoreError> {
        Ok(self.state().load(key))
    }

    async fn save_progress(
        &self,
        record: &ProgressRecord,
        session_id: Uuid,
    ) -> Result<ProgressRecord, StoreError> {
        self.state().save(record, session_id)
    }

    async fn list_progress(&self, user: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        Ok(self.state().list(user))
    }

    async fn awarded_badges(&self, user: &str) -> Result<Vec<AwardedBadge>, StoreError> {
        Ok(self.state().awards(user))
    }

    async fn record_award(&self, award: &AwardedBadge) -> Result<bool, StoreError> {
        Ok(self.state().record_award(award))
    }
}
