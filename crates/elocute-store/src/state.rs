//! Store contents shared by the memory and file stores.
//!
//! Replay protection remembers only the most recent
//! [`APPLIED_SESSION_LIMIT`] session ids, oldest evicted first, so the
//! state (and the JSON file that holds it) stays bounded. A session
//! replayed after that many newer ones is counted again.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use elocute_core::error::StoreError;
use elocute_core::model::{AwardedBadge, ProgressKey, ProgressRecord};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    #[serde(default)]
    pub progress: Vec<ProgressRecord>,
    #[serde(default)]
    pub awards: Vec<AwardedBadge>,
    /// Sessions already folded into some record, oldest first.
    #[serde(default)]
    pub applied_sessions: VecDeque<Uuid>,
}

/// How many applied session ids are remembered for replay protection.
pub(crate) const APPLIED_SESSION_LIMIT: usize = 4096;

impl StoreState {
    fn position(&self, key: &ProgressKey) -> Option<usize> {
        self.progress
            .iter()
            .position(|r| r.user == key.user && r.level == key.level)
    }

    pub fn load(&self, key: &ProgressKey) -> Option<ProgressRecord> {
        self.position(key).map(|i| self.progress[i].clone())
    }

    pub fn save(&mut self, record: &ProgressRecord, session_id: Uuid) -> Result<ProgressRecord, StoreError> {
        if self.applied_sessions.contains(&session_id) {
            return Err(StoreError::AlreadyApplied(session_id));
        }

        let key = record.key();
        let slot = self.position(&key);
        let found = slot.map(|i| self.progress[i].version).unwrap_or(0);
        if record.version != found {
            return Err(StoreError::Conflict {
                user: key.user,
                level: key.level,
                expected: record.version,
                found,
            });
        }

        let stored = ProgressRecord {
            version: found + 1,
            ..record.clone()
        };
        match slot {
            Some(i) => self.progress[i] = stored.clone(),
            None => self.progress.push(stored.clone()),
        }
        if self.applied_sessions.len() >= APPLIED_SESSION_LIMIT {
            self.applied_sessions.pop_front();
        }
        self.applied_sessions.push_back(session_id);
        Ok(stored)
    }

    /// Records of `user`, ordered by level id.
    pub fn list(&self, user: &str) -> Vec<ProgressRecord> {
        let mut records: Vec<ProgressRecord> =
            self.progress.iter().filter(|r| r.user == user).cloned().collect();
        records.sort_by(|a, b| a.level.cmp(&b.level));
        records
    }

    pub fn awards(&self, user: &str) -> Vec<AwardedBadge> {
        self.awards.iter().filter(|a| a.user == user).cloned().collect()
    }

    pub fn record_award(&mut self, award: &AwardedBadge) -> bool {
        if self
            .awards
            .iter()
            .any(|a| a.user == award.user && a.badge_id == award.badge_id)
        {
            return false;
        }
        self.awards.push(award.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn key() -> ProgressKey {
        ProgressKey::new("ana", "beginner")
    }

    fn with_readings(record: ProgressRecord, readings: u32) -> ProgressRecord {
        ProgressRecord {
            readings_completed: readings,
            ..record
        }
    }

    #[test]
    fn first_save_expects_version_zero() {
        let mut state = StoreState::default();
        let saved = state
            .save(&with_readings(ProgressRecord::empty(&key()), 1), Uuid::new_v4())
            .unwrap();
        assert_eq!(saved.version, 1);
        assert_eq!(state.load(&key()), Some(saved));
    }

    #[test]
    fn stale_version_conflicts() {
        let mut state = StoreState::default();
        let first = state
            .save(&with_readings(ProgressRecord::empty(&key()), 1), Uuid::new_v4())
            .unwrap();

        let stale = with_readings(ProgressRecord::empty(&key()), 1);
        let err = state.save(&stale, Uuid::new_v4()).unwrap_err();
        assert!(err.is_conflict());

        let second = state.save(&with_readings(first, 2), Uuid::new_v4()).unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(second.readings_completed, 2);
    }

    #[test]
    fn session_is_applied_once() {
        let mut state = StoreState::default();
        let session = Uuid::new_v4();
        let saved = state
            .save(&with_readings(ProgressRecord::empty(&key()), 1), session)
            .unwrap();

        let err = state.save(&with_readings(saved, 2), session).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyApplied(id) if id == session));
        assert_eq!(state.load(&key()).unwrap().readings_completed, 1);
    }

    #[test]
    fn applied_history_is_bounded() {
        let mut state = StoreState::default();
        let first = Uuid::new_v4();
        let mut record = state
            .save(&with_readings(ProgressRecord::empty(&key()), 1), first)
            .unwrap();
        for _ in 0..APPLIED_SESSION_LIMIT {
            record = state.save(&record, Uuid::new_v4()).unwrap();
        }
        assert_eq!(state.applied_sessions.len(), APPLIED_SESSION_LIMIT);
        assert!(!state.applied_sessions.contains(&first));

        let newest = *state.applied_sessions.back().unwrap();
        let err = state.save(&record, newest).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyApplied(id) if id == newest));
    }

    #[test]
    fn awards_are_unique_per_user() {
        let mut state = StoreState::default();
        let award = |user: &str| AwardedBadge {
            user: user.into(),
            badge_id: "first".into(),
            badge_name: "First".into(),
            date_earned: Utc::now(),
        };
        assert!(state.record_award(&award("ana")));
        assert!(!state.record_award(&award("ana")));
        assert!(state.record_award(&award("ben")));
        assert_eq!(state.awards("ana").len(), 1);
    }

    #[test]
    fn list_is_per_user_and_sorted() {
        let mut state = StoreState::default();
        for level in ["intermediate", "beginner"] {
            let record = ProgressRecord::empty(&ProgressKey::new("ana", level));
            state.save(&record, Uuid::new_v4()).unwrap();
        }
        state
            .save(&ProgressRecord::empty(&ProgressKey::new("ben", "beginner")), Uuid::new_v4())
            .unwrap();

        let levels: Vec<String> = state.list("ana").into_iter().map(|r| r.level).collect();
        assert_eq!(levels, vec!["beginner", "intermediate"]);
    }
}
