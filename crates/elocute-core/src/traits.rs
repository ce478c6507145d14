//! Collaborator trait definitions.
//!
//! G2P conversion and phonetic distance are synchronous and called from
//! the pure scoring components. Speech recognition and progress storage
//! are async and only reached from the session engine. Implementations
//! live in the `elocute-providers` and `elocute-store` crates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DistanceError, PhoneticConversionError, RecognitionError, StoreError};
use crate::model::{AwardedBadge, ProgressKey, ProgressRecord};

// ---------------------------------------------------------------------------
// Phonetics
// ---------------------------------------------------------------------------

/// Grapheme-to-phoneme conversion.
pub trait G2p: Send + Sync {
    /// Human-readable converter name.
    fn name(&self) -> &str;

    /// Convert a normalized word into a sequence of phoneme symbols.
    fn to_phonemes(&self, word: &str, locale: &str) -> Result<Vec<String>, PhoneticConversionError>;
}

/// Distance between two phoneme symbols; larger means less similar.
pub trait PhoneticDistance: Send + Sync {
    fn distance(&self, a: &str, b: &str) -> Result<f64, DistanceError>;
}

// ---------------------------------------------------------------------------
// Speech recognition
// ---------------------------------------------------------------------------

/// Recorded audio handed to a recognizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInput {
    /// Encoded audio bytes (e.g. WAV).
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub mime_type: String,
    /// Locale hint, e.g. "en-US".
    pub locale: String,
}

/// Speech-to-text backend.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Human-readable recognizer name.
    fn name(&self) -> &str;

    /// Transcribe audio. `Err(RecognitionError::NoSpeech)` when nothing was heard.
    async fn transcribe(&self, audio: &AudioInput) -> Result<String, RecognitionError>;
}

// ---------------------------------------------------------------------------
// Progress store
// ---------------------------------------------------------------------------

/// Persistence for progress records and awarded badges.
///
/// `save_progress` is a compare-and-swap: the record's `version` must equal
/// the stored version (0 when absent), and the stored copy gets
/// `version + 1`. Each session id may be applied once per store.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn load_progress(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>, StoreError>;

    /// Store `record` if nobody changed it since it was loaded.
    ///
    /// Fails with `StoreError::Conflict` on a version mismatch and with
    /// `StoreError::AlreadyApplied` if `session_id` was stored before.
    async fn save_progress(
        &self,
        record: &ProgressRecord,
        session_id: uuid::Uuid,
    ) -> Result<ProgressRecord, StoreError>;

    /// All records of one user, across levels.
    async fn list_progress(&self, user: &str) -> Result<Vec<ProgressRecord>, StoreError>;

    async fn awarded_badges(&self, user: &str) -> Result<Vec<AwardedBadge>, StoreError>;

    /// Record an award. Returns `false` if the user already had the badge.
    async fn record_award(&self, award: &AwardedBadge) -> Result<bool, StoreError>;
}
