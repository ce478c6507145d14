//! Error types for the scoring engine and its collaborators.
//!
//! Only [`EvaluationError`] ever reaches the caller of an evaluation. The
//! collaborator errors are absorbed by the scoring ladder or the session
//! engine and surface as degraded results and log lines.

use thiserror::Error;
use uuid::Uuid;

/// Fatal evaluation failures.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The reference text is empty or blank.
    #[error("reference text is required")]
    EmptyReference,

    /// Every stage of a custom scoring ladder failed.
    #[error("all scoring stages failed: {0}")]
    LadderExhausted(String),
}

/// Errors from the grapheme-to-phoneme collaborator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PhoneticConversionError {
    /// The converter is not usable at all; the whole phoneme stage fails.
    #[error("phoneme converter unavailable: {0}")]
    Unavailable(String),

    /// A single word could not be converted.
    #[error("cannot transcribe '{word}' to phonemes")]
    Untranscribable { word: String },
}

impl PhoneticConversionError {
    /// Returns `true` if this error should fail the whole stage rather than one word.
    pub fn is_fatal_for_stage(&self) -> bool {
        matches!(self, PhoneticConversionError::Unavailable(_))
    }
}

/// Errors from the phonetic distance collaborator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DistanceError {
    /// The segment is not part of the feature inventory.
    #[error("unknown phonetic segment '{0}'")]
    UnknownSegment(String),
}

/// Errors while aligning the spoken stream against the reference.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AlignmentError {
    /// No spoken words were recovered to align against.
    #[error("no spoken words to align")]
    NoSpokenWords,

    /// The phonetic distance collaborator failed.
    #[error(transparent)]
    Distance(#[from] DistanceError),
}

/// Recoverable failure of one stage of the scoring ladder.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScoringError {
    #[error(transparent)]
    PhoneticConversion(#[from] PhoneticConversionError),

    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    /// The stage is switched off by configuration.
    #[error("stage '{0}' is disabled")]
    Disabled(&'static str),
}

/// Errors from the speech recognition collaborator.
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// The recognizer could not be reached or returned an error.
    #[error("recognizer unavailable: {0}")]
    Unavailable(String),

    /// Authentication with the recognizer failed.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The request timed out.
    #[error("recognition timed out after {0}s")]
    Timeout(u64),

    /// The audio contained no recognizable speech.
    #[error("no speech detected")]
    NoSpeech,
}

impl RecognitionError {
    /// Returns `true` if retrying the same audio cannot help.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            RecognitionError::AuthenticationFailed(_) | RecognitionError::NoSpeech
        )
    }
}

/// Errors from the progress store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record changed since it was read.
    #[error("progress for {user}/{level} changed concurrently (expected version {expected}, found {found})")]
    Conflict {
        user: String,
        level: String,
        expected: u64,
        found: u64,
    },

    /// The session was already folded into the record.
    #[error("session {0} was already applied")]
    AlreadyApplied(Uuid),

    /// The backing storage failed.
    #[error("store I/O error: {0}")]
    Io(String),

    /// The backing storage holds unreadable data.
    #[error("store data is corrupt: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Returns `true` if the read-modify-write cycle should be retried.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}
