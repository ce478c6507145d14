//! Core data model types for elocute.
//!
//! Evaluation results are created per call and never persisted by the core.
//! Progress records and awarded badges are the only long-lived entities;
//! their storage is the job of a [`crate::traits::ProgressStore`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

/// One step of an edit-distance decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditOp {
    Equal,
    Replace,
    Delete,
    Insert,
}

impl fmt::Display for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditOp::Equal => write!(f, "equal"),
            EditOp::Replace => write!(f, "replace"),
            EditOp::Delete => write!(f, "delete"),
            EditOp::Insert => write!(f, "insert"),
        }
    }
}

/// How a reference word was found in the spoken stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Fuzzy,
    Missing,
}

/// The match of one reference word against the spoken words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordAlignment {
    pub reference_word: String,
    /// The spoken word chosen as counterpart, if any.
    pub matched_word: Option<String>,
    /// Similarity ratio in `[0, 1]`.
    pub similarity: f64,
    pub kind: MatchKind,
}

impl WordAlignment {
    /// Word-presence score: 100 for exact, `floor(ratio * 100)` for fuzzy, 0 when missing.
    pub fn score(&self) -> u32 {
        match self.kind {
            MatchKind::Exact => 100,
            MatchKind::Fuzzy => (self.similarity * 100.0).floor().clamp(0.0, 100.0) as u32,
            MatchKind::Missing => 0,
        }
    }
}

/// Score of one reference phoneme.
///
/// Only `Equal`, `Replace` and `Delete` ever appear here; inserted spoken
/// phonemes have no reference index and are listed in
/// [`PhonemeAnalysis::inserted`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhonemeAlignment {
    pub reference_index: usize,
    pub op: EditOp,
    /// Score in `[0, 100]`.
    pub score: f64,
    pub is_problem: bool,
}

/// Phoneme-level analysis of a single word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhonemeAnalysis {
    pub reference_phonemes: Vec<String>,
    pub spoken_phonemes: Vec<String>,
    /// One entry per reference phoneme, in reference order.
    #[serde(default)]
    pub alignments: Vec<PhonemeAlignment>,
    /// Reference indices scored below the problem threshold.
    #[serde(default)]
    pub problem_phonemes: Vec<usize>,
    /// Spoken indices that had no reference counterpart.
    #[serde(default)]
    pub inserted: Vec<usize>,
    /// Word score in `[0, 100]`.
    pub score: u32,
    /// `true` when the fixed fallback score was used instead of a computed one.
    #[serde(default)]
    pub degraded: bool,
}

// ---------------------------------------------------------------------------
// Pronunciation results
// ---------------------------------------------------------------------------

/// Which rung of the scoring ladder produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStage {
    NoSpeech,
    Phoneme,
    WordPresence,
    CharacterOverlap,
    Random,
}

impl fmt::Display for ScoringStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringStage::NoSpeech => write!(f, "no_speech"),
            ScoringStage::Phoneme => write!(f, "phoneme"),
            ScoringStage::WordPresence => write!(f, "word_presence"),
            ScoringStage::CharacterOverlap => write!(f, "character_overlap"),
            ScoringStage::Random => write!(f, "random"),
        }
    }
}

/// Score of one reference word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordScore {
    pub word: String,
    /// Score in `[0, 100]`.
    pub score: u32,
    /// The spoken word matched to this one, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heard: Option<String>,
    #[serde(default)]
    pub phonemes: Option<PhonemeAnalysis>,
}

/// Output of a pronunciation evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PronunciationResult {
    /// Rounded mean of [`Self::per_word_scores`], 75 when there are none.
    pub overall_score: u32,
    /// One entry per reference word, in reference order.
    pub word_scores: Vec<WordScore>,
    pub recognized_text: String,
    pub stage: ScoringStage,
}

impl PronunciationResult {
    /// Word → score view. Repeated words keep their last score.
    pub fn per_word_scores(&self) -> HashMap<String, u32> {
        self.word_scores
            .iter()
            .map(|w| (w.word.clone(), w.score))
            .collect()
    }

    /// Word → phoneme analysis view, for words that have one.
    pub fn phoneme_analysis_by_word(&self) -> HashMap<String, &PhonemeAnalysis> {
        self.word_scores
            .iter()
            .filter_map(|w| w.phonemes.as_ref().map(|p| (w.word.clone(), p)))
            .collect()
    }

    /// Words whose score in [`Self::per_word_scores`] is below `threshold`,
    /// in order of first appearance. A repeated word yields its last entry.
    pub fn mispronounced_words(&self, threshold: u32) -> Vec<&WordScore> {
        let last: HashMap<&str, &WordScore> =
            self.word_scores.iter().map(|w| (w.word.as_str(), w)).collect();
        let mut seen = std::collections::HashSet::new();
        self.word_scores
            .iter()
            .filter(|w| seen.insert(w.word.as_str()))
            .filter_map(|w| last.get(w.word.as_str()).copied())
            .filter(|w| w.score < threshold)
            .collect()
    }
}

/// Speaking rate and the fluency score derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluencyResult {
    /// Words per minute, `>= 0`.
    pub wpm: f64,
    /// Score in `[0, 100]`.
    pub fluency_score: f64,
}

impl FluencyResult {
    /// The fluency score rounded half away from zero.
    pub fn rounded_score(&self) -> u32 {
        self.fluency_score.round().clamp(0.0, 100.0) as u32
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Identity of a progress record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgressKey {
    pub user: String,
    pub level: String,
}

impl ProgressKey {
    pub fn new(user: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            level: level.into(),
        }
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user, self.level)
    }
}

/// Running statistics of one learner at one reading level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user: String,
    pub level: String,
    pub readings_completed: u32,
    pub total_words_read: u64,
    pub average_wpm: Option<f64>,
    pub average_accuracy: Option<f64>,
    /// Highest WPM of any folded session.
    #[serde(default)]
    pub best_wpm: Option<f64>,
    pub last_reading_date: Option<DateTime<Utc>>,
    /// Optimistic concurrency token, owned by the store.
    #[serde(default)]
    pub version: u64,
}

impl ProgressRecord {
    /// A record with zero readings for `key`.
    pub fn empty(key: &ProgressKey) -> Self {
        Self {
            user: key.user.clone(),
            level: key.level.clone(),
            readings_completed: 0,
            total_words_read: 0,
            average_wpm: None,
            average_accuracy: None,
            best_wpm: None,
            last_reading_date: None,
            version: 0,
        }
    }

    pub fn key(&self) -> ProgressKey {
        ProgressKey::new(self.user.clone(), self.level.clone())
    }
}

/// Facts about one reading session, folded into a [`ProgressRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFacts {
    pub session_id: uuid::Uuid,
    pub completed: bool,
    /// Words in the reading material.
    pub word_count: u64,
    pub wpm: f64,
    /// Pronunciation accuracy in `[0, 100]`.
    pub accuracy: f64,
    pub completed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Badges
// ---------------------------------------------------------------------------

/// What a badge measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    /// Total completed readings across all levels.
    ReadingsCompleted,
    /// Highest words-per-minute ever recorded.
    WpmAchieved,
    /// Total words read across all levels.
    WordsRead,
    /// Any requirement this version does not know; never earned.
    #[serde(other)]
    Unsupported,
}

impl fmt::Display for RequirementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementType::ReadingsCompleted => write!(f, "readings_completed"),
            RequirementType::WpmAchieved => write!(f, "wpm_achieved"),
            RequirementType::WordsRead => write!(f, "words_read"),
            RequirementType::Unsupported => write!(f, "unsupported"),
        }
    }
}

impl FromStr for RequirementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "readings_completed" | "readings" => Ok(RequirementType::ReadingsCompleted),
            "wpm_achieved" | "wpm" => Ok(RequirementType::WpmAchieved),
            "words_read" | "words" => Ok(RequirementType::WordsRead),
            other => Err(format!("unknown requirement type: {other}")),
        }
    }
}

/// A badge from the static catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub requirement_type: RequirementType,
    pub requirement_value: f64,
}

/// A badge earned by a learner. Never revoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardedBadge {
    pub user: String,
    pub badge_id: String,
    pub badge_name: String,
    pub date_earned: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A reading level, e.g. "Beginner".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingLevel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub grade_equivalent: String,
    #[serde(default)]
    pub description: String,
}

/// Kind of reading material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Fiction,
    NonFiction,
    Poetry,
    Technical,
    News,
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fiction" => Ok(Category::Fiction),
            "non_fiction" | "nonfiction" => Ok(Category::NonFiction),
            "poetry" => Ok(Category::Poetry),
            "technical" => Ok(Category::Technical),
            "news" => Ok(Category::News),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// A text a learner reads aloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingMaterial {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Id of the [`ReadingLevel`] this material belongs to.
    pub level: String,
    pub category: Category,
    #[serde(default)]
    pub author: String,
    pub word_count: u64,
    pub estimated_time_minutes: u32,
}

/// Levels, materials and badges loaded from one catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub levels: Vec<ReadingLevel>,
    #[serde(default)]
    pub materials: Vec<ReadingMaterial>,
    #[serde(default)]
    pub badges: Vec<Badge>,
}

impl Catalog {
    pub fn material(&self, id: &str) -> Option<&ReadingMaterial> {
        self.materials.iter().find(|m| m.id == id)
    }

    pub fn level(&self, id: &str) -> Option<&ReadingLevel> {
        self.levels.iter().find(|l| l.id == id)
    }

    /// Position of a level in catalog order; earlier levels are easier.
    pub fn level_rank(&self, id: &str) -> Option<usize> {
        self.levels.iter().position(|l| l.id == id)
    }
}
