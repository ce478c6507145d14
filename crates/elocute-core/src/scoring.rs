//! Pronunciation scoring with an explicit fallback ladder.
//!
//! A [`PronunciationEvaluator`] runs its stages in order. A stage may
//! decline (`Ok(None)`), fail (`Err`, logged and skipped) or produce word
//! scores, which end the evaluation. The standard ladder is:
//!
//! 1. [`NoSpeechStage`]: nothing heard and no audio, every word 50.
//! 2. [`PhonemeStage`]: phoneme alignment of each word against its spoken counterpart.
//! 3. [`WordPresenceStage`]: exact or coarse fuzzy word matches.
//! 4. [`CharacterOverlapStage`]: shared characters with the best spoken word.
//! 5. [`RandomStage`]: seedable placeholder scores in 60..=100.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AlignmentError, EvaluationError, ScoringError};
use crate::model::{PhonemeAnalysis, PronunciationResult, ScoringStage, WordScore};
use crate::phonemes::{fallback_analysis, PhonemeAligner, DEFAULT_PROBLEM_THRESHOLD};
use crate::text;
use crate::traits::{G2p, PhoneticDistance};
use crate::words::{WordAligner, COARSE_FUZZY_THRESHOLD, DEFAULT_FUZZY_THRESHOLD};

/// Overall score reported when the reference has no scorable words.
pub const EMPTY_REFERENCE_SCORE: u32 = 75;

/// Score given to every word when nothing was heard.
pub const NO_SPEECH_WORD_SCORE: u32 = 50;

/// Words scoring below this are reported as mispronounced.
pub const DEFAULT_MISPRONOUNCED_BELOW: u32 = 70;

const RANDOM_SCORE_RANGE: std::ops::RangeInclusive<u32> = 60..=100;

/// Tunables of the scoring ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Similarity needed to accept a spoken counterpart in the phoneme stage.
    pub fuzzy_threshold: f64,
    /// Similarity needed for a fuzzy match in the word-presence stage.
    pub coarse_threshold: f64,
    /// Phonemes scoring below this are problems.
    pub problem_threshold: f64,
    /// Words scoring below this are mispronounced.
    pub mispronounced_below: u32,
    /// Keep the random placeholder as the last stage.
    pub random_fallback: bool,
    /// Seed for the random stage and the error simulator.
    pub random_seed: Option<u64>,
    /// Demo mode: score words against simulated mispronunciations of themselves.
    pub simulate_errors: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            coarse_threshold: COARSE_FUZZY_THRESHOLD,
            problem_threshold: DEFAULT_PROBLEM_THRESHOLD,
            mispronounced_below: DEFAULT_MISPRONOUNCED_BELOW,
            random_fallback: true,
            random_seed: None,
            simulate_errors: false,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (name, value) in [
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("coarse_threshold", self.coarse_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                problems.push(format!("{name} must be within [0, 1], got {value}"));
            }
        }
        if !(0.0..=100.0).contains(&self.problem_threshold) {
            problems.push(format!(
                "problem_threshold must be within [0, 100], got {}",
                self.problem_threshold
            ));
        }
        if self.mispronounced_below > 100 {
            problems.push(format!(
                "mispronounced_below must be at most 100, got {}",
                self.mispronounced_below
            ));
        }
        problems
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// ---------------------------------------------------------------------------
// Random sources
// ---------------------------------------------------------------------------

/// Placeholder scores for when nothing better is available.
pub struct RandomFallback {
    rng: Mutex<StdRng>,
}

impl RandomFallback {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: Mutex::new(seeded_rng(seed)),
        }
    }

    /// Uniform integer in 60..=100.
    pub fn next_score(&self) -> u32 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(RANDOM_SCORE_RANGE)
    }
}

/// Common learner substitutions, tried in order.
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("th", "t"),
    ("v", "f"),
    ("w", "v"),
    ("r", "l"),
    ("l", "r"),
    ("sh", "s"),
    ("ch", "sh"),
    ("j", "y"),
    ("z", "s"),
];

/// Produces plausible mispronunciations of a word for demos.
///
/// Half of the words and every word of two letters or fewer are returned
/// unchanged. Otherwise each applicable substitution fires with a 30%
/// chance and at most one is applied.
pub struct ErrorSimulator {
    rng: Mutex<StdRng>,
}

impl ErrorSimulator {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: Mutex::new(seeded_rng(seed)),
        }
    }

    pub fn simulate(&self, word: &str) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        if rng.gen_bool(0.5) || word.chars().count() <= 2 {
            return word.to_string();
        }
        for (pattern, replacement) in SUBSTITUTIONS {
            if word.contains(pattern) && rng.gen_bool(0.3) {
                return word.replacen(pattern, replacement, 1);
            }
        }
        word.to_string()
    }
}

// ---------------------------------------------------------------------------
// Context and stages
// ---------------------------------------------------------------------------

/// Shared resources for every evaluation. Build once, share by `Arc`.
pub struct ScoringContext {
    pub g2p: Arc<dyn G2p>,
    pub distance: Arc<dyn PhoneticDistance>,
    pub locale: String,
    pub config: ScoringConfig,
    simulator: Option<ErrorSimulator>,
    random: RandomFallback,
}

impl ScoringContext {
    pub fn new(
        g2p: Arc<dyn G2p>,
        distance: Arc<dyn PhoneticDistance>,
        locale: impl Into<String>,
        config: ScoringConfig,
    ) -> Self {
        // Different streams for the two consumers of a single seed.
        let simulator = config
            .simulate_errors
            .then(|| ErrorSimulator::new(config.random_seed.map(|s| s.wrapping_add(1))));
        let random = RandomFallback::new(config.random_seed);
        Self {
            g2p,
            distance,
            locale: locale.into(),
            config,
            simulator,
            random,
        }
    }

    fn phoneme_aligner(&self) -> PhonemeAligner<'_> {
        PhonemeAligner::new(self.g2p.as_ref(), self.distance.as_ref(), &self.locale)
            .with_problem_threshold(self.config.problem_threshold)
    }
}

/// What a stage sees of one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    /// Normalized reference words.
    pub reference: &'a [String],
    /// Normalized spoken words; empty when nothing was heard.
    pub spoken: &'a [String],
    /// Whether raw audio exists even if no transcript was recovered.
    pub audio_available: bool,
}

impl ScoringInput<'_> {
    pub fn has_speech(&self) -> bool {
        !self.spoken.is_empty()
    }
}

/// Word scores from one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageScores {
    pub words: Vec<WordScore>,
    /// Overrides the mean of `words` as the overall score.
    pub overall: Option<u32>,
}

impl StageScores {
    fn from_words(words: Vec<WordScore>) -> Self {
        Self {
            words,
            overall: None,
        }
    }
}

fn plain(word: &str, score: u32) -> WordScore {
    WordScore {
        word: word.to_string(),
        score,
        heard: None,
        phonemes: None,
    }
}

/// One rung of the scoring ladder.
pub trait LadderStage: Send + Sync {
    fn stage(&self) -> ScoringStage;

    /// `Ok(None)` when the stage does not apply to this input.
    fn score(
        &self,
        ctx: &ScoringContext,
        input: &ScoringInput<'_>,
    ) -> Result<Option<StageScores>, ScoringError>;
}

pub struct NoSpeechStage;

impl LadderStage for NoSpeechStage {
    fn stage(&self) -> ScoringStage {
        ScoringStage::NoSpeech
    }

    fn score(
        &self,
        _ctx: &ScoringContext,
        input: &ScoringInput<'_>,
    ) -> Result<Option<StageScores>, ScoringError> {
        if input.has_speech() || input.audio_available {
            return Ok(None);
        }
        let words = input
            .reference
            .iter()
            .map(|w| plain(w, NO_SPEECH_WORD_SCORE))
            .collect();
        Ok(Some(StageScores::from_words(words)))
    }
}

pub struct PhonemeStage;

impl LadderStage for PhonemeStage {
    fn stage(&self) -> ScoringStage {
        ScoringStage::Phoneme
    }

    fn score(
        &self,
        ctx: &ScoringContext,
        input: &ScoringInput<'_>,
    ) -> Result<Option<StageScores>, ScoringError> {
        if !input.has_speech() {
            return Err(AlignmentError::NoSpokenWords.into());
        }
        let aligner = ctx.phoneme_aligner();
        let counterparts = WordAligner::new(ctx.config.fuzzy_threshold);

        let mut scores = Vec::with_capacity(input.reference.len());
        for word in input.reference {
            let spoken_form = match &ctx.simulator {
                Some(simulator) => simulator.simulate(word),
                None => counterparts
                    .align_word(word, input.spoken)
                    .matched_word
                    .unwrap_or_default(),
            };
            let analysis = aligner.evaluate_phonemes(word, &spoken_form)?;
            debug!(word = %word, spoken = %spoken_form, score = analysis.score, "phoneme score");
            scores.push(WordScore {
                word: word.clone(),
                score: analysis.score,
                heard: Some(spoken_form).filter(|s| !s.is_empty()),
                phonemes: Some(analysis),
            });
        }
        Ok(Some(StageScores::from_words(scores)))
    }
}

pub struct WordPresenceStage;

impl LadderStage for WordPresenceStage {
    fn stage(&self) -> ScoringStage {
        ScoringStage::WordPresence
    }

    fn score(
        &self,
        ctx: &ScoringContext,
        input: &ScoringInput<'_>,
    ) -> Result<Option<StageScores>, ScoringError> {
        if !input.has_speech() {
            return Ok(Some(StageScores {
                words: input.reference.iter().map(|w| plain(w, 0)).collect(),
                overall: Some(0),
            }));
        }
        let aligner = WordAligner::new(ctx.config.coarse_threshold);
        let words = aligner
            .align(input.reference, input.spoken)
            .into_iter()
            .map(|a| {
                let score = a.score();
                WordScore {
                    word: a.reference_word,
                    score,
                    heard: a.matched_word,
                    phonemes: None,
                }
            })
            .collect();
        Ok(Some(StageScores::from_words(words)))
    }
}

/// Share of a word's characters found in `spoken`, as a percentage.
pub fn character_overlap(reference: &str, spoken: &str) -> u32 {
    let total = reference.chars().count();
    if total == 0 {
        return 0;
    }
    let shared = reference.chars().filter(|c| spoken.contains(*c)).count();
    (shared as f64 / total as f64 * 100.0).round() as u32
}

pub struct CharacterOverlapStage;

impl LadderStage for CharacterOverlapStage {
    fn stage(&self) -> ScoringStage {
        ScoringStage::CharacterOverlap
    }

    fn score(
        &self,
        _ctx: &ScoringContext,
        input: &ScoringInput<'_>,
    ) -> Result<Option<StageScores>, ScoringError> {
        if !input.has_speech() {
            return Err(AlignmentError::NoSpokenWords.into());
        }
        let words = input
            .reference
            .iter()
            .map(|word| {
                let best = input
                    .spoken
                    .iter()
                    .map(|spoken| character_overlap(word, spoken))
                    .max()
                    .unwrap_or(0);
                plain(word, best)
            })
            .collect();
        Ok(Some(StageScores::from_words(words)))
    }
}

/// Placeholder scores. Not a measurement of anything.
pub struct RandomStage;

impl LadderStage for RandomStage {
    fn stage(&self) -> ScoringStage {
        ScoringStage::Random
    }

    fn score(
        &self,
        ctx: &ScoringContext,
        input: &ScoringInput<'_>,
    ) -> Result<Option<StageScores>, ScoringError> {
        if !ctx.config.random_fallback {
            return Err(ScoringError::Disabled("random"));
        }
        let words = input
            .reference
            .iter()
            .map(|w| plain(w, ctx.random.next_score()))
            .collect();
        Ok(Some(StageScores::from_words(words)))
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// `round(mean)` over the word → score mapping, or 75 for no words.
///
/// A repeated word counts once with its last score, the same view as
/// [`PronunciationResult::per_word_scores`].
pub fn overall_score(words: &[WordScore]) -> u32 {
    let by_word: HashMap<&str, u32> = words.iter().map(|w| (w.word.as_str(), w.score)).collect();
    if by_word.is_empty() {
        return EMPTY_REFERENCE_SCORE;
    }
    let sum: u64 = by_word.values().map(|&s| u64::from(s)).sum();
    (sum as f64 / by_word.len() as f64).round() as u32
}

/// Scores a reading against its reference text.
pub struct PronunciationEvaluator {
    ctx: Arc<ScoringContext>,
    stages: Vec<Box<dyn LadderStage>>,
}

impl PronunciationEvaluator {
    /// An evaluator with the standard ladder.
    pub fn new(ctx: Arc<ScoringContext>) -> Self {
        let mut stages: Vec<Box<dyn LadderStage>> = vec![
            Box::new(NoSpeechStage),
            Box::new(PhonemeStage),
            Box::new(WordPresenceStage),
            Box::new(CharacterOverlapStage),
        ];
        if ctx.config.random_fallback {
            stages.push(Box::new(RandomStage));
        }
        Self { ctx, stages }
    }

    /// Convenience constructor that builds the context too.
    pub fn standard(
        g2p: Arc<dyn G2p>,
        distance: Arc<dyn PhoneticDistance>,
        locale: impl Into<String>,
        config: ScoringConfig,
    ) -> Self {
        Self::new(Arc::new(ScoringContext::new(g2p, distance, locale, config)))
    }

    /// An evaluator with a custom ladder.
    pub fn with_stages(ctx: Arc<ScoringContext>, stages: Vec<Box<dyn LadderStage>>) -> Self {
        Self { ctx, stages }
    }

    pub fn context(&self) -> &ScoringContext {
        &self.ctx
    }

    pub fn stages(&self) -> Vec<ScoringStage> {
        self.stages.iter().map(|s| s.stage()).collect()
    }

    /// Evaluate a reading.
    ///
    /// `recognized` may be empty or the no-speech sentinel. `audio_available`
    /// tells whether audio existed even when no text was recovered.
    pub fn evaluate(
        &self,
        reference: &str,
        recognized: &str,
        audio_available: bool,
    ) -> Result<PronunciationResult, EvaluationError> {
        if reference.trim().is_empty() {
            return Err(EvaluationError::EmptyReference);
        }
        let reference_words = text::words(reference);
        let spoken_words = if text::is_no_speech(recognized) {
            Vec::new()
        } else {
            text::words(recognized)
        };
        let input = ScoringInput {
            reference: &reference_words,
            spoken: &spoken_words,
            audio_available,
        };

        let mut last_error = None;
        for stage in &self.stages {
            match stage.score(&self.ctx, &input) {
                Ok(Some(scores)) => {
                    let overall = scores
                        .overall
                        .unwrap_or_else(|| overall_score(&scores.words));
                    debug!(stage = %stage.stage(), overall, "pronunciation scored");
                    return Ok(PronunciationResult {
                        overall_score: overall,
                        word_scores: scores.words,
                        recognized_text: recognized.trim().to_string(),
                        stage: stage.stage(),
                    });
                }
                Ok(None) => debug!(stage = %stage.stage(), "stage not applicable"),
                Err(e) => {
                    warn!(stage = %stage.stage(), "scoring stage failed: {e}");
                    last_error = Some(format!("{}: {e}", stage.stage()));
                }
            }
        }

        Err(EvaluationError::LadderExhausted(
            last_error.unwrap_or_else(|| "no stage applied".to_string()),
        ))
    }

    /// Phoneme analysis of a single word pair. Never fails: any error
    /// yields the fallback analysis.
    pub fn evaluate_phonemes(&self, reference_word: &str, spoken_word: &str) -> PhonemeAnalysis {
        let reference = text::normalize(reference_word);
        let spoken = text::normalize(spoken_word);
        let (reference, spoken) = (reference.trim(), spoken.trim());
        match self.ctx.phoneme_aligner().evaluate_phonemes(reference, spoken) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("phoneme converter failed for '{reference}': {e}");
                fallback_analysis(reference, spoken)
            }
        }
    }
}
