//! Phoneme-level alignment and scoring of a single word.
//!
//! Both the reference word and its spoken counterpart go through the G2P
//! collaborator, the two phoneme sequences are aligned with
//! [`SequenceMatcher`], and every reference phoneme gets a score:
//!
//! | run       | score per reference phoneme                          |
//! |-----------|------------------------------------------------------|
//! | `equal`   | 100                                                  |
//! | `replace` | `max(0, 100 - distance * 50)` against the paired phoneme |
//! | `delete`  | 0                                                    |
//! | `insert`  | not scored                                           |

use tracing::warn;

use crate::error::{AlignmentError, DistanceError, PhoneticConversionError, ScoringError};
use crate::matcher::SequenceMatcher;
use crate::model::{EditOp, PhonemeAlignment, PhonemeAnalysis};
use crate::traits::{G2p, PhoneticDistance};

/// Phonemes scoring below this are reported as problems.
pub const DEFAULT_PROBLEM_THRESHOLD: f64 = 70.0;

/// Word score used when phoneme analysis of that word fails.
pub const FALLBACK_WORD_SCORE: u32 = 70;

/// Score lost per unit of phonetic distance.
const DISTANCE_PENALTY: f64 = 50.0;

/// Aligns and scores the phonemes of one word.
pub struct PhonemeAligner<'a> {
    g2p: &'a dyn G2p,
    distance: &'a dyn PhoneticDistance,
    locale: &'a str,
    problem_threshold: f64,
}

impl<'a> PhonemeAligner<'a> {
    pub fn new(g2p: &'a dyn G2p, distance: &'a dyn PhoneticDistance, locale: &'a str) -> Self {
        Self {
            g2p,
            distance,
            locale,
            problem_threshold: DEFAULT_PROBLEM_THRESHOLD,
        }
    }

    pub fn with_problem_threshold(mut self, threshold: f64) -> Self {
        self.problem_threshold = threshold;
        self
    }

    /// Score every reference phoneme against the spoken sequence.
    ///
    /// Returns one alignment per reference index, in order, plus the spoken
    /// indices that were inserted.
    pub fn align_sequences(
        &self,
        reference: &[String],
        spoken: &[String],
    ) -> Result<(Vec<PhonemeAlignment>, Vec<usize>), DistanceError> {
        let mut alignments = Vec::with_capacity(reference.len());
        let mut inserted = Vec::new();

        for code in SequenceMatcher::new(reference, spoken).opcodes() {
            match code.op {
                EditOp::Equal => {
                    for i in code.i1..code.i2 {
                        alignments.push(PhonemeAlignment {
                            reference_index: i,
                            op: EditOp::Equal,
                            score: 100.0,
                            is_problem: false,
                        });
                    }
                }
                EditOp::Replace => {
                    for i in code.i1..code.i2 {
                        let (score, is_problem) = if code.j1 < code.j2 {
                            let j = code.j1 + (i - code.i1).min(code.j2 - code.j1 - 1);
                            let d = self.distance.distance(&reference[i], &spoken[j])?;
                            let score = (100.0 - d * DISTANCE_PENALTY).clamp(0.0, 100.0);
                            (score, score < self.problem_threshold)
                        } else {
                            (0.0, true)
                        };
                        alignments.push(PhonemeAlignment {
                            reference_index: i,
                            op: EditOp::Replace,
                            score,
                            is_problem,
                        });
                    }
                }
                EditOp::Delete => {
                    for i in code.i1..code.i2 {
                        alignments.push(PhonemeAlignment {
                            reference_index: i,
                            op: EditOp::Delete,
                            score: 0.0,
                            is_problem: true,
                        });
                    }
                }
                EditOp::Insert => inserted.extend(code.j1..code.j2),
            }
        }

        Ok((alignments, inserted))
    }

    /// Analyze a word, surfacing every failure.
    pub fn try_evaluate_phonemes(
        &self,
        reference_word: &str,
        spoken_word: &str,
    ) -> Result<PhonemeAnalysis, ScoringError> {
        let reference_phonemes = self.g2p.to_phonemes(reference_word, self.locale)?;
        let spoken_phonemes = if spoken_word.is_empty() {
            Vec::new()
        } else {
            self.g2p.to_phonemes(spoken_word, self.locale)?
        };

        let (alignments, inserted) = self
            .align_sequences(&reference_phonemes, &spoken_phonemes)
            .map_err(AlignmentError::from)?;

        let score = if alignments.is_empty() {
            0
        } else {
            let sum: f64 = alignments.iter().map(|a| a.score).sum();
            (sum / alignments.len() as f64).round() as u32
        };
        let problem_phonemes = alignments
            .iter()
            .filter(|a| a.is_problem)
            .map(|a| a.reference_index)
            .collect();

        Ok(PhonemeAnalysis {
            reference_phonemes,
            spoken_phonemes,
            alignments,
            problem_phonemes,
            inserted,
            score,
            degraded: false,
        })
    }

    /// Analyze a word, absorbing per-word failures.
    ///
    /// A word that cannot be converted or compared gets
    /// [`FALLBACK_WORD_SCORE`] with its letters standing in for phonemes.
    /// Only an unavailable converter is returned as an error.
    pub fn evaluate_phonemes(
        &self,
        reference_word: &str,
        spoken_word: &str,
    ) -> Result<PhonemeAnalysis, PhoneticConversionError> {
        match self.try_evaluate_phonemes(reference_word, spoken_word) {
            Ok(analysis) => Ok(analysis),
            Err(ScoringError::PhoneticConversion(e)) if e.is_fatal_for_stage() => Err(e),
            Err(e) => {
                warn!("phoneme analysis of '{reference_word}' failed, using fallback score: {e}");
                Ok(fallback_analysis(reference_word, spoken_word))
            }
        }
    }
}

/// The fixed moderate result for a word whose analysis failed.
pub fn fallback_analysis(reference_word: &str, spoken_word: &str) -> PhonemeAnalysis {
    PhonemeAnalysis {
        reference_phonemes: reference_word.chars().map(String::from).collect(),
        spoken_phonemes: spoken_word.chars().map(String::from).collect(),
        alignments: Vec::new(),
        problem_phonemes: Vec::new(),
        inserted: Vec::new(),
        score: FALLBACK_WORD_SCORE,
        degraded: true,
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn phonemes(s: &str) -> Vec<String> {
        s.chars().map(String::from).collect()
    }

    fn assert_partition(alignments: &[PhonemeAlignment], reference_len: usize) {
        let indices: Vec<usize> = alignments.iter().map(|a| a.reference_index).collect();
        assert_eq!(indices, (0..reference_len).collect::<Vec<_>>());
        assert!(alignments.iter().all(|a| a.op != EditOp::Insert));
    }

    #[test]
    fn identical_word_scores_full() {
        let distance = FixedDistance::new(1.0);
        let aligner = PhonemeAligner::new(&LetterG2p, &distance, "en-US");
        let analysis = aligner.evaluate_phonemes("cat", "cat").unwrap();
        assert_eq!(analysis.score, 100);
        assert!(analysis.problem_phonemes.is_empty());
        assert_partition(&analysis.alignments, 3);
        assert!(distance.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn close_substitution_is_not_a_problem() {
        let distance = FixedDistance::new(0.5);
        let aligner = PhonemeAligner::new(&LetterG2p, &distance, "en-US");
        let analysis = aligner.evaluate_phonemes("cat", "bat").unwrap();
        assert_eq!(analysis.alignments[0].op, EditOp::Replace);
        assert_eq!(analysis.alignments[0].score, 75.0);
        assert!(!analysis.alignments[0].is_problem);
        // (75 + 100 + 100) / 3 = 91.67
        assert_eq!(analysis.score, 92);
    }

    #[test]
    fn distant_substitution_is_a_problem() {
        let distance = FixedDistance::new(1.0);
        let aligner = PhonemeAligner::new(&LetterG2p, &distance, "en-US");
        let analysis = aligner.evaluate_phonemes("cat", "bat").unwrap();
        assert_eq!(analysis.alignments[0].score, 50.0);
        assert_eq!(analysis.problem_phonemes, vec![0]);
    }

    #[test]
    fn large_distance_floors_at_zero() {
        let distance = FixedDistance::new(3.5);
        let aligner = PhonemeAligner::new(&LetterG2p, &distance, "en-US");
        let analysis = aligner.evaluate_phonemes("cat", "bat").unwrap();
        assert_eq!(analysis.alignments[0].score, 0.0);
    }

    #[test]
    fn uneven_replace_run_clamps_spoken_index() {
        let distance = FixedDistance::new(0.0);
        let aligner = PhonemeAligner::new(&LetterG2p, &distance, "en-US");
        let (alignments, inserted) = aligner
            .align_sequences(&phonemes("abcd"), &phonemes("axd"))
            .unwrap();
        assert_partition(&alignments, 4);
        assert!(inserted.is_empty());
        let calls = distance.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![("b".to_string(), "x".to_string()), ("c".to_string(), "x".to_string())]
        );
    }

    #[test]
    fn omitted_phoneme_is_deleted() {
        let distance = FixedDistance::new(0.0);
        let aligner = PhonemeAligner::new(&LetterG2p, &distance, "en-US");
        let analysis = aligner.evaluate_phonemes("cart", "cat").unwrap();
        assert_partition(&analysis.alignments, 4);
        assert_eq!(analysis.alignments[2].op, EditOp::Delete);
        assert_eq!(analysis.problem_phonemes, vec![2]);
        assert_eq!(analysis.score, 75);
    }

    #[test]
    fn inserted_phonemes_are_not_scored() {
        let distance = FixedDistance::new(0.0);
        let aligner = PhonemeAligner::new(&LetterG2p, &distance, "en-US");
        let analysis = aligner.evaluate_phonemes("cat", "cast").unwrap();
        assert_partition(&analysis.alignments, 3);
        assert_eq!(analysis.inserted, vec![2]);
        assert_eq!(analysis.score, 100);
    }

    #[test]
    fn missing_spoken_word_deletes_everything() {
        let distance = FixedDistance::new(0.0);
        let aligner = PhonemeAligner::new(&LetterG2p, &distance, "en-US");
        let analysis = aligner.evaluate_phonemes("dog", "").unwrap();
        assert_partition(&analysis.alignments, 3);
        assert!(analysis.alignments.iter().all(|a| a.op == EditOp::Delete));
        assert_eq!(analysis.score, 0);
    }

    #[test]
    fn partition_holds_for_assorted_pairs() {
        let distance = FixedDistance::new(0.7);
        let aligner = PhonemeAligner::new(&LetterG2p, &distance, "en-US");
        for (reference, spoken) in [
            ("pronunciation", "pronounciation"),
            ("through", "true"),
            ("a", "xyz"),
            ("abcabc", "cbacba"),
            ("strengths", "strens"),
        ] {
            let (alignments, _) = aligner
                .align_sequences(&phonemes(reference), &phonemes(spoken))
                .unwrap();
            assert_partition(&alignments, reference.chars().count());
        }
    }

    #[test]
    fn distance_failure_uses_fallback() {
        let aligner = PhonemeAligner::new(&LetterG2p, &BrokenDistance, "en-US");
        let analysis = aligner.evaluate_phonemes("think", "tink").unwrap();
        assert_eq!(analysis.score, FALLBACK_WORD_SCORE);
        assert!(analysis.degraded);
        assert_eq!(analysis.reference_phonemes, phonemes("think"));
        assert_eq!(analysis.spoken_phonemes, phonemes("tink"));
        assert!(analysis.alignments.is_empty());
        assert!(analysis.problem_phonemes.is_empty());
    }

    #[test]
    fn untranscribable_word_uses_fallback() {
        let distance = FixedDistance::new(0.0);
        let aligner = PhonemeAligner::new(&LetterG2p, &distance, "en-US");
        let analysis = aligner.evaluate_phonemes("r2d2", "r2d2").unwrap();
        assert_eq!(analysis.score, FALLBACK_WORD_SCORE);
        assert!(analysis.degraded);
    }

    #[test]
    fn unavailable_converter_is_an_error() {
        let distance = FixedDistance::new(0.0);
        let aligner = PhonemeAligner::new(&DownG2p, &distance, "en-US");
        assert!(matches!(
            aligner.evaluate_phonemes("cat", "cat"),
            Err(PhoneticConversionError::Unavailable(_))
        ));
    }
}
