//! Word-level alignment of reference words against spoken words.

use crate::matcher::similarity;
use crate::model::{MatchKind, WordAlignment};

/// Minimum similarity for a fuzzy match when searching a word's spoken counterpart.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.6;

/// Minimum similarity used by the coarser word-presence fallback.
pub const COARSE_FUZZY_THRESHOLD: f64 = 0.5;

/// Matches each reference word to its best spoken counterpart.
#[derive(Debug, Clone, Copy)]
pub struct WordAligner {
    threshold: f64,
}

impl Default for WordAligner {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD)
    }
}

impl WordAligner {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Align one reference word.
    ///
    /// An exact occurrence anywhere in `spoken` wins. Otherwise the most
    /// similar spoken word is kept if it reaches the threshold; ties go to
    /// the earliest spoken word.
    pub fn align_word(&self, reference: &str, spoken: &[String]) -> WordAlignment {
        if spoken.iter().any(|w| w == reference) {
            return WordAlignment {
                reference_word: reference.to_string(),
                matched_word: Some(reference.to_string()),
                similarity: 1.0,
                kind: MatchKind::Exact,
            };
        }

        let mut best: Option<(&String, f64)> = None;
        for candidate in spoken {
            let ratio = similarity(reference, candidate);
            match best {
                Some((_, best_ratio)) if ratio <= best_ratio => {}
                _ => best = Some((candidate, ratio)),
            }
        }

        match best {
            Some((word, ratio)) if ratio >= self.threshold => WordAlignment {
                reference_word: reference.to_string(),
                matched_word: Some(word.clone()),
                similarity: ratio,
                kind: MatchKind::Fuzzy,
            },
            Some((_, ratio)) => WordAlignment {
                reference_word: reference.to_string(),
                matched_word: None,
                similarity: ratio,
                kind: MatchKind::Missing,
            },
            None => WordAlignment {
                reference_word: reference.to_string(),
                matched_word: None,
                similarity: 0.0,
                kind: MatchKind::Missing,
            },
        }
    }

    /// Align every reference word, in reference order.
    pub fn align(&self, reference: &[String], spoken: &[String]) -> Vec<WordAlignment> {
        reference
            .iter()
            .map(|word| self.align_word(word, spoken))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::words;

    #[test]
    fn identical_words_are_exact() {
        let reference = words("cat sat on the mat");
        let aligned = WordAligner::default().align(&reference, &reference);
        assert!(aligned.iter().all(|a| a.kind == MatchKind::Exact));
        assert!(aligned.iter().all(|a| a.score() == 100));
    }

    #[test]
    fn exact_match_is_order_independent() {
        let aligned = WordAligner::default().align_word("mat", &words("mat the on sat cat"));
        assert_eq!(aligned.kind, MatchKind::Exact);
    }

    #[test]
    fn fuzzy_match_above_threshold() {
        let aligned = WordAligner::default().align_word("think", &words("i tink so"));
        assert_eq!(aligned.kind, MatchKind::Fuzzy);
        assert_eq!(aligned.matched_word.as_deref(), Some("tink"));
        assert_eq!(aligned.score(), 88);
    }

    #[test]
    fn below_threshold_is_missing() {
        let aligned = WordAligner::default().align_word("elephant", &words("cat dog"));
        assert_eq!(aligned.kind, MatchKind::Missing);
        assert!(aligned.matched_word.is_none());
        assert_eq!(aligned.score(), 0);
    }

    #[test]
    fn ties_pick_first_spoken_word() {
        // "bat" and "cat" are equally similar to "hat".
        let aligned = WordAligner::default().align_word("hat", &words("bat cat"));
        assert_eq!(aligned.matched_word.as_deref(), Some("bat"));
    }

    #[test]
    fn coarse_threshold_accepts_weaker_matches() {
        // ratio("ab", "ac") = 0.5
        let strict = WordAligner::default().align_word("ab", &words("ac"));
        let coarse = WordAligner::new(COARSE_FUZZY_THRESHOLD).align_word("ab", &words("ac"));
        assert_eq!(strict.kind, MatchKind::Missing);
        assert_eq!(coarse.kind, MatchKind::Fuzzy);
        assert_eq!(coarse.score(), 50);
    }

    #[test]
    fn empty_spoken_list_is_missing() {
        let aligned = WordAligner::default().align_word("cat", &[]);
        assert_eq!(aligned.kind, MatchKind::Missing);
        assert_eq!(aligned.similarity, 0.0);
    }
}
