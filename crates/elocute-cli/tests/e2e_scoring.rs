//! End-to-end scoring with the rule-based G2P and feature distance.
//!
//! These pin the behaviour a reader sees for a few well-known readings.

use elocute_core::model::ScoringStage;
use elocute_core::scoring::ScoringConfig;
use elocute_providers::{create_evaluator, ElocuteConfig};

fn config() -> ElocuteConfig {
    ElocuteConfig {
        scoring: ScoringConfig {
            random_fallback: false,
            ..ScoringConfig::default()
        },
        ..ElocuteConfig::default()
    }
}

#[test]
fn perfect_reading() {
    let result = create_evaluator(&config())
        .evaluate("The cat sat on the mat.", "the cat sat on the mat", false)
        .unwrap();
    assert_eq!(result.overall_score, 100);
    assert_eq!(result.stage, ScoringStage::Phoneme);
    assert!(result.word_scores.iter().all(|w| w.score == 100));
}

#[test]
fn nothing_heard_without_audio() {
    let result = create_evaluator(&config())
        .evaluate("The cat sat", "", false)
        .unwrap();
    assert_eq!(result.stage, ScoringStage::NoSpeech);
    assert_eq!(result.overall_score, 50);
}

#[test]
fn nothing_heard_with_audio() {
    let result = create_evaluator(&config())
        .evaluate("The cat sat", "No speech detected", true)
        .unwrap();
    assert_eq!(result.stage, ScoringStage::WordPresence);
    assert_eq!(result.overall_score, 0);
}

#[test]
fn voicing_slip_scores_above_stopping() {
    let evaluator = create_evaluator(&config());
    let van = evaluator.evaluate_phonemes("van", "fan");
    let think = evaluator.evaluate_phonemes("think", "tink");
    assert!(van.problem_phonemes.is_empty());
    assert_eq!(think.problem_phonemes, vec![0]);
    assert!(van.score > think.score);
}

#[test]
fn skipped_word_is_scored_low() {
    let result = create_evaluator(&config())
        .evaluate("I like green apples", "I like apples", false)
        .unwrap();
    let green = &result.word_scores[2];
    assert_eq!(green.word, "green");
    assert!(green.score < 70, "green scored {}", green.score);
    assert!(result.mispronounced_words(70).iter().any(|w| w.word == "green"));
}

#[test]
fn other_locales_fall_back_to_word_presence() {
    let config = ElocuteConfig {
        locale: "es-ES".into(),
        ..config()
    };
    let result = create_evaluator(&config)
        .evaluate("el gato negro", "el gato", false)
        .unwrap();
    assert_eq!(result.stage, ScoringStage::WordPresence);
    assert_eq!(result.word_scores[0].score, 100);
    assert_eq!(result.word_scores[2].score, 0);
}
