//! Speaking-rate based fluency scoring.

use serde::{Deserialize, Serialize};

use crate::model::FluencyResult;

/// WPM thresholds of the piecewise fluency curve.
///
/// Below `low_wpm` the score climbs linearly from 0 to 70. Between
/// `low_wpm` and `high_wpm` it lies in 85..=100 and peaks at `ideal_wpm`.
/// Above `high_wpm` it decays from 85 towards 70, which it reaches at
/// `max_wpm`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluencyThresholds {
    pub low_wpm: f64,
    pub high_wpm: f64,
    pub ideal_wpm: f64,
    pub max_wpm: f64,
}

impl Default for FluencyThresholds {
    fn default() -> Self {
        Self {
            low_wpm: 80.0,
            high_wpm: 160.0,
            ideal_wpm: 120.0,
            max_wpm: 200.0,
        }
    }
}

impl FluencyThresholds {
    /// Fluency score in `[0, 100]` for a speaking rate.
    pub fn score(&self, wpm: f64) -> f64 {
        let score = if wpm < self.low_wpm {
            70.0 * (wpm / self.low_wpm)
        } else if wpm > self.high_wpm {
            let ratio = (1.0 - (wpm - self.high_wpm) / (self.max_wpm - self.high_wpm)).max(0.0);
            70.0 + 15.0 * ratio
        } else {
            let dist = (wpm - self.ideal_wpm).abs() / (self.high_wpm - self.low_wpm);
            85.0 + 15.0 * (1.0 - (dist * 2.0).min(1.0))
        };
        score.clamp(0.0, 100.0)
    }

    /// Returns a list of problems that make the curve meaningless.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.low_wpm <= 0.0 {
            problems.push(format!("low_wpm must be positive, got {}", self.low_wpm));
        }
        if self.low_wpm >= self.high_wpm {
            problems.push(format!(
                "low_wpm ({}) must be below high_wpm ({})",
                self.low_wpm, self.high_wpm
            ));
        }
        if self.ideal_wpm < self.low_wpm || self.ideal_wpm > self.high_wpm {
            problems.push(format!(
                "ideal_wpm ({}) must lie between low_wpm and high_wpm",
                self.ideal_wpm
            ));
        }
        if self.max_wpm <= self.high_wpm {
            problems.push(format!(
                "max_wpm ({}) must be above high_wpm ({})",
                self.max_wpm, self.high_wpm
            ));
        }
        problems
    }
}

/// Words per minute; 0 when the duration is not positive.
pub fn words_per_minute(word_count: usize, duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 || !duration_secs.is_finite() {
        return 0.0;
    }
    word_count as f64 / (duration_secs / 60.0)
}

/// Fluency of a reading with the default thresholds.
pub fn compute_fluency(word_count: usize, duration_secs: f64) -> FluencyResult {
    compute_fluency_with(&FluencyThresholds::default(), word_count, duration_secs)
}

pub fn compute_fluency_with(
    thresholds: &FluencyThresholds,
    word_count: usize,
    duration_secs: f64,
) -> FluencyResult {
    let wpm = words_per_minute(word_count, duration_secs);
    FluencyResult {
        wpm,
        fluency_score: thresholds.score(wpm),
    }
}
