//! Session reports with JSON persistence and word-level comparison.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{AwardedBadge, FluencyResult, ProgressRecord, PronunciationResult, WordScore};

/// Everything produced by one completed reading session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// The session id.
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user: String,
    pub level: String,
    #[serde(default)]
    pub material_id: Option<String>,
    pub reference_text: String,
    pub pronunciation: PronunciationResult,
    pub fluency: FluencyResult,
    /// Duration used for the speaking rate.
    pub duration_secs: f64,
    /// Words scoring below the mispronunciation threshold, in reading
    /// order, with what was heard and their phoneme analysis.
    #[serde(default)]
    pub mispronounced_words: Vec<WordScore>,
    /// The stored progress after this session, when it was recorded.
    #[serde(default)]
    pub progress: Option<ProgressRecord>,
    /// Badges first earned by this session.
    #[serde(default)]
    pub new_badges: Vec<AwardedBadge>,
}

impl SessionReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this reading of a text against an earlier one.
    ///
    /// Word scores whose change exceeds `threshold` points in either
    /// direction are listed as regressions or improvements.
    pub fn compare(&self, baseline: &SessionReport, threshold: f64) -> ComparisonReport {
        // BTreeMap for a stable listing order.
        let current: BTreeMap<_, _> = self.pronunciation.per_word_scores().into_iter().collect();
        let previous: BTreeMap<_, _> =
            baseline.pronunciation.per_word_scores().into_iter().collect();

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_words = 0usize;

        for (word, &score) in &current {
            let Some(&before) = previous.get(word) else {
                new_words += 1;
                continue;
            };
            let delta = f64::from(score) - f64::from(before);
            let change = WordChange {
                word: word.clone(),
                baseline_score: before,
                current_score: score,
                delta,
            };
            if delta < -threshold {
                regressions.push(change);
            } else if delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_words = previous.keys().filter(|w| !current.contains_key(*w)).count();

        ComparisonReport {
            overall_delta: f64::from(self.pronunciation.overall_score)
                - f64::from(baseline.pronunciation.overall_score),
            fluency_delta: self.fluency.fluency_score - baseline.fluency.fluency_score,
            wpm_delta: self.fluency.wpm - baseline.fluency.wpm,
            regressions,
            improvements,
            unchanged,
            new_words,
            removed_words,
        }
    }
}

/// Result of comparing two session reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub overall_delta: f64,
    pub fluency_delta: f64,
    pub wpm_delta: f64,
    /// Words whose score went down.
    pub regressions: Vec<WordChange>,
    /// Words whose score went up.
    pub improvements: Vec<WordChange>,
    pub unchanged: usize,
    /// Words only in the current report.
    pub new_words: usize,
    /// Words only in the baseline.
    pub removed_words: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordChange {
    pub word: String,
    pub baseline_score: u32,
    pub current_score: u32,
    pub delta: f64,
}

impl ComparisonReport {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** overall {:+.0}, fluency {:+.1}, {:+.1} WPM; {} regressions, {} improvements, {} unchanged\n\n",
            self.overall_delta,
            self.fluency_delta,
            self.wpm_delta,
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (title, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Word | Baseline | Current | Delta |\n");
            md.push_str("|------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {} | {} | {:+.0} |\n",
                    c.word, c.baseline_score, c.current_score, c.delta
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if any word got worse.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
