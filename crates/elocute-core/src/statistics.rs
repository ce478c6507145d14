//! Learner and class statistics over stored progress records.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Catalog, ProgressRecord};

/// Readings needed at a level before a learner counts as placed there.
pub const PLACEMENT_MIN_READINGS: u32 = 3;

/// Totals of one learner across levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerStats {
    pub user: String,
    pub total_readings: u64,
    pub total_words: u64,
    /// Mean WPM over all readings, weighted by readings per level.
    pub average_wpm: Option<f64>,
    pub average_accuracy: Option<f64>,
    pub best_wpm: Option<f64>,
    pub levels_practiced: usize,
    pub last_reading_date: Option<DateTime<Utc>>,
}

/// Mean of per-record means, weighted by each record's reading count.
fn weighted_mean<'a>(
    records: impl IntoIterator<Item = &'a ProgressRecord>,
    value: impl Fn(&ProgressRecord) -> Option<f64>,
) -> Option<f64> {
    let (sum, weight) = records
        .into_iter()
        .filter(|r| r.readings_completed > 0)
        .filter_map(|r| value(r).map(|v| (v, f64::from(r.readings_completed))))
        .fold((0.0, 0.0), |(sum, weight), (v, w)| (sum + v * w, weight + w));
    (weight > 0.0).then(|| sum / weight)
}

/// Statistics of `user` from their records; other users' records are ignored.
pub fn learner_stats(user: &str, records: &[ProgressRecord]) -> LearnerStats {
    let own: Vec<&ProgressRecord> = records.iter().filter(|r| r.user == user).collect();

    LearnerStats {
        user: user.to_string(),
        total_readings: own.iter().map(|r| u64::from(r.readings_completed)).sum(),
        total_words: own.iter().map(|r| r.total_words_read).sum(),
        average_wpm: weighted_mean(own.iter().copied(), |r| r.average_wpm),
        average_accuracy: weighted_mean(own.iter().copied(), |r| r.average_accuracy),
        best_wpm: own.iter().filter_map(|r| r.best_wpm).reduce(f64::max),
        levels_practiced: own.iter().filter(|r| r.readings_completed > 0).count(),
        last_reading_date: own.iter().filter_map(|r| r.last_reading_date).max(),
    }
}

/// The hardest catalog level at which `user` has at least
/// [`PLACEMENT_MIN_READINGS`] readings.
pub fn placement_level<'a>(
    user: &str,
    records: &'a [ProgressRecord],
    catalog: &Catalog,
) -> Option<&'a str> {
    records
        .iter()
        .filter(|r| r.user == user && r.readings_completed >= PLACEMENT_MIN_READINGS)
        .filter_map(|r| catalog.level_rank(&r.level).map(|rank| (rank, r.level.as_str())))
        .max_by_key(|(rank, _)| *rank)
        .map(|(_, level)| level)
}

/// Totals for a whole class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassStats {
    pub learners: usize,
    pub total_readings: u64,
    pub total_words: u64,
    pub average_wpm: Option<f64>,
    pub average_accuracy: Option<f64>,
    /// Learners placed at each catalog level, in catalog order.
    pub level_distribution: Vec<(String, usize)>,
    /// Learners not yet placed at any level.
    pub unplaced: usize,
}

/// Statistics over every record of every learner.
pub fn class_stats(records: &[ProgressRecord], catalog: &Catalog) -> ClassStats {
    let users: BTreeSet<&str> = records.iter().map(|r| r.user.as_str()).collect();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut unplaced = 0usize;
    for user in &users {
        match placement_level(user, records, catalog) {
            Some(level) => *counts.entry(level).or_default() += 1,
            None => unplaced += 1,
        }
    }

    ClassStats {
        learners: users.len(),
        total_readings: records.iter().map(|r| u64::from(r.readings_completed)).sum(),
        total_words: records.iter().map(|r| r.total_words_read).sum(),
        average_wpm: weighted_mean(records, |r| r.average_wpm),
        average_accuracy: weighted_mean(records, |r| r.average_accuracy),
        level_distribution: catalog
            .levels
            .iter()
            .map(|l| (l.id.clone(), counts.get(l.id.as_str()).copied().unwrap_or(0)))
            .collect(),
        unplaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProgressKey, ReadingLevel};

    fn level(id: &str) -> ReadingLevel {
        ReadingLevel {
            id: id.into(),
            name: id.into(),
            grade_equivalent: String::new(),
            description: String::new(),
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            id: "c".into(),
            name: "C".into(),
            description: String::new(),
            levels: vec![level("beginner"), level("intermediate"), level("advanced")],
            materials: vec![],
            badges: vec![],
        }
    }

    fn record(user: &str, level: &str, readings: u32, wpm: f64, accuracy: f64) -> ProgressRecord {
        ProgressRecord {
            readings_completed: readings,
            total_words_read: u64::from(readings) * 100,
            average_wpm: Some(wpm),
            average_accuracy: Some(accuracy),
            best_wpm: Some(wpm + 10.0),
            ..ProgressRecord::empty(&ProgressKey::new(user, level))
        }
    }

    #[test]
    fn learner_averages_are_weighted_by_readings() {
        let records = vec![
            record("ana", "beginner", 3, 100.0, 90.0),
            record("ana", "intermediate", 1, 140.0, 70.0),
            record("ben", "beginner", 9, 10.0, 10.0),
        ];
        let stats = learner_stats("ana", &records);
        assert_eq!(stats.total_readings, 4);
        assert_eq!(stats.total_words, 400);
        assert_eq!(stats.average_wpm, Some(110.0));
        assert_eq!(stats.average_accuracy, Some(85.0));
        assert_eq!(stats.best_wpm, Some(150.0));
        assert_eq!(stats.levels_practiced, 2);
    }

    #[test]
    fn learner_without_records() {
        let stats = learner_stats("nobody", &[]);
        assert_eq!(stats.total_readings, 0);
        assert_eq!(stats.average_wpm, None);
        assert_eq!(stats.best_wpm, None);
    }

    #[test]
    fn placement_needs_three_readings() {
        let records = vec![
            record("ana", "beginner", 5, 100.0, 90.0),
            record("ana", "advanced", 2, 100.0, 90.0),
            record("ana", "intermediate", 3, 100.0, 90.0),
        ];
        assert_eq!(placement_level("ana", &records, &catalog()), Some("intermediate"));
        assert_eq!(placement_level("ben", &records, &catalog()), None);
    }

    #[test]
    fn class_distribution_covers_every_level() {
        let records = vec![
            record("ana", "beginner", 5, 100.0, 90.0),
            record("ben", "advanced", 4, 150.0, 80.0),
            record("cy", "beginner", 1, 60.0, 50.0),
        ];
        let stats = class_stats(&records, &catalog());
        assert_eq!(stats.learners, 3);
        assert_eq!(stats.total_readings, 10);
        assert_eq!(
            stats.level_distribution,
            vec![
                ("beginner".to_string(), 1),
                ("intermediate".to_string(), 0),
                ("advanced".to_string(), 1),
            ]
        );
        assert_eq!(stats.unplaced, 1);
        // (5*100 + 4*150 + 1*60) / 10
        assert_eq!(stats.average_wpm, Some(116.0));
    }
}
