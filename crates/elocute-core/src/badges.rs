//! Badge eligibility.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::model::{AwardedBadge, Badge, Catalog, ProgressRecord, RequirementType};

/// A learner's totals across every level, as badges see them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressFacts {
    pub user: String,
    pub total_readings: u64,
    /// Highest WPM of any session, 0 when none.
    pub max_wpm: f64,
    pub total_words: u64,
}

impl ProgressFacts {
    /// Aggregate all records of one user.
    pub fn from_records(user: impl Into<String>, records: &[ProgressRecord]) -> Self {
        let mut facts = Self {
            user: user.into(),
            ..Self::default()
        };
        for record in records {
            facts.total_readings += u64::from(record.readings_completed);
            facts.total_words += record.total_words_read;
            let best = record.best_wpm.or(record.average_wpm).unwrap_or(0.0);
            facts.max_wpm = facts.max_wpm.max(best);
        }
        facts
    }

    /// Returns `true` if these totals meet the badge requirement.
    pub fn satisfies(&self, badge: &Badge) -> bool {
        match badge.requirement_type {
            RequirementType::ReadingsCompleted => self.total_readings as f64 >= badge.requirement_value,
            RequirementType::WpmAchieved => self.max_wpm >= badge.requirement_value,
            RequirementType::WordsRead => self.total_words as f64 >= badge.requirement_value,
            RequirementType::Unsupported => false,
        }
    }
}

/// Badges newly earned by `facts.user`, in catalog order.
///
/// Ids in `already_awarded` are skipped, so calling this again with the
/// awards it returned yields nothing.
pub fn evaluate_badges(
    catalog: &[Badge],
    already_awarded: &HashSet<String>,
    facts: &ProgressFacts,
    now: DateTime<Utc>,
) -> Vec<AwardedBadge> {
    catalog
        .iter()
        .filter(|badge| !already_awarded.contains(&badge.id))
        .filter(|badge| facts.satisfies(badge))
        .map(|badge| AwardedBadge {
            user: facts.user.clone(),
            badge_id: badge.id.clone(),
            badge_name: badge.name.clone(),
            date_earned: now,
        })
        .collect()
}

/// [`evaluate_badges`] over a catalog's badge list.
pub fn evaluate_catalog_badges(
    catalog: &Catalog,
    already_awarded: &HashSet<String>,
    facts: &ProgressFacts,
    now: DateTime<Utc>,
) -> Vec<AwardedBadge> {
    evaluate_badges(&catalog.badges, already_awarded, facts, now)
}
