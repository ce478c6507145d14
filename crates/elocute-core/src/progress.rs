//! Folding completed sessions into a learner's running statistics.

use crate::model::{ProgressKey, ProgressRecord, SessionFacts};

/// Mean of `count` values given the mean of the first `count - 1`.
fn fold_mean(previous: Option<f64>, previous_count: u32, value: f64) -> f64 {
    match previous {
        Some(mean) if previous_count > 0 => {
            (mean * f64::from(previous_count) + value) / f64::from(previous_count + 1)
        }
        _ => value,
    }
}

/// Apply one session to a record.
///
/// `existing` of `None` starts from an empty record for `key`. A session
/// that was not completed leaves the record as it was. The `version` field
/// passes through untouched; the store bumps it on save.
pub fn update_progress(
    existing: Option<ProgressRecord>,
    key: &ProgressKey,
    session: &SessionFacts,
) -> ProgressRecord {
    let record = existing.unwrap_or_else(|| ProgressRecord::empty(key));
    if !session.completed {
        return record;
    }

    let previous = record.readings_completed;
    ProgressRecord {
        readings_completed: previous + 1,
        total_words_read: record.total_words_read + session.word_count,
        average_wpm: Some(fold_mean(record.average_wpm, previous, session.wpm)),
        average_accuracy: Some(fold_mean(record.average_accuracy, previous, session.accuracy)),
        best_wpm: Some(record.best_wpm.map_or(session.wpm, |best| best.max(session.wpm))),
        last_reading_date: Some(session.completed_at),
        ..record
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use uuid::Uuid;

    use super::*;

    fn session(wpm: f64, accuracy: f64, words: u64) -> SessionFacts {
        SessionFacts {
            session_id: Uuid::new_v4(),
            completed: true,
            word_count: words,
            wpm,
            accuracy,
            completed_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn key() -> ProgressKey {
        ProgressKey::new("ana", "beginner")
    }

    #[test]
    fn first_session_creates_record() {
        let record = update_progress(None, &key(), &session(90.0, 80.0, 120));
        assert_eq!(record.user, "ana");
        assert_eq!(record.level, "beginner");
        assert_eq!(record.readings_completed, 1);
        assert_eq!(record.total_words_read, 120);
        assert_eq!(record.average_wpm, Some(90.0));
        assert_eq!(record.average_accuracy, Some(80.0));
        assert_eq!(record.best_wpm, Some(90.0));
        assert!(record.last_reading_date.is_some());
        assert_eq!(record.version, 0);
    }

    #[test]
    fn second_session_averages() {
        let first = update_progress(None, &key(), &session(90.0, 80.0, 100));
        let second = update_progress(Some(first), &key(), &session(110.0, 60.0, 50));
        assert_eq!(second.readings_completed, 2);
        assert_eq!(second.total_words_read, 150);
        assert_eq!(second.average_wpm, Some(100.0));
        assert_eq!(second.average_accuracy, Some(70.0));
        assert_eq!(second.best_wpm, Some(110.0));
    }

    #[test]
    fn incomplete_session_is_a_no_op() {
        let record = update_progress(None, &key(), &session(90.0, 80.0, 100));
        let mut facts = session(200.0, 10.0, 999);
        facts.completed = false;
        let after = update_progress(Some(record.clone()), &key(), &facts);
        assert_eq!(after, record);

        let fresh = update_progress(None, &key(), &facts);
        assert_eq!(fresh, ProgressRecord::empty(&key()));
    }

    #[test]
    fn version_is_untouched() {
        let mut record = update_progress(None, &key(), &session(90.0, 80.0, 100));
        record.version = 7;
        let after = update_progress(Some(record), &key(), &session(90.0, 80.0, 100));
        assert_eq!(after.version, 7);
    }

    #[test]
    fn running_mean_matches_arithmetic_mean() {
        let mut rng = StdRng::seed_from_u64(42);
        for len in 1..=50 {
            let values: Vec<(f64, f64)> = (0..len)
                .map(|_| (rng.gen_range(0.0..300.0), rng.gen_range(0.0..100.0)))
                .collect();

            let mut record = None;
            for &(wpm, accuracy) in &values {
                record = Some(update_progress(record, &key(), &session(wpm, accuracy, 10)));
            }
            let record = record.unwrap();

            let mean_wpm = values.iter().map(|v| v.0).sum::<f64>() / len as f64;
            let mean_acc = values.iter().map(|v| v.1).sum::<f64>() / len as f64;
            let max_wpm = values.iter().map(|v| v.0).fold(f64::MIN, f64::max);

            assert_eq!(record.readings_completed, len as u32);
            assert_eq!(record.total_words_read, 10 * len as u64);
            assert!((record.average_wpm.unwrap() - mean_wpm).abs() < 1e-6);
            assert!((record.average_accuracy.unwrap() - mean_acc).abs() < 1e-6);
            assert_eq!(record.best_wpm, Some(max_wpm));
        }
    }
}
