//! Session Aggregator
//!
//! Collapses one exercise's sets into a [`SessionSummary`] per training day.
//! Histories are built once per report and handed to every analysis stage.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::trace;

use crate::models::{ExerciseHistory, SessionSummary, SetRecord};

/// Summarize one exercise's sets, one entry per date, newest first
///
/// Records for other exercises are not filtered out; callers pass a single
/// exercise's sets (see [`aggregate_all`]).
pub fn aggregate<'a, I>(records: I) -> Vec<SessionSummary>
where
    I: IntoIterator<Item = &'a SetRecord>,
{
    let mut by_date: BTreeMap<NaiveDate, Vec<&SetRecord>> = BTreeMap::new();
    for record in records {
        by_date.entry(record.date).or_default().push(record);
    }

    by_date
        .into_iter()
        .rev()
        .filter_map(|(date, sets)| summarize(date, &sets))
        .collect()
}

/// Group a full log by exercise and aggregate each, sorted by exercise name
pub fn aggregate_all(records: &[SetRecord]) -> Vec<ExerciseHistory> {
    let mut by_exercise: BTreeMap<&str, Vec<&SetRecord>> = BTreeMap::new();
    for record in records {
        by_exercise
            .entry(record.exercise.as_str())
            .or_default()
            .push(record);
    }

    by_exercise
        .into_iter()
        .map(|(exercise, sets)| ExerciseHistory {
            exercise: exercise.to_string(),
            sessions: aggregate(sets),
        })
        .collect()
}

fn summarize(date: NaiveDate, sets: &[&SetRecord]) -> Option<SessionSummary> {
    let first = sets.first()?;
    let count = Decimal::from(sets.len());

    let total_weight: Decimal = sets.iter().map(|s| s.weight).sum();
    let total_reps: Decimal = sets.iter().map(|s| Decimal::from(s.reps)).sum();
    let total_volume: Decimal = sets.iter().map(|s| s.volume()).sum();

    let rpes: Vec<Decimal> = sets.iter().filter_map(|s| s.rpe).collect();
    let mean_rpe = if rpes.is_empty() {
        None
    } else {
        Some(rpes.iter().sum::<Decimal>() / Decimal::from(rpes.len()))
    };
    let peak_rpe = rpes.iter().copied().max();

    // max_by_key returns the last maximum, so ties go to the last-seen set
    let final_rpe = sets.iter().max_by_key(|s| s.set_index).and_then(|s| s.rpe);

    let mut ordered: Vec<&&SetRecord> = sets.iter().collect();
    ordered.sort_by_key(|s| s.set_index);
    let set_weights = ordered.iter().map(|s| s.weight).collect();

    trace!(
        exercise = %first.exercise,
        %date,
        sets = sets.len(),
        "Aggregated session"
    );

    Some(SessionSummary {
        exercise: first.exercise.clone(),
        date,
        mean_weight: total_weight / count,
        mean_reps: total_reps / count,
        mean_rpe,
        peak_rpe,
        final_rpe,
        total_volume,
        set_count: sets.len() as u32,
        set_weights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn set(day: u32, weight: Decimal, reps: u32, rpe: Option<Decimal>, set_index: u32) -> SetRecord {
        SetRecord {
            date: NaiveDate::from_ymd_opt(2024, 9, day).unwrap(),
            workout: "Push".to_string(),
            exercise: "Bench Press (Barbell)".to_string(),
            weight,
            reps,
            rpe,
            set_index,
        }
    }

    #[test]
    fn test_sessions_are_newest_first() {
        let records = vec![
            set(1, dec!(60), 8, None, 0),
            set(8, dec!(62.5), 8, None, 0),
            set(4, dec!(60), 8, None, 0),
        ];
        let sessions = aggregate(&records);
        let dates: Vec<u32> = sessions.iter().map(|s| chrono::Datelike::day(&s.date)).collect();
        assert_eq!(dates, vec![8, 4, 1]);
    }

    #[test]
    fn test_means_ignore_missing_rpe() {
        let records = vec![
            set(1, dec!(60), 10, Some(dec!(7)), 0),
            set(1, dec!(65), 8, None, 1),
            set(1, dec!(70), 6, Some(dec!(9)), 2),
        ];
        let session = &aggregate(&records)[0];

        assert_eq!(session.mean_weight, dec!(65));
        assert_eq!(session.mean_reps, dec!(8));
        assert_eq!(session.mean_rpe, Some(dec!(8)));
        assert_eq!(session.peak_rpe, Some(dec!(9)));
        assert_eq!(session.final_rpe, Some(dec!(9)));
        assert_eq!(session.set_count, 3);
        assert_eq!(session.set_weights, vec![dec!(60), dec!(65), dec!(70)]);
    }

    #[test]
    fn test_volume_is_summed_per_set() {
        let records = vec![
            set(1, dec!(100), 5, None, 0),
            set(1, dec!(80), 10, None, 1),
        ];
        let session = &aggregate(&records)[0];
        assert_eq!(session.total_volume, dec!(1300));
        // Not mean_weight × mean_reps × count (90 × 7.5 × 2 = 1350)
        assert_ne!(session.total_volume, session.mean_weight * session.mean_reps * dec!(2));
    }

    #[test]
    fn test_zero_weight_contributes_zero_volume() {
        let records = vec![set(1, Decimal::ZERO, 15, None, 0)];
        assert_eq!(aggregate(&records)[0].total_volume, Decimal::ZERO);
    }

    #[test]
    fn test_final_rpe_follows_highest_set_index() {
        let records = vec![
            set(1, dec!(60), 8, Some(dec!(8)), 2),
            set(1, dec!(60), 8, Some(dec!(9.5)), 0),
            set(1, dec!(60), 8, Some(dec!(8.5)), 1),
        ];
        let session = &aggregate(&records)[0];
        assert_eq!(session.final_rpe, Some(dec!(8)));
        assert_eq!(session.peak_rpe, Some(dec!(9.5)));
    }

    #[test]
    fn test_final_rpe_tie_goes_to_last_seen() {
        let records = vec![
            set(1, dec!(60), 8, Some(dec!(7)), 1),
            set(1, dec!(60), 8, Some(dec!(8)), 1),
        ];
        assert_eq!(aggregate(&records)[0].final_rpe, Some(dec!(8)));
    }

    #[test]
    fn test_no_rpe_stays_undefined() {
        let records = vec![set(1, dec!(60), 8, None, 0)];
        let session = &aggregate(&records)[0];
        assert!(session.mean_rpe.is_none());
        assert!(session.peak_rpe.is_none());
        assert!(session.final_rpe.is_none());
    }

    #[test]
    fn test_rpe_zero_is_not_missing() {
        let records = vec![set(1, dec!(60), 8, Some(Decimal::ZERO), 0)];
        assert_eq!(aggregate(&records)[0].peak_rpe, Some(Decimal::ZERO));
    }

    #[test]
    fn test_aggregate_all_groups_by_exercise() {
        let mut squat = set(2, dec!(100), 5, None, 0);
        squat.exercise = "Squat (Barbell)".to_string();
        let records = vec![squat, set(1, dec!(60), 8, None, 0), set(2, dec!(60), 8, None, 0)];

        let histories = aggregate_all(&records);
        assert_eq!(histories.len(), 2);
        assert_eq!(histories[0].exercise, "Bench Press (Barbell)");
        assert_eq!(histories[0].sessions.len(), 2);
        assert_eq!(histories[1].sessions.len(), 1);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_peak_rpe_never_below_final(
            rpes in proptest::collection::vec(proptest::option::of(0u32..=20u32), 1..8)
        ) {
            let records: Vec<SetRecord> = rpes
                .iter()
                .enumerate()
                .map(|(i, half)| set(1, dec!(50), 8, half.map(|h| Decimal::from(h) / dec!(2)), i as u32))
                .collect();

            let session = &aggregate(&records)[0];
            if let (Some(peak), Some(last)) = (session.peak_rpe, session.final_rpe) {
                prop_assert!(peak >= last);
                prop_assert!(last >= Decimal::ZERO);
            }
        }
    }
}
