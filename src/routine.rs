//! Next-workout prediction from the configured training cycle

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::config::RoutineConfig;
use crate::models::SetRecord;

/// How the last workout was placed in the cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum CycleMatch {
    /// The workout title is a mapped routine
    Title,
    /// Guessed from exercise names with the named keyword pattern
    ExercisePattern(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextWorkout {
    pub last_date: NaiveDate,
    pub last_workout: String,
    pub matched_by: CycleMatch,
    pub cycle_index: usize,
    pub name: String,
    pub is_rest_day: bool,
}

/// Predict the next cycle day from the most recent workout in the log
pub fn predict_next(records: &[SetRecord], routine: &RoutineConfig) -> Option<NextWorkout> {
    if routine.cycle_pattern.is_empty() {
        return None;
    }

    let last_date = records.iter().map(|r| r.date).max()?;
    let last_sets: Vec<&SetRecord> = records.iter().filter(|r| r.date == last_date).collect();
    let last_workout = last_sets.first()?.workout.clone();

    let (cycle_index, matched_by) = match routine.title_mapping.get(&last_workout) {
        Some(&index) if index < routine.cycle_pattern.len() => {
            ((index + 1) % routine.cycle_pattern.len(), CycleMatch::Title)
        }
        _ => {
            let exercises: BTreeSet<String> =
                last_sets.iter().map(|r| r.exercise.to_lowercase()).collect();
            let (pattern, next) = best_pattern(&exercises, routine)?;
            (next % routine.cycle_pattern.len(), CycleMatch::ExercisePattern(pattern))
        }
    };

    let name = routine.cycle_pattern[cycle_index].clone();
    debug!(last = %last_workout, next = %name, matched = ?matched_by, "Predicted next workout");

    Some(NextWorkout {
        last_date,
        last_workout,
        matched_by,
        cycle_index,
        is_rest_day: name.to_lowercase().contains("rest"),
        name,
    })
}

/// Pattern with the most keyword hits; ties keep the first by name
fn best_pattern(exercises: &BTreeSet<String>, routine: &RoutineConfig) -> Option<(String, usize)> {
    let mut best: Option<(&String, usize, usize)> = None;

    for (name, pattern) in &routine.exercise_patterns {
        let hits = exercises
            .iter()
            .map(|exercise| {
                pattern
                    .keywords
                    .iter()
                    .filter(|k| exercise.contains(&k.to_lowercase()))
                    .count()
            })
            .sum::<usize>();

        if hits > 0 && best.map_or(true, |(_, _, top)| hits > top) {
            best = Some((name, pattern.next_cycle_day, hits));
        }
    }

    if best.is_none() {
        warn!("Could not place the last workout in the training cycle");
    }
    best.map(|(name, next, _)| (name.clone(), next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn set(workout: &str, exercise: &str, day: u32) -> SetRecord {
        SetRecord {
            date: NaiveDate::from_ymd_opt(2024, 9, day).unwrap(),
            workout: workout.to_string(),
            exercise: exercise.to_string(),
            weight: dec!(50),
            reps: 10,
            rpe: None,
            set_index: 0,
        }
    }

    #[test]
    fn test_mapped_title_advances_cycle() {
        let routine = RoutineConfig::default_cycle();
        let records = vec![
            set("Day 4 - Lower (Quad)", "Squat (Barbell)", 20),
            set("Day 1 - Upper (Push)", "Bench Press (Barbell)", 23),
        ];
        let next = predict_next(&records, &routine).unwrap();
        assert_eq!(next.matched_by, CycleMatch::Title);
        assert_eq!(next.cycle_index, 1);
        assert_eq!(next.name, "Day 2 - Lower (Hamstring)");
        assert!(!next.is_rest_day);
    }

    #[test]
    fn test_cycle_wraps_around() {
        let mut routine = RoutineConfig::default_cycle();
        routine.title_mapping.insert("Sunday Stretch".to_string(), 5);
        let next = predict_next(&[set("Sunday Stretch", "Plank", 1)], &routine).unwrap();
        assert_eq!(next.cycle_index, 0);
    }

    #[test]
    fn test_unmapped_title_uses_exercise_keywords() {
        let routine = RoutineConfig::default_cycle();
        let records = vec![
            set("Morning Session", "Lat Pulldown (Machine)", 23),
            set("Morning Session", "Seated Cable Row - V Grip (Cable)", 23),
            set("Morning Session", "Bicep Curl (Dumbbell)", 23),
        ];
        let next = predict_next(&records, &routine).unwrap();
        assert_eq!(next.matched_by, CycleMatch::ExercisePattern("upper_pull".to_string()));
        assert_eq!(next.name, "Day 5 - Lower (Quad)");
    }

    #[test]
    fn test_rest_day_is_flagged() {
        let routine = RoutineConfig::default_cycle();
        let next = predict_next(&[set("Day 2 - Lower (Hamstring)", "Romanian Deadlift", 23)], &routine).unwrap();
        assert!(next.is_rest_day);
    }

    #[test]
    fn test_no_match_gives_none() {
        let routine = RoutineConfig::default_cycle();
        assert!(predict_next(&[set("Mystery", "Zercher Carry", 23)], &routine).is_none());
        assert!(predict_next(&[], &routine).is_none());
    }
}
