//! Session quality grade for the most recent workout day

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::models::ExerciseHistory;
use crate::progression::ProgressionRecord;

/// Score used when a component has nothing to average
const NEUTRAL_SCORE: Decimal = dec!(70);

const RPE_WEIGHT: Decimal = dec!(0.4);
const PROGRESSION_WEIGHT: Decimal = dec!(0.6);

/// Letter grade for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
}

impl Grade {
    pub fn from_score(score: Decimal) -> Self {
        if score >= dec!(90) {
            Grade::APlus
        } else if score >= dec!(85) {
            Grade::A
        } else if score >= dec!(80) {
            Grade::BPlus
        } else if score >= dec!(75) {
            Grade::B
        } else if score >= dec!(70) {
            Grade::CPlus
        } else if score >= dec!(65) {
            Grade::C
        } else {
            Grade::D
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Grade::APlus => "Excellent session! Great progression and intensity balance.",
            Grade::A => "Great session with solid progression.",
            Grade::BPlus => "Good session, minor room for improvement.",
            Grade::B => "Decent session, consider adjusting intensity.",
            Grade::CPlus => "Average session, focus on progression.",
            Grade::C => "Below average, review your training approach.",
            Grade::D => "Poor session, consider deload or technique focus.",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionQuality {
    pub date: NaiveDate,
    pub overall_score: Decimal,
    pub grade: Grade,
    pub avg_rpe_score: Decimal,
    pub avg_progression_score: Decimal,
    pub progressed: usize,
    pub maintained: usize,
    pub regressed: usize,
    pub total_exercises: usize,
}

/// Score a session's mean RPE; 7.5-9.0 is ideal
pub fn rpe_score(rpe: Decimal) -> Decimal {
    if rpe >= dec!(7.5) && rpe <= dec!(9.0) {
        dec!(100)
    } else if (rpe >= dec!(7.0) && rpe < dec!(7.5)) || (rpe > dec!(9.0) && rpe <= dec!(9.5)) {
        dec!(85)
    } else if rpe >= dec!(6.5) && rpe < dec!(7.0) {
        dec!(70)
    } else if rpe > dec!(9.5) && rpe <= dec!(10) {
        dec!(60)
    } else {
        dec!(40)
    }
}

fn average(scores: &[Decimal]) -> Decimal {
    if scores.is_empty() {
        NEUTRAL_SCORE
    } else {
        scores.iter().sum::<Decimal>() / Decimal::from(scores.len())
    }
}

/// Grade the most recent training day across all exercises
///
/// Returns `None` when there are no sessions at all.
pub fn assess(
    histories: &[ExerciseHistory],
    progressions: &[ProgressionRecord],
) -> Option<SessionQuality> {
    let date = histories.iter().filter_map(|h| h.latest()).map(|s| s.date).max()?;

    let by_name: HashMap<&str, &ProgressionRecord> = progressions
        .iter()
        .map(|p| (p.exercise.as_str(), p))
        .collect();

    let mut rpe_scores = Vec::new();
    let mut progression_scores = Vec::new();
    let (mut progressed, mut maintained, mut regressed) = (0, 0, 0);
    let mut total_exercises = 0;

    for session in histories.iter().filter_map(|h| h.latest()).filter(|s| s.date == date) {
        total_exercises += 1;

        if let Some(rpe) = session.mean_rpe {
            rpe_scores.push(rpe_score(rpe));
        }

        let score = match by_name.get(session.exercise.as_str()) {
            Some(p) if p.weight_change > Decimal::ZERO => {
                progressed += 1;
                dec!(100)
            }
            Some(p) if p.weight_change == Decimal::ZERO && p.is_stagnant => dec!(60),
            Some(p) if p.weight_change == Decimal::ZERO => {
                maintained += 1;
                dec!(80)
            }
            Some(_) => {
                regressed += 1;
                dec!(40)
            }
            None => NEUTRAL_SCORE,
        };
        progression_scores.push(score);
    }

    let avg_rpe_score = average(&rpe_scores);
    let avg_progression_score = average(&progression_scores);
    let overall_score = avg_rpe_score * RPE_WEIGHT + avg_progression_score * PROGRESSION_WEIGHT;

    Some(SessionQuality {
        date,
        overall_score,
        grade: Grade::from_score(overall_score),
        avg_rpe_score,
        avg_progression_score,
        progressed,
        maintained,
        regressed,
        total_exercises,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionSummary;
    use crate::progression;
    use chrono::Duration;

    fn history(name: &str, newest: NaiveDate, weights: &[Decimal], rpe: Option<Decimal>) -> ExerciseHistory {
        ExerciseHistory {
            exercise: name.to_string(),
            sessions: weights
                .iter()
                .enumerate()
                .map(|(i, w)| SessionSummary {
                    exercise: name.to_string(),
                    date: newest - Duration::days(7 * i as i64),
                    mean_weight: *w,
                    mean_reps: dec!(8),
                    mean_rpe: rpe,
                    peak_rpe: rpe,
                    final_rpe: rpe,
                    total_volume: *w * dec!(24),
                    set_count: 3,
                    set_weights: vec![*w; 3],
                })
                .collect(),
        }
    }

    #[test]
    fn test_rpe_score_bands() {
        assert_eq!(rpe_score(dec!(8)), dec!(100));
        assert_eq!(rpe_score(dec!(7.2)), dec!(85));
        assert_eq!(rpe_score(dec!(9.5)), dec!(85));
        assert_eq!(rpe_score(dec!(6.5)), dec!(70));
        assert_eq!(rpe_score(dec!(10)), dec!(60));
        assert_eq!(rpe_score(dec!(5)), dec!(40));
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(Grade::from_score(dec!(90)), Grade::APlus);
        assert_eq!(Grade::from_score(dec!(89.9)), Grade::A);
        assert_eq!(Grade::from_score(dec!(70)), Grade::CPlus);
        assert_eq!(Grade::from_score(dec!(64.9)), Grade::D);
        assert_eq!(Grade::APlus.to_string(), "A+");
    }

    #[test]
    fn test_no_history_has_no_grade() {
        assert!(assess(&[], &[]).is_none());
    }

    #[test]
    fn test_only_latest_day_is_scored() {
        let today = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
        let histories = vec![
            history("Bench Press (Barbell)", today, &[dec!(62.5), dec!(60)], Some(dec!(8))),
            history("Squat (Barbell)", today - Duration::days(2), &[dec!(100), dec!(110)], Some(dec!(10))),
        ];
        let progressions = progression::track_all(&histories);

        let quality = assess(&histories, &progressions).unwrap();
        assert_eq!(quality.date, today);
        assert_eq!(quality.total_exercises, 1);
        assert_eq!(quality.progressed, 1);
        assert_eq!(quality.overall_score, dec!(100));
        assert_eq!(quality.grade, Grade::APlus);
    }

    #[test]
    fn test_mixed_session_score() {
        let today = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
        let histories = vec![
            // Stagnant, no RPE
            history("Leg Press (Machine)", today, &[dec!(100), dec!(100), dec!(100)], None),
            // Regressed at RPE 10
            history("Squat (Barbell)", today, &[dec!(100), dec!(110)], Some(dec!(10))),
            // First time, no progression data
            history("Hip Abduction (Machine)", today, &[dec!(40)], None),
        ];
        let progressions = progression::track_all(&histories);
        let quality = assess(&histories, &progressions).unwrap();

        assert_eq!(quality.avg_rpe_score, dec!(60));
        // (60 + 40 + 70) / 3
        assert_eq!(quality.avg_progression_score.round_dp(2), dec!(56.67));
        assert_eq!(quality.regressed, 1);
        assert_eq!(quality.maintained, 0);
        assert_eq!(quality.overall_score.round_dp(1), dec!(58.0));
        assert_eq!(quality.grade, Grade::D);
    }
}
