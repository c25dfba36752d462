//! Progression Tracker
//!
//! Short-window trend per exercise: how the working weight and volume moved
//! between the last two sessions and across the last four.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{ExerciseHistory, SessionSummary};

/// Sessions kept in the progression window
pub const PROGRESSION_WINDOW: usize = 4;

/// Sessions compared for stagnation
pub const STAGNATION_WINDOW: usize = 3;

/// Trend of one exercise over its most recent sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionRecord {
    pub exercise: String,

    /// Up to four sessions, newest first
    pub sessions: Vec<SessionSummary>,

    /// Newest mean weight minus the previous session's
    pub weight_change: Decimal,
    pub weight_change_pct: Decimal,

    /// Newest total volume minus the previous session's
    pub volume_change: Decimal,
    pub volume_change_pct: Decimal,

    /// Change from the oldest to the newest session in the window
    pub trend_change_pct: Decimal,

    /// The three newest mean weights are identical
    pub is_stagnant: bool,

    pub sessions_count: usize,

    /// How far (%) the newest mean weight sits below the best in the whole history
    pub peak_performance_gap: Decimal,
}

impl ProgressionRecord {
    pub fn latest(&self) -> Option<&SessionSummary> {
        self.sessions.first()
    }
}

/// Percentage change relative to `base`, 0 when the base is not positive
pub fn percent_change(delta: Decimal, base: Decimal) -> Decimal {
    if base > Decimal::ZERO {
        delta / base * dec!(100)
    } else {
        Decimal::ZERO
    }
}

/// Build the progression record for one exercise
///
/// Returns `None` with fewer than two sessions; that is not an error.
pub fn track(history: &ExerciseHistory) -> Option<ProgressionRecord> {
    let window = history.recent(PROGRESSION_WINDOW);
    if window.len() < 2 {
        debug!(
            exercise = %history.exercise,
            sessions = window.len(),
            "Not enough sessions for progression"
        );
        return None;
    }

    let latest = &window[0];
    let previous = &window[1];

    let weight_change = latest.mean_weight - previous.mean_weight;
    let weight_change_pct = percent_change(weight_change, previous.mean_weight);
    let volume_change = latest.total_volume - previous.total_volume;
    let volume_change_pct = percent_change(volume_change, previous.total_volume);

    let trend_change_pct = if window.len() >= 3 {
        let oldest = &window[window.len() - 1];
        percent_change(latest.mean_weight - oldest.mean_weight, oldest.mean_weight)
    } else {
        weight_change_pct
    };

    let is_stagnant = window.len() >= STAGNATION_WINDOW
        && window[..STAGNATION_WINDOW]
            .iter()
            .all(|s| s.mean_weight == latest.mean_weight);

    let best = history
        .sessions
        .iter()
        .map(|s| s.mean_weight)
        .max()
        .unwrap_or(Decimal::ZERO);
    let peak_performance_gap = if best > latest.mean_weight {
        percent_change(best - latest.mean_weight, best)
    } else {
        Decimal::ZERO
    };

    Some(ProgressionRecord {
        exercise: history.exercise.clone(),
        sessions: window.to_vec(),
        weight_change,
        weight_change_pct,
        volume_change,
        volume_change_pct,
        trend_change_pct,
        is_stagnant,
        sessions_count: window.len(),
        peak_performance_gap,
    })
}

/// Progression records for every exercise with enough history
pub fn track_all(histories: &[ExerciseHistory]) -> Vec<ProgressionRecord> {
    histories.iter().filter_map(track).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    /// Build a history from mean weights listed newest first
    fn history(weights: &[Decimal]) -> ExerciseHistory {
        let newest = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
        let sessions = weights
            .iter()
            .enumerate()
            .map(|(i, w)| SessionSummary {
                exercise: "Bench Press (Barbell)".to_string(),
                date: newest - Duration::days(3 * i as i64),
                mean_weight: *w,
                mean_reps: dec!(8),
                mean_rpe: None,
                peak_rpe: None,
                final_rpe: None,
                total_volume: *w * dec!(24),
                set_count: 3,
                set_weights: vec![*w; 3],
            })
            .collect();
        ExerciseHistory {
            exercise: "Bench Press (Barbell)".to_string(),
            sessions,
        }
    }

    #[test]
    fn test_single_session_is_omitted() {
        assert!(track(&history(&[dec!(60)])).is_none());
        assert!(track(&history(&[])).is_none());
    }

    #[test]
    fn test_two_sessions_trend_equals_weight_change() {
        let record = track(&history(&[dec!(66), dec!(60)])).unwrap();
        assert_eq!(record.weight_change, dec!(6));
        assert_eq!(record.weight_change_pct, dec!(10));
        assert_eq!(record.trend_change_pct, record.weight_change_pct);
        assert!(!record.is_stagnant);
    }

    #[test]
    fn test_window_is_capped_at_four() {
        let record = track(&history(&[dec!(70), dec!(65), dec!(60), dec!(55), dec!(50)])).unwrap();
        assert_eq!(record.sessions_count, 4);
        // Oldest in window is 55, not 50
        assert_eq!(record.trend_change_pct.round_dp(2), dec!(27.27));
    }

    #[test]
    fn test_stagnation_needs_three_equal_weights() {
        assert!(track(&history(&[dec!(60), dec!(60), dec!(60)])).unwrap().is_stagnant);
        assert!(!track(&history(&[dec!(60), dec!(60)])).unwrap().is_stagnant);
        assert!(!track(&history(&[dec!(60), dec!(60), dec!(62.5)])).unwrap().is_stagnant);
        // Only the newest three count
        assert!(track(&history(&[dec!(60), dec!(60), dec!(60), dec!(50)])).unwrap().is_stagnant);
    }

    #[test]
    fn test_zero_baseline_percentages() {
        let record = track(&history(&[dec!(10), Decimal::ZERO])).unwrap();
        assert_eq!(record.weight_change, dec!(10));
        assert_eq!(record.weight_change_pct, Decimal::ZERO);
        assert_eq!(record.volume_change_pct, Decimal::ZERO);
    }

    #[test]
    fn test_volume_change() {
        let record = track(&history(&[dec!(62.5), dec!(60)])).unwrap();
        assert_eq!(record.volume_change, dec!(60));
        assert_eq!(record.volume_change_pct.round_dp(2), dec!(4.17));
    }

    #[test]
    fn test_peak_performance_gap_uses_full_history() {
        let record = track(&history(&[dec!(90), dec!(90), dec!(95), dec!(95), dec!(100)])).unwrap();
        assert_eq!(record.peak_performance_gap, dec!(10));

        let at_peak = track(&history(&[dec!(100), dec!(90)])).unwrap();
        assert_eq!(at_peak.peak_performance_gap, Decimal::ZERO);
    }

    #[test]
    fn test_track_all_skips_short_histories() {
        let mut short = history(&[dec!(40)]);
        short.exercise = "Leg Curl (Machine)".to_string();
        let records = track_all(&[history(&[dec!(62.5), dec!(60)]), short]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].exercise, "Bench Press (Barbell)");
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_changing_one_weight_breaks_stagnation(
            base in 1u32..200u32,
            position in 0usize..3,
            bump in 1u32..20u32,
        ) {
            let w = Decimal::from(base);
            let mut weights = vec![w, w, w];
            prop_assert!(track(&history(&weights)).unwrap().is_stagnant);

            weights[position] += Decimal::from(bump) / dec!(2);
            prop_assert!(!track(&history(&weights)).unwrap().is_stagnant);
        }
    }
}
