use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One performed working set, as normalized from the workout log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    /// Calendar day the set was performed on
    pub date: NaiveDate,

    /// Title of the workout the set belongs to
    pub workout: String,

    /// Exercise name as logged
    pub exercise: String,

    /// Load in kilograms (0 for bodyweight or duration-only sets)
    pub weight: Decimal,

    /// Repetitions completed
    pub reps: u32,

    /// Rate of Perceived Exertion (0-10), absent when not recorded
    pub rpe: Option<Decimal>,

    /// Ordinal of the set within the exercise for that session
    pub set_index: u32,
}

impl SetRecord {
    /// Volume contributed by this set (weight × reps)
    pub fn volume(&self) -> Decimal {
        self.weight * Decimal::from(self.reps)
    }
}

/// Aggregate of one exercise on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Exercise name
    pub exercise: String,

    /// Session date
    pub date: NaiveDate,

    /// Arithmetic mean of set weights
    pub mean_weight: Decimal,

    /// Arithmetic mean of set reps
    pub mean_reps: Decimal,

    /// Mean of the recorded RPEs (sets without RPE are ignored)
    pub mean_rpe: Option<Decimal>,

    /// Highest recorded RPE in the session
    pub peak_rpe: Option<Decimal>,

    /// RPE of the last performed set
    pub final_rpe: Option<Decimal>,

    /// Σ weight × reps over all sets
    pub total_volume: Decimal,

    /// Number of working sets
    pub set_count: u32,

    /// Per-set weights in set order, used to infer plate increments
    pub set_weights: Vec<Decimal>,
}

/// Target repetition range for an exercise
///
/// Serialized as a two-element `[min, max]` array so the config table reads
/// the same way the rep-rule tables are usually written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct RepRange {
    pub min_reps: u32,
    pub max_reps: u32,
}

impl RepRange {
    pub fn new(min_reps: u32, max_reps: u32) -> Self {
        RepRange { min_reps, max_reps }
    }

    /// Compare a (possibly fractional) mean rep count to the range
    pub fn position(&self, mean_reps: Decimal) -> RangePosition {
        if mean_reps < Decimal::from(self.min_reps) {
            RangePosition::Below
        } else if mean_reps > Decimal::from(self.max_reps) {
            RangePosition::Above
        } else {
            RangePosition::Within
        }
    }
}

impl From<(u32, u32)> for RepRange {
    fn from((min_reps, max_reps): (u32, u32)) -> Self {
        RepRange { min_reps, max_reps }
    }
}

impl From<RepRange> for (u32, u32) {
    fn from(range: RepRange) -> Self {
        (range.min_reps, range.max_reps)
    }
}

impl std::fmt::Display for RepRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min_reps, self.max_reps)
    }
}

/// Where a mean rep count falls relative to a [`RepRange`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePosition {
    Below,
    Within,
    Above,
}

/// All sessions of one exercise, newest first
///
/// Built once per report run and shared by every downstream stage so the
/// per-date aggregation is never repeated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseHistory {
    pub exercise: String,
    pub sessions: Vec<SessionSummary>,
}

impl ExerciseHistory {
    /// Most recent session, if any
    pub fn latest(&self) -> Option<&SessionSummary> {
        self.sessions.first()
    }

    /// The `n` most recent sessions (fewer if the history is shorter)
    pub fn recent(&self, n: usize) -> &[SessionSummary] {
        &self.sessions[..self.sessions.len().min(n)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_set_volume() {
        let set = SetRecord {
            date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            workout: "Push".to_string(),
            exercise: "Bench Press (Barbell)".to_string(),
            weight: dec!(62.5),
            reps: 8,
            rpe: None,
            set_index: 0,
        };
        assert_eq!(set.volume(), dec!(500));
    }

    #[test]
    fn test_rep_range_position() {
        let range = RepRange::new(6, 10);
        assert_eq!(range.position(dec!(5.5)), RangePosition::Below);
        assert_eq!(range.position(dec!(6)), RangePosition::Within);
        assert_eq!(range.position(dec!(10)), RangePosition::Within);
        assert_eq!(range.position(dec!(10.3)), RangePosition::Above);
    }

    #[test]
    fn test_rep_range_serializes_as_pair() {
        let json = serde_json::to_string(&RepRange::new(8, 12)).unwrap();
        assert_eq!(json, "[8,12]");
        let parsed: RepRange = serde_json::from_str("[6,10]").unwrap();
        assert_eq!(parsed, RepRange::new(6, 10));
    }
}
