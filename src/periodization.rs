//! Periodization Aggregator
//!
//! Program-level rollup of every exercise's progression record.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::progression::ProgressionRecord;

/// Trend (%) beyond which an exercise counts as moving
const TREND_THRESHOLD_PCT: Decimal = dec!(2);

/// Single-session mean RPE that marks a decline as deliberate
const SMART_SESSION_RPE: Decimal = dec!(9.5);

/// Mean RPE over the recent sessions that marks a decline as deliberate
const SMART_AVERAGE_RPE: Decimal = dec!(9.0);

/// Sessions inspected for the smart-adjustment check
const SMART_WINDOW: usize = 3;

/// An exercise stuck at the same weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateauedExercise {
    pub name: String,
    pub sessions_stagnant: usize,
}

/// An exercise whose weight moved over the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingExercise {
    pub name: String,
    pub change_pct: Decimal,
}

/// Overall program assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramStatus {
    MajorPlateau,
    ModeratePlateau,
    ProgressingWell,
    MixedProgress,
}

impl ProgramStatus {
    pub fn recommendation(&self) -> &'static str {
        match self {
            ProgramStatus::MajorPlateau => "Consider a deload week or program change",
            ProgramStatus::ModeratePlateau => "Review programming and consider technique focus",
            ProgramStatus::ProgressingWell => "Keep current program, great momentum!",
            ProgramStatus::MixedProgress => "Fine-tune weights and recovery",
        }
    }
}

impl fmt::Display for ProgramStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProgramStatus::MajorPlateau => "Major Plateau",
            ProgramStatus::ModeratePlateau => "Moderate Plateau",
            ProgramStatus::ProgressingWell => "Progressing Well",
            ProgramStatus::MixedProgress => "Mixed Progress",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodizationSummary {
    pub plateaued: Vec<PlateauedExercise>,
    pub progressing: Vec<TrendingExercise>,
    /// Declines explained by very high effort
    pub smart_adjustments: Vec<TrendingExercise>,
    pub regressing: Vec<TrendingExercise>,
    pub deload_candidates: Vec<String>,
    pub plateau_percentage: Decimal,
    pub status: ProgramStatus,
    pub total_exercises: usize,
}

/// Whether a decline follows sessions hard enough to explain it
///
/// Either check alone is sufficient.
pub fn is_smart_adjustment(record: &ProgressionRecord) -> bool {
    let rpes: Vec<Decimal> = record
        .sessions
        .iter()
        .take(SMART_WINDOW)
        .filter_map(|s| s.mean_rpe)
        .collect();

    if rpes.is_empty() {
        return false;
    }

    let any_maximal = rpes.iter().any(|rpe| *rpe >= SMART_SESSION_RPE);
    let average = rpes.iter().sum::<Decimal>() / Decimal::from(rpes.len());

    any_maximal || average >= SMART_AVERAGE_RPE
}

/// Classify every exercise and derive the program status
pub fn summarize(records: &[ProgressionRecord]) -> PeriodizationSummary {
    let mut plateaued = Vec::new();
    let mut progressing = Vec::new();
    let mut smart_adjustments = Vec::new();
    let mut regressing = Vec::new();
    let mut deload_candidates = Vec::new();

    for record in records {
        let trending = || TrendingExercise {
            name: record.exercise.clone(),
            change_pct: record.trend_change_pct,
        };

        if record.is_stagnant {
            plateaued.push(PlateauedExercise {
                name: record.exercise.clone(),
                sessions_stagnant: record.sessions_count,
            });
            if record.sessions_count >= 3 {
                deload_candidates.push(record.exercise.clone());
            }
        } else if record.trend_change_pct > TREND_THRESHOLD_PCT {
            progressing.push(trending());
        } else if record.trend_change_pct < -TREND_THRESHOLD_PCT {
            if is_smart_adjustment(record) {
                smart_adjustments.push(trending());
            } else {
                regressing.push(trending());
            }
        }
    }

    let total_exercises = records.len();
    let plateau_percentage = if total_exercises > 0 {
        Decimal::from(plateaued.len()) / Decimal::from(total_exercises) * dec!(100)
    } else {
        Decimal::ZERO
    };

    let status = if plateau_percentage > dec!(50) {
        ProgramStatus::MajorPlateau
    } else if plateau_percentage > dec!(30) {
        ProgramStatus::ModeratePlateau
    } else if progressing.len() > plateaued.len() + regressing.len() {
        ProgramStatus::ProgressingWell
    } else {
        ProgramStatus::MixedProgress
    };

    info!(
        total = total_exercises,
        plateaued = plateaued.len(),
        progressing = progressing.len(),
        smart = smart_adjustments.len(),
        regressing = regressing.len(),
        status = %status,
        "Periodization summary"
    );

    PeriodizationSummary {
        plateaued,
        progressing,
        smart_adjustments,
        regressing,
        deload_candidates,
        plateau_percentage,
        status,
        total_exercises,
    }
}
