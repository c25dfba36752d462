//! Volume and recovery insights, plus the training overview
//!
//! Both work directly on the normalized set records rather than on the
//! per-exercise histories, since they look across exercises.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::config::contains_any;
use crate::models::SetRecord;
use crate::progression::percent_change;

/// Exercises listed in each overview ranking
const TOP_EXERCISES: usize = 5;

/// Total volume of one ISO week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyVolume {
    pub iso_year: i32,
    pub week: u32,
    pub volume: Decimal,
}

/// Week-over-week volume direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTrend {
    Stable,
    IncreasingModerately,
    IncreasingRapidly,
    DecreasingModerately,
    DecreasingRapidly,
}

impl VolumeTrend {
    pub fn from_change_pct(pct: Decimal) -> Self {
        if pct > dec!(10) {
            VolumeTrend::IncreasingRapidly
        } else if pct > dec!(5) {
            VolumeTrend::IncreasingModerately
        } else if pct < dec!(-10) {
            VolumeTrend::DecreasingRapidly
        } else if pct < dec!(-5) {
            VolumeTrend::DecreasingModerately
        } else {
            VolumeTrend::Stable
        }
    }
}

impl fmt::Display for VolumeTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VolumeTrend::Stable => "stable",
            VolumeTrend::IncreasingModerately => "increasing moderately",
            VolumeTrend::IncreasingRapidly => "increasing rapidly",
            VolumeTrend::DecreasingModerately => "decreasing moderately",
            VolumeTrend::DecreasingRapidly => "decreasing rapidly",
        };
        write!(f, "{}", s)
    }
}

/// Recovery classification from days since the last workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStatus {
    HighFrequency,
    GoodFrequency,
    OptimalRecovery,
    ExtendedRest,
    LongBreak,
    InsufficientData,
}

impl RecoveryStatus {
    pub fn from_days_since_last(days: i64) -> Self {
        match days {
            d if d <= 1 => RecoveryStatus::HighFrequency,
            2 => RecoveryStatus::GoodFrequency,
            3..=4 => RecoveryStatus::OptimalRecovery,
            5..=7 => RecoveryStatus::ExtendedRest,
            _ => RecoveryStatus::LongBreak,
        }
    }
}

impl fmt::Display for RecoveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecoveryStatus::HighFrequency => "High frequency",
            RecoveryStatus::GoodFrequency => "Good frequency",
            RecoveryStatus::OptimalRecovery => "Optimal recovery",
            RecoveryStatus::ExtendedRest => "Extended rest",
            RecoveryStatus::LongBreak => "Long break",
            RecoveryStatus::InsufficientData => "Insufficient data",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRecovery {
    pub weekly_volume: Vec<WeeklyVolume>,
    pub volume_trend: VolumeTrend,
    /// Last week against the one before
    pub volume_change_pct: Decimal,
    pub days_since_last: i64,
    pub rest_between_last: i64,
    pub avg_rest_days: Decimal,
    pub recovery_status: RecoveryStatus,
    /// Muscle group → volume; an exercise may count toward several groups
    pub muscle_volume: BTreeMap<String, Decimal>,
    pub workout_days: usize,
}

/// Weekly volume trend, rest pattern and muscle-group split
pub fn volume_recovery(
    records: &[SetRecord],
    muscle_groups: &BTreeMap<String, Vec<String>>,
    today: NaiveDate,
) -> Option<VolumeRecovery> {
    if records.is_empty() {
        return None;
    }

    let mut weeks: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for record in records {
        let iso = record.date.iso_week();
        *weeks.entry((iso.year(), iso.week())).or_default() += record.volume();
    }
    let weekly_volume: Vec<WeeklyVolume> = weeks
        .into_iter()
        .map(|((iso_year, week), volume)| WeeklyVolume { iso_year, week, volume })
        .collect();

    let volume_change_pct = match weekly_volume.as_slice() {
        [.., previous, current] => percent_change(current.volume - previous.volume, previous.volume),
        _ => Decimal::ZERO,
    };

    let dates: Vec<NaiveDate> = records
        .iter()
        .map(|r| r.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let (days_since_last, rest_between_last, avg_rest_days, recovery_status) = match dates.as_slice() {
        [.., previous, last] => {
            let gaps: Vec<i64> = dates.windows(2).map(|w| (w[1] - w[0]).num_days()).collect();
            let avg = Decimal::from(gaps.iter().sum::<i64>()) / Decimal::from(gaps.len());
            let since = (today - *last).num_days();
            (
                since,
                (*last - *previous).num_days(),
                avg,
                RecoveryStatus::from_days_since_last(since),
            )
        }
        _ => (0, 0, Decimal::ZERO, RecoveryStatus::InsufficientData),
    };

    let muscle_volume = muscle_groups
        .iter()
        .filter_map(|(group, keywords)| {
            let matching: Vec<&SetRecord> = records
                .iter()
                .filter(|r| contains_any(&r.exercise, keywords))
                .collect();
            if matching.is_empty() {
                None
            } else {
                Some((group.clone(), matching.iter().map(|r| r.volume()).sum()))
            }
        })
        .collect();

    Some(VolumeRecovery {
        volume_trend: VolumeTrend::from_change_pct(volume_change_pct),
        weekly_volume,
        volume_change_pct,
        days_since_last,
        rest_between_last,
        avg_rest_days,
        recovery_status,
        muscle_volume,
        workout_days: dates.len(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseTotals {
    pub exercise: String,
    pub sessions: usize,
    pub total_sets: usize,
    pub total_volume: Decimal,
}

/// Headline numbers for the analysis window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOverview {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Distinct (date, workout title) pairs
    pub total_workouts: usize,
    pub total_exercises: usize,
    pub total_sets: usize,
    pub total_volume: Decimal,
    pub top_by_frequency: Vec<ExerciseTotals>,
    pub top_by_volume: Vec<ExerciseTotals>,
}

pub fn overview(records: &[SetRecord]) -> Option<TrainingOverview> {
    let first_date = records.iter().map(|r| r.date).min()?;
    let last_date = records.iter().map(|r| r.date).max()?;

    let workouts: BTreeSet<(NaiveDate, &str)> =
        records.iter().map(|r| (r.date, r.workout.as_str())).collect();

    let mut per_exercise: HashMap<&str, (BTreeSet<NaiveDate>, usize, Decimal)> = HashMap::new();
    for record in records {
        let entry = per_exercise.entry(record.exercise.as_str()).or_default();
        entry.0.insert(record.date);
        entry.1 += 1;
        entry.2 += record.volume();
    }

    let mut totals: Vec<ExerciseTotals> = per_exercise
        .into_iter()
        .map(|(exercise, (dates, sets, volume))| ExerciseTotals {
            exercise: exercise.to_string(),
            sessions: dates.len(),
            total_sets: sets,
            total_volume: volume,
        })
        .collect();
    totals.sort_by(|a, b| a.exercise.cmp(&b.exercise));

    let mut top_by_frequency = totals.clone();
    top_by_frequency.sort_by(|a, b| b.sessions.cmp(&a.sessions));
    top_by_frequency.truncate(TOP_EXERCISES);

    let mut top_by_volume = totals.clone();
    top_by_volume.sort_by(|a, b| b.total_volume.cmp(&a.total_volume));
    top_by_volume.truncate(TOP_EXERCISES);

    Some(TrainingOverview {
        first_date,
        last_date,
        total_workouts: workouts.len(),
        total_exercises: totals.len(),
        total_sets: records.len(),
        total_volume: records.iter().map(|r| r.volume()).sum(),
        top_by_frequency,
        top_by_volume,
    })
}
