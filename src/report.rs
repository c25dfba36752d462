//! Report assembly
//!
//! Runs every analysis stage over a normalized log and collects the results
//! into one serializable [`CoachingReport`]. Rendering is left to `export`.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

use crate::audit::{DecisionAuditor, ExerciseAudit};
use crate::config::{AppConfig, CoachingConfig};
use crate::import::{ExclusionSummary, NormalizedLog};
use crate::models::{ExerciseHistory, RepRange, SessionSummary, SetRecord};
use crate::periodization::{self, PeriodizationSummary};
use crate::progression::{self, ProgressionRecord};
use crate::quality::{self, SessionQuality};
use crate::routine::{self, NextWorkout};
use crate::session;
use crate::verdict::{Verdict, VerdictEngine};
use crate::volume::{self, TrainingOverview, VolumeRecovery};

/// Everything known about one exercise
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseReport {
    pub exercise: String,
    pub rep_range: Option<RepRange>,
    pub assisted: bool,
    /// Most recent session
    pub latest: SessionSummary,
    /// Verdict for the most recent session
    pub verdict: Verdict,
    pub progression: Option<ProgressionRecord>,
    pub audit: Option<ExerciseAudit>,
}

/// One exercise of the last workout, with its individual sets
#[derive(Debug, Clone, Serialize)]
pub struct LastWorkoutExercise {
    pub exercise: String,
    pub sets: Vec<SetRecord>,
    pub summary: SessionSummary,
    pub rep_range: Option<RepRange>,
    pub verdict: Verdict,
}

/// Detail of the single most recent training day
#[derive(Debug, Clone, Serialize)]
pub struct LastWorkout {
    pub date: NaiveDate,
    pub title: String,
    pub total_sets: usize,
    /// Heaviest total volume first
    pub exercises: Vec<LastWorkoutExercise>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoachingReport {
    pub reference_date: NaiveDate,
    pub retention_days: u32,
    pub total_sets: usize,
    pub exclusions: ExclusionSummary,

    /// Sorted by exercise name
    pub exercises: Vec<ExerciseReport>,

    pub periodization: PeriodizationSummary,
    pub session_quality: Option<SessionQuality>,
    pub volume_recovery: Option<VolumeRecovery>,
    pub overview: Option<TrainingOverview>,
    pub last_workout: Option<LastWorkout>,
    pub next_workout: Option<NextWorkout>,
}

impl CoachingReport {
    /// Run the full analysis pipeline
    pub fn build(log: &NormalizedLog, config: &AppConfig, today: NaiveDate) -> Self {
        let started = Instant::now();
        let coaching = &config.coaching;

        let histories = session::aggregate_all(&log.records);
        debug!(exercises = histories.len(), "Aggregated sessions");

        let engine = VerdictEngine::with_config(coaching);
        let auditor = DecisionAuditor::with_config(coaching);

        let exercises: Vec<ExerciseReport> = histories
            .par_iter()
            .filter_map(|history| analyze_exercise(history, coaching, &engine, &auditor))
            .collect();

        let progressions: Vec<ProgressionRecord> = exercises
            .iter()
            .filter_map(|e| e.progression.clone())
            .collect();

        let periodization = periodization::summarize(&progressions);
        let session_quality = quality::assess(&histories, &progressions);
        let volume_recovery = volume::volume_recovery(&log.records, &coaching.muscle_groups, today);
        let overview = volume::overview(&log.records);
        let last_workout = last_workout(&log.records, &exercises);
        let next_workout = routine::predict_next(&log.records, &config.routine);

        info!(
            exercises = exercises.len(),
            progressions = progressions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built coaching report"
        );

        CoachingReport {
            reference_date: today,
            retention_days: coaching.retention_days,
            total_sets: log.records.len(),
            exclusions: log.exclusions.clone(),
            exercises,
            periodization,
            session_quality,
            volume_recovery,
            overview,
            last_workout,
            next_workout,
        }
    }

    pub fn exercise(&self, name: &str) -> Option<&ExerciseReport> {
        self.exercises.iter().find(|e| e.exercise == name)
    }

    /// Exercises that have a progression record
    pub fn progressions(&self) -> impl Iterator<Item = &ProgressionRecord> {
        self.exercises.iter().filter_map(|e| e.progression.as_ref())
    }

    /// Exercises that were audited
    pub fn audits(&self) -> impl Iterator<Item = &ExerciseAudit> {
        self.exercises.iter().filter_map(|e| e.audit.as_ref())
    }
}

fn analyze_exercise(
    history: &ExerciseHistory,
    config: &CoachingConfig,
    engine: &VerdictEngine,
    auditor: &DecisionAuditor,
) -> Option<ExerciseReport> {
    let latest = history.latest()?.clone();
    let rep_range = config.rep_range(&history.exercise);
    let assisted = config.is_assisted(&history.exercise);

    Some(ExerciseReport {
        exercise: history.exercise.clone(),
        rep_range,
        assisted,
        verdict: engine.evaluate(&latest, rep_range, assisted),
        latest,
        progression: progression::track(history),
        audit: auditor.audit(history, config),
    })
}

fn last_workout(records: &[SetRecord], exercises: &[ExerciseReport]) -> Option<LastWorkout> {
    let date = records.iter().map(|r| r.date).max()?;
    let day: Vec<&SetRecord> = records.iter().filter(|r| r.date == date).collect();
    let title = day.first()?.workout.clone();

    let mut detail: Vec<LastWorkoutExercise> = exercises
        .iter()
        .filter(|e| e.latest.date == date)
        .map(|e| LastWorkoutExercise {
            exercise: e.exercise.clone(),
            sets: day
                .iter()
                .filter(|r| r.exercise == e.exercise)
                .map(|r| (*r).clone())
                .collect(),
            summary: e.latest.clone(),
            rep_range: e.rep_range,
            verdict: e.verdict.clone(),
        })
        .collect();
    detail.sort_by(|a, b| b.summary.total_volume.cmp(&a.summary.total_volume));

    Some(LastWorkout {
        date,
        title,
        total_sets: day.len(),
        exercises: detail,
    })
}
