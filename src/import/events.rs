use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::error::{InputError, Result};
use crate::import::ImportFormat;
use crate::models::SetRecord;

/// Event type of a finalized workout
const UPDATED_EVENT: &str = "updated";

/// Set type of a working set (as opposed to warmup, dropset, failure)
const NORMAL_SET: &str = "normal";

/// A saved event file is either the bare event array or an API page
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EventFile {
    List(Vec<RawEvent>),
    Page { events: Vec<RawEvent> },
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    workout: Option<RawWorkout>,
}

#[derive(Debug, Deserialize)]
struct RawWorkout {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    exercises: Vec<RawExercise>,
}

#[derive(Debug, Deserialize)]
struct RawExercise {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    sets: Vec<RawSet>,
}

#[derive(Debug, Deserialize)]
struct RawSet {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    weight_kg: Option<f64>,
    #[serde(default)]
    reps: Option<u32>,
    #[serde(default)]
    rpe: Option<f64>,
}

/// Importer for Hevy workout-event JSON, as saved by `liftcoach fetch`
pub struct HevyEventImporter;

impl HevyEventImporter {
    pub fn new() -> Self {
        HevyEventImporter
    }

    /// Flatten an event document into working sets
    pub fn parse_str(&self, content: &str, source: &Path) -> Result<Vec<SetRecord>> {
        let file: EventFile =
            serde_json::from_str(content).map_err(|e| InputError::Malformed {
                path: source.to_path_buf(),
                reason: e.to_string(),
            })?;

        let events = match file {
            EventFile::List(events) | EventFile::Page { events } => events,
        };
        let event_count = events.len();

        let mut records = Vec::new();
        for event in events {
            if event.kind != UPDATED_EVENT {
                continue;
            }
            let Some(workout) = event.workout else {
                continue;
            };

            let title = workout
                .title
                .unwrap_or_else(|| "Untitled Workout".to_string());
            let date = parse_workout_date(workout.start_time.as_deref(), &title)?;

            for exercise in workout.exercises {
                let exercise_title = exercise
                    .title
                    .unwrap_or_else(|| "Unknown Exercise".to_string());

                for raw_set in exercise.sets {
                    if raw_set.kind.as_deref() != Some(NORMAL_SET) {
                        continue;
                    }
                    records.push(to_record(raw_set, date, &title, &exercise_title, source)?);
                }
            }
        }

        debug!(sets = records.len(), events = event_count, "Converted workout events");
        Ok(records)
    }
}

impl Default for HevyEventImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for HevyEventImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<SetRecord>> {
        let content = std::fs::read_to_string(file_path)?;
        self.parse_str(&content, file_path)
    }

    fn get_format_name(&self) -> &'static str {
        "Hevy events"
    }
}

/// Calendar date of a workout start time, in the offset it was logged with
fn parse_workout_date(start_time: Option<&str>, workout: &str) -> Result<NaiveDate> {
    let invalid = |value: &str| InputError::InvalidStartTime {
        workout: workout.to_string(),
        value: value.to_string(),
    };

    let value = start_time.ok_or_else(|| invalid("<missing>"))?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }

    let formats = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];
    for format in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.date());
        }
    }

    Err(invalid(value).into())
}

fn to_record(
    raw: RawSet,
    date: NaiveDate,
    workout: &str,
    exercise: &str,
    source: &Path,
) -> Result<SetRecord> {
    let malformed = |reason: String| InputError::Malformed {
        path: source.to_path_buf(),
        reason,
    };

    let weight = match raw.weight_kg {
        Some(kg) if kg < 0.0 => {
            return Err(malformed(format!("negative weight {} for {}", kg, exercise)).into())
        }
        Some(kg) => Decimal::from_f64(kg)
            .ok_or_else(|| malformed(format!("unrepresentable weight for {}", exercise)))?
            .normalize(),
        None => Decimal::ZERO,
    };

    let rpe = match raw.rpe {
        Some(value) if !(0.0..=10.0).contains(&value) => {
            return Err(malformed(format!("RPE {} outside 0-10 for {}", value, exercise)).into())
        }
        Some(value) => Some(
            Decimal::from_f64(value)
                .ok_or_else(|| malformed(format!("unrepresentable RPE for {}", exercise)))?
                .normalize(),
        ),
        None => None,
    };

    Ok(SetRecord {
        date,
        workout: workout.to_string(),
        exercise: exercise.to_string(),
        weight,
        reps: raw.reps.unwrap_or(0),
        rpe,
        set_index: raw.index.unwrap_or(0),
    })
}
