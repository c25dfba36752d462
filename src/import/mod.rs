//! Set Record Normalizer
//!
//! Turns a workout log file into the flat, sorted list of working sets the
//! decision engine consumes. Format-specific parsing lives in the submodules;
//! the retention window and non-strength exclusions are applied here so they
//! behave identically for every source format.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

use crate::config::{contains_any, CoachingConfig};
use crate::error::{CoachError, InputError, Result};
use crate::models::SetRecord;

pub mod csv;
pub mod events;

/// Trait for importing set records from different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Read every working set from the file, unfiltered
    fn import_file(&self, file_path: &Path) -> Result<Vec<SetRecord>>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(csv::CsvSetImporter::new()),
            Box::new(events::HevyEventImporter::new()),
        ];

        Self { importers }
    }

    /// Import a single file, auto-detecting the format
    pub fn import_file(&self, file_path: &Path) -> Result<Vec<SetRecord>> {
        if !file_path.exists() {
            return Err(InputError::FileNotFound {
                path: file_path.to_path_buf(),
            }
            .into());
        }

        for importer in &self.importers {
            if importer.can_import(file_path) {
                debug!(
                    file = %file_path.display(),
                    format = importer.get_format_name(),
                    "Importing workout log"
                );
                return importer.import_file(file_path);
            }
        }

        Err(CoachError::InvalidInput(InputError::Malformed {
            path: file_path.to_path_buf(),
            reason: "no importer recognises this file type".to_string(),
        }))
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

/// What the exclusion filter removed, reported for observability only
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExclusionSummary {
    /// Number of sets dropped
    pub excluded_sets: usize,

    /// Distinct exercise names that were dropped
    pub exercise_names: BTreeSet<String>,
}

/// Filters applied after parsing
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Days of history to keep, counting back from `today`
    pub retention_days: u32,

    /// Reference date for the retention window
    pub today: NaiveDate,

    /// Case-insensitive exercise-name substrings to drop
    pub excluded: Vec<String>,
}

impl NormalizeOptions {
    pub fn from_config(config: &CoachingConfig, today: NaiveDate) -> Self {
        NormalizeOptions {
            retention_days: config.retention_days,
            today,
            excluded: config.excluded_exercises.clone(),
        }
    }
}

/// Output of the normalizer
#[derive(Debug, Clone, Default)]
pub struct NormalizedLog {
    /// Working sets sorted by (date, exercise, set_index)
    pub records: Vec<SetRecord>,

    /// Sets dropped for falling outside the retention window
    pub outside_window: usize,

    /// Sets dropped as non-strength work
    pub exclusions: ExclusionSummary,
}

/// Apply the retention window and exclusion list, then sort
pub fn normalize(records: Vec<SetRecord>, options: &NormalizeOptions) -> NormalizedLog {
    let window_start = options
        .today
        .checked_sub_days(Days::new(u64::from(options.retention_days)))
        .unwrap_or(NaiveDate::MIN);
    let total = records.len();

    let (in_window, outside): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|r| r.date >= window_start && r.date <= options.today);

    let mut exclusions = ExclusionSummary::default();
    let mut kept = Vec::with_capacity(in_window.len());
    for record in in_window {
        if contains_any(&record.exercise, &options.excluded) {
            exclusions.excluded_sets += 1;
            exclusions.exercise_names.insert(record.exercise);
        } else {
            kept.push(record);
        }
    }

    kept.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.exercise.cmp(&b.exercise))
            .then_with(|| a.set_index.cmp(&b.set_index))
    });

    info!(
        total,
        kept = kept.len(),
        outside_window = outside.len(),
        retention_days = options.retention_days,
        "Filtered workout log"
    );
    if exclusions.excluded_sets > 0 {
        info!(
            excluded_sets = exclusions.excluded_sets,
            exercises = ?exclusions.exercise_names,
            "Excluded non-strength exercises"
        );
    }

    NormalizedLog {
        records: kept,
        outside_window: outside.len(),
        exclusions,
    }
}

/// Read a workout log and normalize it in one step
pub fn load_log(
    file_path: &Path,
    config: &CoachingConfig,
    today: NaiveDate,
) -> Result<NormalizedLog> {
    let records = ImportManager::new().import_file(file_path)?;
    Ok(normalize(records, &NormalizeOptions::from_config(config, today)))
}
