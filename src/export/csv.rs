use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;

use super::{markdown, write_file, ExportError};
use crate::models::SetRecord;
use crate::report::CoachingReport;

/// One row of the per-exercise verdict table
#[derive(Debug, Serialize)]
struct ExerciseRow<'a> {
    exercise: &'a str,
    date: String,
    sets: u32,
    mean_weight: Decimal,
    mean_reps: Decimal,
    peak_rpe: Option<Decimal>,
    target: Option<String>,
    verdict: &'static str,
    suggested_weight: Option<Decimal>,
    weight_change_pct: Option<Decimal>,
    efficiency_score: Option<Decimal>,
}

fn to_csv<S: Serialize>(rows: impl IntoIterator<Item = S>) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| ExportError::Serialization(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Serialization(e.to_string()))
}

/// Export the normalized set records, readable again by the CSV importer
pub fn export_set_records<P: AsRef<Path>>(
    records: &[SetRecord],
    output_path: P,
) -> Result<(), ExportError> {
    let data = to_csv(records)?;
    write_file(output_path.as_ref(), &data)
}

/// Export one row per exercise with its latest verdict and trend
pub fn export_exercise_summary<P: AsRef<Path>>(
    report: &CoachingReport,
    output_path: P,
) -> Result<(), ExportError> {
    let rows = report.exercises.iter().map(|e| ExerciseRow {
        exercise: &e.exercise,
        date: e.latest.date.format("%Y-%m-%d").to_string(),
        sets: e.latest.set_count,
        mean_weight: e.latest.mean_weight.round_dp(2),
        mean_reps: e.latest.mean_reps.round_dp(2),
        peak_rpe: e.latest.peak_rpe,
        target: e.rep_range.map(|r| r.to_string()),
        verdict: markdown::verdict_label(&e.verdict),
        suggested_weight: e.verdict.suggested_weight(),
        weight_change_pct: e.progression.as_ref().map(|p| p.weight_change_pct.round_dp(2)),
        efficiency_score: e.audit.as_ref().map(|a| a.efficiency_score.round_dp(1)),
    });

    let data = to_csv(rows)?;
    write_file(output_path.as_ref(), &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::csv::CsvSetImporter;
    use crate::import::ImportFormat;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn records() -> Vec<SetRecord> {
        vec![
            SetRecord {
                date: NaiveDate::from_ymd_opt(2024, 9, 23).unwrap(),
                workout: "Day 1 - Upper (Push)".to_string(),
                exercise: "Bench Press (Barbell)".to_string(),
                weight: dec!(62.5),
                reps: 8,
                rpe: Some(dec!(8.5)),
                set_index: 0,
            },
            SetRecord {
                date: NaiveDate::from_ymd_opt(2024, 9, 23).unwrap(),
                workout: "Day 1 - Upper (Push)".to_string(),
                exercise: "Chest Dip (Assisted)".to_string(),
                weight: dec!(20),
                reps: 10,
                rpe: None,
                set_index: 0,
            },
        ]
    }

    #[test]
    fn test_set_export_can_be_reimported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sets.csv");

        export_set_records(&records(), &path).unwrap();
        let imported = CsvSetImporter::new().import_file(&path).unwrap();
        assert_eq!(imported, records());
    }

    #[test]
    fn test_set_export_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sets.csv");

        export_set_records(&records(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("date,workout,exercise,weight,reps,rpe,set_index"));
    }
}
