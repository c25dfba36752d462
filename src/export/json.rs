use std::path::Path;

use super::{write_file, ExportError};
use crate::report::CoachingReport;

/// Pretty-printed JSON rendering of a report
pub fn render(report: &CoachingReport) -> Result<String, ExportError> {
    serde_json::to_string_pretty(report).map_err(|e| ExportError::Serialization(e.to_string()))
}

/// Export any serializable data structure to JSON
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<(), ExportError>
where
    T: serde::Serialize,
    P: AsRef<Path>,
{
    let json_data = serde_json::to_string_pretty(data)
        .map_err(|e| ExportError::Serialization(e.to_string()))?;

    write_file(output_path.as_ref(), json_data.as_bytes())
}
