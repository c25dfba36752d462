use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

pub use crate::error::ExportError;
use crate::report::CoachingReport;

pub mod csv;
pub mod json;
pub mod markdown;

/// Report output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Markdown,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Render a report in the given format
pub fn render(report: &CoachingReport, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Markdown => markdown::render(report),
        ExportFormat::Json => json::render(report),
    }
}

/// Render a report and write it to a file, creating parent directories
pub fn export_report<P: AsRef<Path>>(
    report: &CoachingReport,
    format: ExportFormat,
    output_path: P,
) -> Result<String, ExportError> {
    let rendered = render(report, format)?;
    write_file(output_path.as_ref(), rendered.as_bytes())?;
    info!(path = %output_path.as_ref().display(), format = ?format, "Report saved");
    Ok(rendered)
}

pub(crate) fn write_file(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    let fail = |e: std::io::Error| ExportError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(fail)?;
        }
    }
    fs::write(path, contents).map_err(fail)
}
