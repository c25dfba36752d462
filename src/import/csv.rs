use csv::ReaderBuilder;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Read;
use std::path::Path;

use crate::error::{InputError, Result};
use crate::import::ImportFormat;
use crate::models::SetRecord;

/// Importer for flat set tables with one row per working set
///
/// Columns match the [`SetRecord`] fields, which is also what the CSV
/// export writes, so an exported log can be re-analyzed offline.
pub struct CsvSetImporter {
    delimiter: u8,
}

impl CsvSetImporter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Parse set rows from any reader; `source` is only used in errors
    pub fn read_records<R: Read>(&self, reader: R, source: &Path) -> Result<Vec<SetRecord>> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (line, row) in csv_reader.deserialize::<SetRecord>().enumerate() {
            let record = row.map_err(|e| InputError::Malformed {
                path: source.to_path_buf(),
                reason: format!("row {}: {}", line + 1, e),
            })?;
            Self::validate(&record, source, line + 1)?;
            records.push(record);
        }

        Ok(records)
    }

    fn validate(record: &SetRecord, source: &Path, line: usize) -> Result<()> {
        let malformed = |reason: String| InputError::Malformed {
            path: source.to_path_buf(),
            reason: format!("row {}: {}", line, reason),
        };

        if record.weight < Decimal::ZERO {
            return Err(malformed(format!("negative weight {}", record.weight)).into());
        }
        if let Some(rpe) = record.rpe {
            if rpe < Decimal::ZERO || rpe > dec!(10) {
                return Err(malformed(format!("RPE {} outside 0-10", rpe)).into());
            }
        }
        Ok(())
    }
}

impl Default for CsvSetImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvSetImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<SetRecord>> {
        let file = std::fs::File::open(file_path)?;
        self.read_records(file, file_path)
    }

    fn get_format_name(&self) -> &'static str {
        "CSV"
    }
}
