use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::domain::{CellGrid, FormulaEvaluator, Worksheet};

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid worksheet file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub struct FileRepository;

impl FileRepository {
    /// Writes the worksheet as pretty-printed JSON.
    pub fn save_worksheet(worksheet: &Worksheet, path: impl AsRef<Path>) -> Result<PathBuf, PersistenceError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(worksheet)?;
        fs::write(path, json)?;
        debug!(path = %path.display(), rows = worksheet.rows.len(), "worksheet saved");
        Ok(path.to_path_buf())
    }

    pub fn load_worksheet(path: impl AsRef<Path>) -> Result<Worksheet, PersistenceError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let worksheet: Worksheet = serde_json::from_str(&content)?;
        debug!(path = %path.display(), rows = worksheet.rows.len(), "worksheet loaded");
        Ok(worksheet)
    }
}

/// Exports evaluated display values as CSV.
pub struct CsvExporter;

impl CsvExporter {
    /// Writes a header of column titles followed by one record per row.
    /// Returns the number of data rows written.
    pub fn write_display_values<W: Write>(worksheet: &Worksheet, writer: W) -> Result<usize, PersistenceError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(worksheet.columns.iter().map(|column| column.title.as_str()))?;

        let evaluator = FormulaEvaluator::new(worksheet);
        for row in 0..worksheet.row_count() {
            let record: Vec<String> = (0..worksheet.col_count())
                .map(|col| evaluator.evaluate(row, col).to_string())
                .collect();
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(worksheet.row_count())
    }

    pub fn export_to_csv(worksheet: &Worksheet, path: impl AsRef<Path>) -> Result<PathBuf, PersistenceError> {
        let path = path.as_ref();
        let file = fs::File::create(path)?;
        let rows = Self::write_display_values(worksheet, file)?;
        debug!(path = %path.display(), rows, "worksheet exported");
        Ok(path.to_path_buf())
    }
}
