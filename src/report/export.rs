//! CSV export of the hierarchical report.
//!
//! The file is a header line with the 19 column names followed by one
//! record per row, written in the order the rows were built.

use super::types::{COLUMNS, HierarchicalRow};
use log::info;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("failed to write CSV to {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("no data to export")]
    NoRows,
}

/// Write `rows` to a CSV file at `output_path`.
///
/// An empty row set is rejected before the file is created.
///
/// # Arguments
/// * `rows` - Rows in output order
/// * `output_path` - Path of the CSV file, overwritten if it exists
///
/// # Returns
/// The number of data rows written.
pub fn export_csv(rows: &[HierarchicalRow], output_path: &Path) -> Result<usize, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::NoRows);
    }

    let path = output_path.display().to_string();
    let csv_err = |source| ExportError::Csv { path: path.clone(), source };

    let mut writer = csv::Writer::from_path(output_path).map_err(csv_err)?;
    writer.write_record(COLUMNS).map_err(csv_err)?;
    for row in rows {
        writer.write_record(row.to_record()).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ExportError::Io { path: path.clone(), source })?;

    let size = fs::metadata(output_path).map_err(|source| ExportError::Io { path: path.clone(), source })?.len();
    info!("Exported {} rows to {} ({} bytes)", rows.len(), path, size);

    Ok(rows.len())
}
