//! Report generation module - row model, CSV export and summary.
//!
//! # Module Organization
//!
//! - `types` - Row model (RowKind, HierarchicalRow, COLUMNS) and ExportSummary
//! - `export` - CSV export
//! - `stats` - Summary statistics and console rendering of the summary

mod export;
mod stats;
mod types;

// Re-export types
pub use types::{CaseDetails, ExecutionInfo, HierarchicalRow, NOT_EXECUTED, RowContext};
#[cfg(test)]
pub use types::RowKind;

// Re-export export functions
pub use export::export_csv;

// Re-export stats functions
pub use stats::{print_summary, summarize_rows};
