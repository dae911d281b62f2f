//! Summary statistics over an exported row set.

use super::types::{ExportSummary, HierarchicalRow, NOT_EXECUTED, RowKind};
use std::collections::BTreeMap;

/// Count rows by kind and break test cases down by execution.
///
/// # Arguments
/// * `rows` - All exported rows
///
/// # Returns
/// An `ExportSummary`; outcome and status breakdowns cover test case rows
/// only, with an empty value counted as "Not Executed".
pub fn summarize_rows(rows: &[HierarchicalRow]) -> ExportSummary {
    let mut summary = ExportSummary { total_rows: rows.len(), ..ExportSummary::default() };
    let mut outcomes: BTreeMap<String, usize> = BTreeMap::new();
    let mut statuses: BTreeMap<String, usize> = BTreeMap::new();

    for row in rows {
        match row.kind() {
            RowKind::Suite => summary.suites += 1,
            RowKind::TestStep => summary.test_steps += 1,
            RowKind::Separator => {}
            RowKind::TestCase => {
                summary.test_cases += 1;
                let record = row.record();
                *outcomes.entry(or_not_executed(&record.execution_outcome)).or_default() += 1;
                *statuses.entry(or_not_executed(&record.execution_status)).or_default() += 1;
                if record.automated == "Yes" {
                    summary.automated += 1;
                } else {
                    summary.manual += 1;
                }
            }
        }
    }

    summary.outcomes = outcomes.into_iter().collect();
    summary.statuses = statuses.into_iter().collect();
    summary
}

fn or_not_executed(value: &str) -> String {
    if value.is_empty() { NOT_EXECUTED.to_string() } else { value.to_string() }
}

/// Render the summary as printable lines
pub fn format_summary(summary: &ExportSummary) -> Vec<String> {
    let mut lines = vec![
        "EXPORT SUMMARY".to_string(),
        format!("  Suites:      {}", summary.suites),
        format!("  Test cases:  {}", summary.test_cases),
        format!("  Test steps:  {}", summary.test_steps),
        format!("  Total rows:  {}", summary.total_rows),
    ];

    if summary.test_cases > 0 {
        lines.push("Execution outcomes:".to_string());
        for (outcome, count) in &summary.outcomes {
            lines.push(format!("  {}: {} ({:.1}%)", outcome, count, summary.percentage(*count)));
        }
        lines.push("Execution status:".to_string());
        for (status, count) in &summary.statuses {
            lines.push(format!("  {}: {} ({:.1}%)", status, count, summary.percentage(*count)));
        }
        lines.push("Automation:".to_string());
        lines.push(format!("  Automated: {} ({:.1}%)", summary.automated, summary.percentage(summary.automated)));
        lines.push(format!("  Manual: {} ({:.1}%)", summary.manual, summary.percentage(summary.manual)));
        lines.push(format!("Average steps per test case: {:.1}", summary.average_steps()));
    }

    lines
}

pub fn print_summary(summary: &ExportSummary) {
    println!();
    for line in format_summary(summary) {
        println!("{}", line);
    }
}
