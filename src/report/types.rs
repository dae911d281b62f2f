//! Report type definitions for the hierarchical row model.
//!
//! Every output row is one of four kinds and renders to the same fixed
//! 19-column record; columns that do not apply to a kind are empty.

/// Column headers of the exported table, in order.
pub const COLUMNS: [&str; 19] = [
    "Type",
    "Test Plan ID",
    "Suite Path",
    "Suite ID",
    "Test Case ID",
    "Title",
    "Step Number",
    "Step Action",
    "Expected Result",
    "Execution Status",
    "Execution Outcome",
    "Last Run Date",
    "Last Run By",
    "Assigned To",
    "Created Date",
    "Created By",
    "Area Path",
    "Iteration",
    "Automated",
];

/// Execution status used when a test case has never run
pub const NOT_EXECUTED: &str = "Not Executed";

/// Row kind, rendered in the `Type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    Suite,
    TestCase,
    TestStep,
    Separator,
}

impl RowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowKind::Suite => "Suite",
            RowKind::TestCase => "Test Case",
            RowKind::TestStep => "Test Step",
            RowKind::Separator => "Separator",
        }
    }
}

/// The 18 data columns following `Type`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowRecord {
    pub test_plan_id: String,
    pub suite_path: String,
    pub suite_id: String,
    pub test_case_id: String,
    pub title: String,
    pub step_number: String,
    pub step_action: String,
    pub expected_result: String,
    pub execution_status: String,
    pub execution_outcome: String,
    pub last_run_date: String,
    pub last_run_by: String,
    pub assigned_to: String,
    pub created_date: String,
    pub created_by: String,
    pub area_path: String,
    pub iteration: String,
    pub automated: String,
}

/// Where a row sits in the plan: shared by suite, case and step rows
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub plan_id: &'a str,
    pub suite_path: &'a str,
    pub suite_id: &'a str,
}

/// Resolved execution columns of a test case row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionInfo {
    pub status: String,
    pub outcome: String,
    pub last_run_date: String,
    pub last_run_by: String,
}

impl ExecutionInfo {
    pub fn not_executed() -> Self {
        Self {
            status: NOT_EXECUTED.to_string(),
            outcome: String::new(),
            last_run_date: String::new(),
            last_run_by: String::new(),
        }
    }
}

/// Descriptive columns of a test case row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseDetails {
    pub title: String,
    pub assigned_to: String,
    pub created_date: String,
    pub created_by: String,
    pub area_path: String,
    pub iteration: String,
    pub automated: bool,
}

/// One row of the hierarchical report. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchicalRow {
    Suite(RowRecord),
    TestCase(RowRecord),
    TestStep(RowRecord),
    Separator(RowRecord),
}

impl HierarchicalRow {
    /// Suite header row
    pub fn suite(ctx: RowContext, suite_name: &str) -> Self {
        HierarchicalRow::Suite(RowRecord {
            title: format!("SUITE: {}", suite_name),
            ..base_record(ctx)
        })
    }

    pub fn test_case(ctx: RowContext, case_id: &str, details: CaseDetails, execution: ExecutionInfo) -> Self {
        HierarchicalRow::TestCase(RowRecord {
            test_case_id: case_id.to_string(),
            title: details.title,
            execution_status: execution.status,
            execution_outcome: execution.outcome,
            last_run_date: execution.last_run_date,
            last_run_by: execution.last_run_by,
            assigned_to: details.assigned_to,
            created_date: details.created_date,
            created_by: details.created_by,
            area_path: details.area_path,
            iteration: details.iteration,
            automated: if details.automated { "Yes" } else { "No" }.to_string(),
            ..base_record(ctx)
        })
    }

    /// Step row; `number` is 1-based within its test case
    pub fn test_step(ctx: RowContext, case_id: &str, number: usize, action: &str, expected: &str) -> Self {
        HierarchicalRow::TestStep(RowRecord {
            test_case_id: case_id.to_string(),
            step_number: number.to_string(),
            step_action: action.to_string(),
            expected_result: expected.to_string(),
            ..base_record(ctx)
        })
    }

    /// Blank row closing a suite
    pub fn separator() -> Self {
        HierarchicalRow::Separator(RowRecord::default())
    }

    pub fn kind(&self) -> RowKind {
        match self {
            HierarchicalRow::Suite(_) => RowKind::Suite,
            HierarchicalRow::TestCase(_) => RowKind::TestCase,
            HierarchicalRow::TestStep(_) => RowKind::TestStep,
            HierarchicalRow::Separator(_) => RowKind::Separator,
        }
    }

    pub fn record(&self) -> &RowRecord {
        match self {
            HierarchicalRow::Suite(r)
            | HierarchicalRow::TestCase(r)
            | HierarchicalRow::TestStep(r)
            | HierarchicalRow::Separator(r) => r,
        }
    }

    /// Cells in `COLUMNS` order
    pub fn to_record(&self) -> [&str; 19] {
        let r = self.record();
        [
            self.kind().as_str(),
            &r.test_plan_id,
            &r.suite_path,
            &r.suite_id,
            &r.test_case_id,
            &r.title,
            &r.step_number,
            &r.step_action,
            &r.expected_result,
            &r.execution_status,
            &r.execution_outcome,
            &r.last_run_date,
            &r.last_run_by,
            &r.assigned_to,
            &r.created_date,
            &r.created_by,
            &r.area_path,
            &r.iteration,
            &r.automated,
        ]
    }
}

fn base_record(ctx: RowContext) -> RowRecord {
    RowRecord {
        test_plan_id: ctx.plan_id.to_string(),
        suite_path: ctx.suite_path.to_string(),
        suite_id: ctx.suite_id.to_string(),
        ..RowRecord::default()
    }
}

/// Counts and breakdowns over an exported row set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    pub suites: usize,
    pub test_cases: usize,
    pub test_steps: usize,
    pub total_rows: usize,
    /// Execution outcome → number of test cases (sorted by outcome)
    pub outcomes: Vec<(String, usize)>,
    /// Execution status → number of test cases (sorted by status)
    pub statuses: Vec<(String, usize)>,
    pub automated: usize,
    pub manual: usize,
}

impl ExportSummary {
    /// Share of test cases, in percent
    pub fn percentage(&self, count: usize) -> f64 {
        if self.test_cases == 0 { 0.0 } else { count as f64 * 100.0 / self.test_cases as f64 }
    }

    pub fn average_steps(&self) -> f64 {
        if self.test_cases == 0 { 0.0 } else { self.test_steps as f64 / self.test_cases as f64 }
    }
}
