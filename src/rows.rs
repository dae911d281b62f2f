//! Hierarchical row building.
//!
//! Joins the plan's suites, suite test cases, test points, work item
//! details and aggregated run results into one ordered row sequence:
//! per suite a header row, then each test case followed by its steps,
//! then a separator. Suites are processed in parallel on the caller's
//! pool and joined back in suite path order.

use crate::api::PlanApi;
use crate::client::RemoteClient;
use crate::hierarchy::{PathTermination, SuiteIndex};
use crate::report::{CaseDetails, ExecutionInfo, HierarchicalRow, NOT_EXECUTED, RowContext};
use crate::results::{LatestResults, collect_latest_results};
use crate::shared_steps::{SharedStepCache, SharedStepResolver, SharedStepSource};
use crate::steps::parse_test_steps;
use crate::types::{
    AREA_PATH_FIELD, AUTOMATED_TEST_NAME_FIELD, CREATED_BY_FIELD, CREATED_DATE_FIELD, ITERATION_PATH_FIELD,
    SuiteTestCase, TITLE_FIELD, TestPoint, TestStep, TestSuite, WorkItem, value_to_text,
};
use log::{debug, error, info, warn};
use rayon::ThreadPool;
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Builds the hierarchical rows for one plan
pub struct PlanExtractor<'a, C> {
    api: &'a PlanApi<C>,
    pool: &'a ThreadPool,
    max_shared_step_depth: usize,
}

/// A suite with its resolved path
struct SortedSuite<'a> {
    suite: &'a TestSuite,
    path: String,
}

/// Everything a single test case row needs besides its own listing entry
struct SuiteScope<'a, S: ?Sized> {
    plan_id: &'a str,
    suite: &'a SortedSuite<'a>,
    points: &'a HashMap<String, &'a TestPoint>,
    results: &'a LatestResults,
    resolver: &'a SharedStepResolver<'a, S>,
}

impl<'a, S: ?Sized> SuiteScope<'a, S> {
    fn context(&self) -> RowContext<'a> {
        RowContext { plan_id: self.plan_id, suite_path: &self.suite.path, suite_id: self.suite.suite.id() }
    }
}

impl<'a, C: RemoteClient> PlanExtractor<'a, C> {
    pub fn new(api: &'a PlanApi<C>, pool: &'a ThreadPool, max_shared_step_depth: usize) -> Self {
        Self { api, pool, max_shared_step_depth }
    }

    /// Extract all rows of `plan_id`.
    ///
    /// Returns no rows when the plan or its suites cannot be retrieved.
    pub fn extract(&self, plan_id: &str) -> Vec<HierarchicalRow> {
        info!("Starting hierarchical extraction of test plan {}", plan_id);

        let Some(plan) = self.api.test_plan(plan_id) else {
            error!("Could not retrieve test plan {}", plan_id);
            return Vec::new();
        };
        info!("Processing test plan: {} (ID: {})", plan.name, plan.id.as_deref().unwrap_or(plan_id));

        let suites = self.api.test_suites(plan_id);
        if suites.is_empty() {
            error!("No test suites found in plan {}", plan_id);
            return Vec::new();
        }
        info!("Found {} test suites", suites.len());

        let runs = self.api.test_runs(plan_id);
        let results = collect_latest_results(self.api, &runs, self.pool);

        let sorted = sort_suites_by_path(&suites);
        let cache = SharedStepCache::new(self.api);
        let resolver = SharedStepResolver::new(&cache, self.max_shared_step_depth);

        let per_suite: Vec<Vec<HierarchicalRow>> = self.pool.install(|| {
            sorted.par_iter().map(|suite| self.suite_rows(plan_id, suite, &results, &resolver)).collect()
        });

        let rows: Vec<HierarchicalRow> = per_suite.into_iter().flatten().collect();
        info!("Extraction finished with {} rows", rows.len());
        rows
    }

    /// Rows of one suite; empty when the suite has no test cases
    fn suite_rows<S>(
        &self,
        plan_id: &str,
        suite: &SortedSuite,
        results: &LatestResults,
        resolver: &SharedStepResolver<S>,
    ) -> Vec<HierarchicalRow>
    where
        S: SharedStepSource + ?Sized,
    {
        let suite_id = suite.suite.id();
        info!("Processing suite: {} (ID: {})", suite.path, suite_id);

        let cases = self.api.suite_test_cases(plan_id, suite_id);
        info!("  Found {} test cases in suite {}", cases.len(), suite.suite.name);
        if cases.is_empty() {
            debug!("  Skipping suite {} - no test cases", suite.suite.name);
            return Vec::new();
        }

        let points = self.api.test_points(plan_id, suite_id);
        let point_map = point_map(&points);
        debug!("  Created test point mapping for {} test cases", point_map.len());

        let scope = SuiteScope { plan_id, suite, points: &point_map, results, resolver };

        let per_case: Vec<Vec<HierarchicalRow>> = cases.par_iter().map(|case| self.case_rows(&scope, case)).collect();

        let case_count = per_case.iter().filter(|r| !r.is_empty()).count();
        let step_count: usize = per_case.iter().map(|r| r.len().saturating_sub(1)).sum();
        info!("  Suite {} processed: {} test cases, {} test steps", suite.suite.name, case_count, step_count);

        let mut rows = Vec::with_capacity(2 + per_case.iter().map(Vec::len).sum::<usize>());
        rows.push(HierarchicalRow::suite(scope.context(), &suite.suite.name));
        rows.extend(per_case.into_iter().flatten());
        rows.push(HierarchicalRow::separator());
        rows
    }

    /// The test case row followed by its step rows; empty when skipped
    fn case_rows<S>(&self, scope: &SuiteScope<S>, case: &SuiteTestCase) -> Vec<HierarchicalRow>
    where
        S: SharedStepSource + ?Sized,
    {
        let Some(case_id) = case.case_id() else {
            warn!("    No valid test case ID found in suite {}", scope.suite.suite.name);
            return Vec::new();
        };
        debug!("    Processing test case {}", case_id);

        let Some(detail) = self.api.work_item(case_id) else {
            warn!("    Could not get details for test case {}", case_id);
            return Vec::new();
        };

        let point = scope.points.get(case_id).copied();
        let execution = resolve_execution(case_id, scope.results, point);
        let details = case_details(&detail, case, point);
        let steps = resolve_steps(scope.resolver, &detail, case_id);

        let ctx = scope.context();
        let mut rows = Vec::with_capacity(1 + steps.len());
        rows.push(HierarchicalRow::test_case(ctx, case_id, details, execution));
        for (i, step) in steps.iter().enumerate() {
            rows.push(HierarchicalRow::test_step(ctx, case_id, i + 1, &step.action, &step.expected_result));
        }
        rows
    }
}

/// Extract all rows of `plan_id` with a one-off extractor
pub fn extract_hierarchical_rows<C: RemoteClient>(
    api: &PlanApi<C>,
    plan_id: &str,
    pool: &ThreadPool,
    max_shared_step_depth: usize,
) -> Vec<HierarchicalRow> {
    PlanExtractor::new(api, pool, max_shared_step_depth).extract(plan_id)
}

/// Resolve every suite's path and sort by it; ties keep listing order
fn sort_suites_by_path(suites: &[TestSuite]) -> Vec<SortedSuite<'_>> {
    let index = SuiteIndex::new(suites);
    let mut sorted: Vec<SortedSuite> = suites
        .iter()
        .map(|suite| {
            let path = index.resolve(suite);
            if path.termination != PathTermination::Root {
                debug!("Suite {} has a partial path: {:?}", suite.id(), path.termination);
            }
            SortedSuite { suite, path: path.full_path() }
        })
        .collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));
    sorted
}

/// Test points keyed by test case id; a later point replaces an earlier one
fn point_map(points: &[TestPoint]) -> HashMap<String, &TestPoint> {
    let mut map = HashMap::new();
    for point in points {
        if let Some(case_id) = point.case_id() {
            map.insert(case_id.to_string(), point);
        }
    }
    map
}

/// Execution columns: the latest run result wins over the test point's
/// last result, and neither means "Not Executed".
fn resolve_execution(case_id: &str, results: &LatestResults, point: Option<&TestPoint>) -> ExecutionInfo {
    if let Some(result) = results.get(case_id) {
        debug!("    Test case {} has execution result: {:?}", case_id, result.outcome);
        return ExecutionInfo {
            status: result.state.clone().unwrap_or_else(|| NOT_EXECUTED.to_string()),
            outcome: result.outcome.clone().unwrap_or_default(),
            last_run_date: result.completed_date().to_string(),
            last_run_by: result.run_by().to_string(),
        };
    }

    if let Some(point) = point
        && let Some(outcome) = point.last_result_outcome.as_deref().filter(|o| !o.is_empty())
    {
        debug!("    Test case {} has test point result: {}", case_id, outcome);
        return ExecutionInfo {
            status: point.last_result_state.clone().unwrap_or_else(|| NOT_EXECUTED.to_string()),
            outcome: outcome.to_string(),
            last_run_date: String::new(),
            last_run_by: String::new(),
        };
    }

    debug!("    Test case {} has no execution results", case_id);
    ExecutionInfo::not_executed()
}

fn case_details(detail: &WorkItem, case: &SuiteTestCase, point: Option<&TestPoint>) -> CaseDetails {
    let listing = case.work_item.as_ref().map(|w| w.field_map()).unwrap_or_default();
    let field = |name: &str| field_with_fallback(detail, &listing, name);

    let mut title = field(TITLE_FIELD);
    if title.is_empty()
        && let Some(work_item) = &case.work_item
    {
        title = work_item.name.clone();
    }

    let assigned_to = match point.map(TestPoint::assignee).filter(|a| !a.is_empty()) {
        Some(assignee) => assignee.to_string(),
        None => case.first_tester().unwrap_or_default().to_string(),
    };

    CaseDetails {
        title,
        assigned_to,
        created_date: field(CREATED_DATE_FIELD),
        created_by: field(CREATED_BY_FIELD),
        area_path: field(AREA_PATH_FIELD),
        iteration: field(ITERATION_PATH_FIELD),
        automated: !field(AUTOMATED_TEST_NAME_FIELD).trim().is_empty(),
    }
}

/// A detail field, else the same field from the suite listing
fn field_with_fallback(detail: &WorkItem, listing: &Map<String, Value>, name: &str) -> String {
    let text = detail.field_text(name);
    if !text.is_empty() {
        return text;
    }
    listing.get(name).map(value_to_text).unwrap_or_default()
}

/// Decode a case's steps and inline its shared steps.
///
/// A cyclic or too-deep reference stays as its marker step; the case's
/// other references are still inlined.
fn resolve_steps<S>(resolver: &SharedStepResolver<S>, detail: &WorkItem, case_id: &str) -> Vec<TestStep>
where
    S: SharedStepSource + ?Sized,
{
    let steps = detail.steps_markup().map(parse_test_steps).unwrap_or_default();
    if steps.is_empty() {
        return steps;
    }

    let original_count = steps.len();
    let flattened = resolver.flatten(steps, case_id);
    if !flattened.errors.is_empty() {
        warn!(
            "    Test case {}: {} shared step reference(s) left unexpanded",
            case_id,
            flattened.errors.len()
        );
    }
    if flattened.steps.len() != original_count {
        debug!("    Flattened {} -> {} steps for TC {}", original_count, flattened.steps.len(), case_id);
    }
    flattened.steps
}

#[cfg(test)]
#[path = "rows_test.rs"]
mod rows_test;
