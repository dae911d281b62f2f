//! Latest-result aggregation across test runs.
//!
//! A test case may be executed in many runs. Only the chronologically
//! latest result per case is kept; completion times are compared as parsed
//! timestamps, never as raw strings, so mixed offsets order correctly.

use crate::api::PlanApi;
use crate::client::RemoteClient;
use crate::types::{TestResult, TestRun};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info};
use rayon::ThreadPool;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse a completion timestamp. Naive timestamps are taken as UTC.
pub fn parse_completed_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Order two completion timestamps.
///
/// Parsed timestamps compare chronologically and sort after unparseable
/// ones; two unparseable values compare as strings, so empty is smallest.
pub fn compare_completed_dates(a: &str, b: &str) -> Ordering {
    match (parse_completed_date(a), parse_completed_date(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Most recent result per test case id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatestResults {
    by_case: HashMap<String, TestResult>,
    total_results: usize,
}

impl LatestResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one result; it replaces the stored one only if strictly newer.
    ///
    /// Results without a test case id are ignored.
    pub fn offer(&mut self, result: TestResult) {
        self.total_results += 1;
        let Some(case_id) = result.case_id().map(str::to_string) else {
            return;
        };

        match self.by_case.get(&case_id) {
            Some(existing)
                if compare_completed_dates(result.completed_date(), existing.completed_date()) != Ordering::Greater => {}
            _ => {
                self.by_case.insert(case_id, result);
            }
        }
    }

    pub fn get(&self, case_id: &str) -> Option<&TestResult> {
        self.by_case.get(case_id)
    }

    /// Number of distinct test cases with a result
    pub fn len(&self) -> usize {
        self.by_case.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_case.is_empty()
    }

    /// Number of results offered, including superseded ones
    pub fn total_results(&self) -> usize {
        self.total_results
    }
}

impl FromIterator<TestResult> for LatestResults {
    fn from_iter<I: IntoIterator<Item = TestResult>>(iter: I) -> Self {
        let mut latest = LatestResults::new();
        for result in iter {
            latest.offer(result);
        }
        latest
    }
}

/// Fetch every run's results on `pool` and reduce them to the latest per case.
///
/// Results are reduced in run order regardless of which fetch finishes
/// first, so the outcome does not depend on scheduling.
pub fn collect_latest_results<C: RemoteClient>(api: &PlanApi<C>, runs: &[TestRun], pool: &ThreadPool) -> LatestResults {
    info!("Building test results map...");
    for run in runs {
        debug!("Run {}: '{}' ({})", run.id.as_deref().unwrap_or("?"), run.name, run.state.as_deref().unwrap_or("unknown"));
    }
    let run_ids: Vec<&str> = runs.iter().filter_map(|r| r.id.as_deref()).collect();
    if run_ids.len() < runs.len() {
        debug!("Skipping {} runs without an id", runs.len() - run_ids.len());
    }

    let per_run: Vec<Vec<TestResult>> = pool.install(|| run_ids.par_iter().map(|id| api.run_results(id)).collect());

    let latest: LatestResults = per_run.into_iter().flatten().collect();
    if latest.is_empty() {
        info!("No test results found for {} runs", run_ids.len());
    }
    info!(
        "Processed {} total results, {} unique test cases with results",
        latest.total_results(),
        latest.len()
    );
    latest
}
