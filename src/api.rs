/// API module for reading test plan data from Azure DevOps
///
/// This module provides URL construction for the test-plan, test-run and
/// work-item endpoints, continuation-token pagination, and tolerant typed
/// decoding on top of a `RemoteClient`.
use crate::client::RemoteClient;
use crate::types::*;
use log::{debug, info, warn};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

/// Default Azure DevOps Services host
pub const DEFAULT_SERVER_URL: &str = "https://dev.azure.com";

/// Safety limit: never follow more than this many pages for one collection
const MAX_PAGES: usize = 100;

/// Everything except RFC 3986 unreserved characters is escaped in a path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

fn encode_segment(s: &str) -> String {
    utf8_percent_encode(s, PATH_SEGMENT).to_string()
}

/// Append a query parameter to a URL that may already carry a query string
pub fn with_query_param(url: &str, key: &str, value: &str) -> Result<String, url::ParseError> {
    let mut parsed = Url::parse(url)?;
    parsed.query_pairs_mut().append_pair(key, value);
    Ok(parsed.into())
}

/// URL builder for one organization/project
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(server_url: &str, organization: &str, project: &str) -> Self {
        let base = format!(
            "{}/{}/{}/_apis",
            server_url.trim_end_matches('/'),
            encode_segment(organization),
            encode_segment(project)
        );
        Self { base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn test_plan(&self, plan_id: &str) -> String {
        format!("{}/testplan/plans/{}?api-version=7.1-preview.1", self.base, plan_id)
    }

    pub fn test_suites(&self, plan_id: &str) -> String {
        format!("{}/testplan/Plans/{}/suites?api-version=7.1-preview.1", self.base, plan_id)
    }

    pub fn suite_test_cases(&self, plan_id: &str, suite_id: &str) -> String {
        format!("{}/testplan/Plans/{}/Suites/{}/TestCase?api-version=7.1-preview.3", self.base, plan_id, suite_id)
    }

    pub fn test_points(&self, plan_id: &str, suite_id: &str) -> String {
        format!(
            "{}/testplan/Plans/{}/Suites/{}/TestPoint?includePointDetails=true&api-version=7.1-preview.2",
            self.base, plan_id, suite_id
        )
    }

    pub fn work_item(&self, id: &str) -> String {
        format!("{}/wit/workitems/{}?$expand=all&api-version=7.1", self.base, id)
    }

    pub fn test_runs(&self, plan_id: &str) -> String {
        format!("{}/test/runs?planId={}&api-version=7.1-preview.3", self.base, plan_id)
    }

    pub fn run_results(&self, run_id: &str) -> String {
        format!("{}/test/Runs/{}/results?api-version=7.1-preview.6", self.base, run_id)
    }
}

/// Typed, read-only view of one project's test data
pub struct PlanApi<C> {
    client: C,
    endpoints: Endpoints,
}

impl<C: RemoteClient> PlanApi<C> {
    pub fn new(client: C, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn test_plan(&self, plan_id: &str) -> Option<TestPlan> {
        info!("Fetching test plan details for ID: {}", plan_id);
        let plan: Option<TestPlan> = self.fetch_object(&self.endpoints.test_plan(plan_id));
        match &plan {
            Some(p) => info!("Successfully retrieved test plan: {}", p.name),
            None => warn!("Failed to retrieve test plan {}", plan_id),
        }
        plan
    }

    pub fn test_suites(&self, plan_id: &str) -> Vec<TestSuite> {
        info!("Fetching test suites for plan ID: {}", plan_id);
        let suites: Vec<TestSuite> = self.fetch_collection(&self.endpoints.test_suites(plan_id));
        for suite in suites.iter().take(3) {
            debug!("Suite: ID={}, Name='{}', Type={:?}", suite.id(), suite.name, suite.suite_type);
        }
        suites
    }

    pub fn suite_test_cases(&self, plan_id: &str, suite_id: &str) -> Vec<SuiteTestCase> {
        debug!("Fetching test cases for suite ID: {}", suite_id);
        let cases: Vec<SuiteTestCase> = self.fetch_collection(&self.endpoints.suite_test_cases(plan_id, suite_id));
        debug!("Found {} test cases in suite {}", cases.len(), suite_id);
        cases
    }

    pub fn test_points(&self, plan_id: &str, suite_id: &str) -> Vec<TestPoint> {
        debug!("Fetching test points for suite ID: {}", suite_id);
        let points: Vec<TestPoint> = self.fetch_collection(&self.endpoints.test_points(plan_id, suite_id));
        debug!("Found {} test points in suite {}", points.len(), suite_id);
        points
    }

    /// Fetch a test case or shared step work item with all fields
    pub fn work_item(&self, id: &str) -> Option<WorkItem> {
        debug!("Fetching work item {}", id);
        let item: Option<WorkItem> = self.fetch_object(&self.endpoints.work_item(id));
        if let Some(item) = &item {
            debug!(
                "Retrieved work item '{}' with {} fields (has steps: {})",
                item.field_text(TITLE_FIELD),
                item.fields.len(),
                item.steps_markup().is_some()
            );
        }
        item
    }

    pub fn test_runs(&self, plan_id: &str) -> Vec<TestRun> {
        info!("Fetching test runs for plan ID: {}", plan_id);
        let runs: Vec<TestRun> = self.fetch_collection(&self.endpoints.test_runs(plan_id));
        info!("Found {} test runs", runs.len());
        runs
    }

    pub fn run_results(&self, run_id: &str) -> Vec<TestResult> {
        debug!("Fetching test results for run ID: {}", run_id);
        let results: Vec<TestResult> = self.fetch_collection(&self.endpoints.run_results(run_id));
        debug!("Found {} test results in run {}", results.len(), run_id);
        results
    }

    /// Fetch a single object; an empty or undecodable body is `None`
    fn fetch_object<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        let body = self.client.fetch(url);
        if body.is_null() || body.as_object().is_some_and(|fields| fields.is_empty()) {
            return None;
        }
        match serde_json::from_value(body) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Unexpected response shape from {}: {}", url, e);
                None
            }
        }
    }

    /// Fetch every page of a `{"value": [...]}` collection.
    ///
    /// Items that fail to decode are skipped. Paging follows continuation
    /// tokens until none is returned or `MAX_PAGES` is reached.
    fn fetch_collection<T: DeserializeOwned>(&self, url: &str) -> Vec<T> {
        let mut items = Vec::new();
        let mut next_url = url.to_string();

        for page_number in 1..=MAX_PAGES {
            let page = self.client.fetch_page(&next_url);

            if let Some(Value::Array(values)) = page.body.get("value") {
                debug!("got {} items on page {} of {}", values.len(), page_number, url);
                for value in values {
                    match serde_json::from_value::<T>(value.clone()) {
                        Ok(item) => items.push(item),
                        Err(e) => warn!("Skipping undecodable item from {}: {}", url, e),
                    }
                }
            }

            match page.continuation_token {
                Some(token) => {
                    if page_number == MAX_PAGES {
                        warn!("Stopped paging {} after {} pages", url, MAX_PAGES);
                        break;
                    }
                    next_url = match with_query_param(url, "continuationToken", &token) {
                        Ok(next) => next,
                        Err(e) => {
                            warn!("Cannot request next page of {}: {}", url, e);
                            break;
                        }
                    };
                }
                None => break,
            }
        }

        items
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
