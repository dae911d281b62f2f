/// Core data structures for test plan extraction
///
/// This module defines the remote shapes read from the work-tracking
/// service (plans, suites, test cases, points, runs, results, work items)
/// and the decoded `TestStep`. Every remote type is tolerant: missing fields
/// fall back to defaults so a partial response never aborts a run.
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Field holding the XML step markup of a test case or shared step
pub const STEPS_FIELD: &str = "Microsoft.VSTS.TCM.Steps";
pub const TITLE_FIELD: &str = "System.Title";
pub const CREATED_DATE_FIELD: &str = "System.CreatedDate";
pub const CREATED_BY_FIELD: &str = "System.CreatedBy";
pub const AREA_PATH_FIELD: &str = "System.AreaPath";
pub const ITERATION_PATH_FIELD: &str = "System.IterationPath";
pub const AUTOMATED_TEST_NAME_FIELD: &str = "Microsoft.VSTS.TCM.AutomatedTestName";

/// Accept an identifier encoded as a JSON number or string.
///
/// Empty strings and nulls become `None`.
pub fn flexible_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_id))
}

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Render a loosely-typed field value as display text
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Identity fields come back as objects carrying a display name
        Value::Object(obj) => obj
            .get("displayName")
            .or_else(|| obj.get("name"))
            .map(value_to_text)
            .unwrap_or_default(),
        Value::Array(_) => value.to_string(),
    }
}

/// `{id, name}` reference to another remote object
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ObjectRef {
    #[serde(deserialize_with = "flexible_id")]
    pub id: Option<String>,
    pub name: Option<String>,
}

/// A user identity (tester, assignee, runner)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentityRef {
    pub display_name: Option<String>,
}

impl IdentityRef {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("")
    }
}

/// The test plan being exported
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TestPlan {
    #[serde(deserialize_with = "flexible_id")]
    pub id: Option<String>,
    pub name: String,
}

/// A node of the plan's suite forest
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TestSuite {
    #[serde(deserialize_with = "flexible_id")]
    pub id: Option<String>,
    pub name: String,
    pub suite_type: Option<String>,
    pub parent_suite: Option<ObjectRef>,
}

impl TestSuite {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    /// Parent suite id, if this suite is not a root
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_suite.as_ref().and_then(|p| p.id.as_deref())
    }
}

/// A test case as listed inside one suite
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SuiteTestCase {
    pub work_item: Option<SuiteWorkItem>,
    pub point_assignments: Vec<PointAssignment>,
}

impl SuiteTestCase {
    /// Underlying work item id (the join key for points, results and details)
    pub fn case_id(&self) -> Option<&str> {
        self.work_item.as_ref().and_then(|w| w.id.as_deref())
    }

    /// Tester of the first point assignment, if any
    pub fn first_tester(&self) -> Option<&str> {
        self.point_assignments
            .first()
            .and_then(|a| a.tester.as_ref())
            .map(|t| t.display_name())
            .filter(|name| !name.is_empty())
    }
}

/// Work item summary embedded in a suite's test case listing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SuiteWorkItem {
    #[serde(deserialize_with = "flexible_id")]
    pub id: Option<String>,
    pub name: String,
    pub work_item_fields: Vec<Value>,
}

impl SuiteWorkItem {
    /// Flatten `workItemFields` into a name → value map.
    ///
    /// Entries are either `{"key": .., "value": ..}` pairs or single-entry
    /// objects keyed by the field reference name.
    pub fn field_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for entry in &self.work_item_fields {
            let Some(obj) = entry.as_object() else { continue };
            match (obj.get("key").and_then(Value::as_str), obj.get("value")) {
                (Some(key), Some(value)) => {
                    map.insert(key.to_string(), value.clone());
                }
                _ => {
                    for (key, value) in obj {
                        map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        map
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PointAssignment {
    pub tester: Option<IdentityRef>,
}

/// Full work item (test case detail or shared step)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkItem {
    #[serde(deserialize_with = "flexible_id")]
    pub id: Option<String>,
    pub fields: Map<String, Value>,
}

impl WorkItem {
    /// Text of a field, empty if absent
    pub fn field_text(&self, name: &str) -> String {
        self.fields.get(name).map(value_to_text).unwrap_or_default()
    }

    /// Raw step markup, if the work item has any
    pub fn steps_markup(&self) -> Option<&str> {
        self.fields.get(STEPS_FIELD).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
    }
}

/// Execution-plan slot binding one test case to one suite
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TestPoint {
    pub test_case_reference: Option<ObjectRef>,
    pub test_case: Option<ObjectRef>,
    pub work_item: Option<ObjectRef>,
    pub outcome: Option<String>,
    pub last_result_outcome: Option<String>,
    pub last_result_state: Option<String>,
    pub assigned_to: Option<IdentityRef>,
}

impl TestPoint {
    /// The test case this point belongs to.
    ///
    /// The service reports it under one of three keys depending on API
    /// version; the first non-empty one wins.
    pub fn case_id(&self) -> Option<&str> {
        [&self.test_case_reference, &self.test_case, &self.work_item]
            .into_iter()
            .find_map(|r| r.as_ref().and_then(|r| r.id.as_deref()))
    }

    pub fn assignee(&self) -> &str {
        self.assigned_to.as_ref().map(|a| a.display_name()).unwrap_or("")
    }
}

/// An execution session
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TestRun {
    #[serde(deserialize_with = "flexible_id")]
    pub id: Option<String>,
    pub name: String,
    pub state: Option<String>,
}

/// One test case's outcome inside a run
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TestResult {
    pub test_case: Option<ObjectRef>,
    pub outcome: Option<String>,
    pub state: Option<String>,
    pub completed_date: Option<String>,
    pub run_by: Option<IdentityRef>,
}

impl TestResult {
    pub fn case_id(&self) -> Option<&str> {
        self.test_case.as_ref().and_then(|t| t.id.as_deref())
    }

    pub fn completed_date(&self) -> &str {
        self.completed_date.as_deref().unwrap_or("")
    }

    pub fn run_by(&self) -> &str {
        self.run_by.as_ref().map(|r| r.display_name()).unwrap_or("")
    }
}

/// A decoded test step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestStep {
    pub step_id: String,
    pub action: String,
    pub expected_result: String,
}

impl TestStep {
    pub fn new(step_id: impl Into<String>, action: impl Into<String>, expected_result: impl Into<String>) -> Self {
        Self { step_id: step_id.into(), action: action.into(), expected_result: expected_result.into() }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
