/// Tests for remote data structure decoding
///
/// These tests ensure the tolerant serde types accept the shapes the
/// service actually returns, including numeric/string ids and partial
/// objects.

#[cfg(test)]
mod tests {
    use crate::types::*;
    use serde_json::json;

    #[test]
    fn test_suite_ids_accept_numbers_and_strings() {
        let numeric: TestSuite =
            serde_json::from_value(json!({"id": 12, "name": "Login", "parentSuite": {"id": 3}})).unwrap();
        assert_eq!(numeric.id(), "12");
        assert_eq!(numeric.parent_id(), Some("3"));

        let textual: TestSuite = serde_json::from_value(json!({"id": "12", "name": "Login"})).unwrap();
        assert_eq!(textual.id(), "12");
        assert_eq!(textual.parent_id(), None);
    }

    #[test]
    fn test_empty_ids_are_absent() {
        let suite: TestSuite = serde_json::from_value(json!({"id": "", "parentSuite": {"id": null}})).unwrap();
        assert_eq!(suite.id, None);
        assert_eq!(suite.parent_id(), None);
    }

    #[test]
    fn test_point_case_id_lookup_order() {
        let point: TestPoint = serde_json::from_value(json!({
            "testCase": {"id": 7},
            "workItem": {"id": 8},
        }))
        .unwrap();
        assert_eq!(point.case_id(), Some("7"));

        let point: TestPoint = serde_json::from_value(json!({
            "testCaseReference": {"id": 6},
            "testCase": {"id": 7},
        }))
        .unwrap();
        assert_eq!(point.case_id(), Some("6"));

        let point: TestPoint = serde_json::from_value(json!({"workItem": {"id": "9"}})).unwrap();
        assert_eq!(point.case_id(), Some("9"));

        let point: TestPoint = serde_json::from_value(json!({"outcome": "Passed"})).unwrap();
        assert_eq!(point.case_id(), None);
    }

    #[test]
    fn test_work_item_fields_accept_both_shapes() {
        let item: SuiteWorkItem = serde_json::from_value(json!({
            "id": 100,
            "name": "Checkout",
            "workItemFields": [
                {"key": "System.AreaPath", "value": "Shop"},
                {"Microsoft.VSTS.TCM.AutomatedTestName": "Shop.Tests.Checkout"},
            ]
        }))
        .unwrap();

        let fields = item.field_map();
        assert_eq!(fields.get("System.AreaPath"), Some(&json!("Shop")));
        assert_eq!(fields.get(AUTOMATED_TEST_NAME_FIELD), Some(&json!("Shop.Tests.Checkout")));
    }

    #[test]
    fn test_work_item_field_text() {
        let item: WorkItem = serde_json::from_value(json!({
            "id": 5,
            "fields": {
                "System.Title": "Login works",
                "System.CreatedBy": {"displayName": "Ada Lovelace", "uniqueName": "ada@example.com"},
                "Microsoft.VSTS.TCM.Steps": "   ",
            }
        }))
        .unwrap();

        assert_eq!(item.field_text(TITLE_FIELD), "Login works");
        assert_eq!(item.field_text(CREATED_BY_FIELD), "Ada Lovelace");
        assert_eq!(item.field_text(AREA_PATH_FIELD), "");
        assert_eq!(item.steps_markup(), None, "whitespace-only markup counts as none");
    }

    #[test]
    fn test_suite_test_case_first_tester() {
        let case: SuiteTestCase = serde_json::from_value(json!({
            "workItem": {"id": 1},
            "pointAssignments": [{"tester": {"displayName": "Grace"}}, {"tester": {"displayName": "Alan"}}]
        }))
        .unwrap();
        assert_eq!(case.case_id(), Some("1"));
        assert_eq!(case.first_tester(), Some("Grace"));

        let unassigned: SuiteTestCase = serde_json::from_value(json!({"workItem": {"id": 1}})).unwrap();
        assert_eq!(unassigned.first_tester(), None);
    }

    #[test]
    fn test_result_accessors_default_to_empty() {
        let result: TestResult = serde_json::from_value(json!({"testCase": {"id": 3}})).unwrap();
        assert_eq!(result.case_id(), Some("3"));
        assert_eq!(result.completed_date(), "");
        assert_eq!(result.run_by(), "");
    }
}
