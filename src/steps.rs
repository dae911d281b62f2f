//! Test step markup decoding.
//!
//! Test cases and shared steps store their steps as an XML document whose
//! `parameterizedString` elements hold HTML-escaped rich text:
//!
//! ```xml
//! <steps id="0" last="3">
//!   <step id="2" type="ActionStep">
//!     <parameterizedString isformatted="true">&lt;DIV&gt;Open the app&lt;/DIV&gt;</parameterizedString>
//!     <parameterizedString isformatted="true"></parameterizedString>
//!   </step>
//!   <step id="3" type="ValidateStep">...</step>
//! </steps>
//! ```
//!
//! Decoding never fails: malformed markup yields no steps.

use crate::types::TestStep;
use lazy_static::lazy_static;
use log::{debug, error};
use regex::Regex;
use roxmltree::{Document, Node};

const STEP_TAG: &str = "step";
const TEXT_TAG: &str = "parameterizedString";
const VALIDATE_STEP: &str = "ValidateStep";

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").expect("valid tag pattern");
}

/// Reduce rich text to plain text: strip tags, unescape entities and
/// collapse whitespace.
pub fn clean_html_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let without_tags = HTML_TAG.replace_all(html, "");
    let unescaped = html_escape::decode_html_entities(&without_tags);
    unescaped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode step markup into steps, in document order.
///
/// Steps whose action and expected result are both empty after cleaning
/// are dropped.
pub fn parse_test_steps(markup: &str) -> Vec<TestStep> {
    if markup.trim().is_empty() {
        return Vec::new();
    }

    let doc = match Document::parse(markup) {
        Ok(doc) => doc,
        Err(e) => {
            error!("Error parsing test steps XML: {}", e);
            return Vec::new();
        }
    };

    let root = doc.root_element();
    let mut steps = Vec::new();

    for step in root.descendants().filter(|n| *n != root && n.has_tag_name(STEP_TAG)) {
        let step_id = step.attribute("id").unwrap_or("");
        let (action, expected) = if step.attribute("type") == Some(VALIDATE_STEP) {
            let texts: Vec<Node> = step.children().filter(|n| n.has_tag_name(TEXT_TAG)).take(2).collect();
            match texts.as_slice() {
                [action, expected] => (clean_html_text(&node_text(*action)), clean_html_text(&node_text(*expected))),
                _ => (String::new(), String::new()),
            }
        } else {
            let action = step
                .descendants()
                .find(|n| n.has_tag_name(TEXT_TAG))
                .map(|n| clean_html_text(&node_text(n)))
                .unwrap_or_default();
            (action, String::new())
        };

        debug!("Step {}: action='{}', expected='{}'", step_id, action, expected);

        if !action.is_empty() || !expected.is_empty() {
            steps.push(TestStep::new(step_id, action, expected));
        }
    }

    steps
}

/// All text inside an element, concatenated
fn node_text(node: Node) -> String {
    node.descendants().filter(|n| n.is_text()).filter_map(|n| n.text()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_STEPS: &str = r#"<steps id="0" last="3">
        <step id="2" type="ActionStep">
            <parameterizedString isformatted="true">&lt;DIV&gt;&lt;P&gt;Open the   login page&lt;/P&gt;&lt;/DIV&gt;</parameterizedString>
            <parameterizedString isformatted="true">&lt;DIV&gt;&lt;P&gt;&lt;BR/&gt;&lt;/P&gt;&lt;/DIV&gt;</parameterizedString>
            <description/>
        </step>
        <step id="3" type="ValidateStep">
            <parameterizedString isformatted="true">&lt;DIV&gt;Click Login&lt;/DIV&gt;</parameterizedString>
            <parameterizedString isformatted="true">&lt;DIV&gt;Dashboard shown&lt;/DIV&gt;</parameterizedString>
            <description/>
        </step>
    </steps>"#;

    #[test]
    fn test_clean_html_text() {
        assert_eq!(clean_html_text("<DIV><P>Fish &amp; chips</P></DIV>"), "Fish & chips");
        assert_eq!(clean_html_text("  a\n\t b&nbsp;c  "), "a b c");
        assert_eq!(clean_html_text("&lt;tag&gt;"), "<tag>");
        assert_eq!(clean_html_text(""), "");
    }

    #[test]
    fn test_parse_action_and_validate_steps() {
        let steps = parse_test_steps(LOGIN_STEPS);
        assert_eq!(
            steps,
            vec![
                TestStep::new("2", "Open the login page", ""),
                TestStep::new("3", "Click Login", "Dashboard shown"),
            ]
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        assert_eq!(parse_test_steps(LOGIN_STEPS), parse_test_steps(LOGIN_STEPS));
    }

    #[test]
    fn test_empty_and_whitespace_markup() {
        assert!(parse_test_steps("").is_empty());
        assert!(parse_test_steps("   \n").is_empty());
        assert!(parse_test_steps("<steps id=\"0\" last=\"1\"/>").is_empty());
    }

    #[test]
    fn test_malformed_markup_yields_no_steps() {
        assert!(parse_test_steps("<steps><step id=\"2\"").is_empty());
        assert!(parse_test_steps("not xml at all").is_empty());
    }

    #[test]
    fn test_empty_steps_are_dropped() {
        let markup = r#"<steps>
            <step id="2" type="ActionStep"><parameterizedString>&lt;P&gt; &lt;/P&gt;</parameterizedString></step>
            <step id="3" type="ActionStep"></step>
            <step id="4" type="ActionStep"><parameterizedString>Keep me</parameterizedString></step>
        </steps>"#;
        let steps = parse_test_steps(markup);
        assert_eq!(steps, vec![TestStep::new("4", "Keep me", "")]);
    }

    #[test]
    fn test_validate_step_needs_two_texts() {
        let markup = r#"<steps>
            <step id="2" type="ValidateStep"><parameterizedString>Only action</parameterizedString></step>
        </steps>"#;
        assert!(parse_test_steps(markup).is_empty());
    }

    #[test]
    fn test_validate_step_with_only_expected_is_kept() {
        let markup = r#"<steps>
            <step id="5" type="ValidateStep"><parameterizedString></parameterizedString><parameterizedString>Result visible</parameterizedString></step>
        </steps>"#;
        assert_eq!(parse_test_steps(markup), vec![TestStep::new("5", "", "Result visible")]);
    }

    #[test]
    fn test_action_step_ignores_second_text() {
        let markup = r#"<steps>
            <step id="2" type="ActionStep"><parameterizedString>Do it</parameterizedString><parameterizedString>Ignored</parameterizedString></step>
        </steps>"#;
        assert_eq!(parse_test_steps(markup), vec![TestStep::new("2", "Do it", "")]);
    }

    #[test]
    fn test_steps_nested_in_shared_step_groups_are_found() {
        let markup = r#"<steps>
            <compref id="2" ref="42">
                <step id="3" type="ActionStep"><parameterizedString>Inner</parameterizedString></step>
            </compref>
            <step id="4" type="ActionStep"><parameterizedString>Outer</parameterizedString></step>
        </steps>"#;
        let actions: Vec<String> = parse_test_steps(markup).into_iter().map(|s| s.action).collect();
        assert_eq!(actions, vec!["Inner", "Outer"]);
    }
}
