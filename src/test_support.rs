//! In-memory `RemoteClient` used by unit tests.
//!
//! Routes map an exact URL to a page; unknown URLs return the empty page,
//! the same as a failed request against the real service.

use crate::api::{Endpoints, PlanApi};
use crate::client::{Page, RemoteClient};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

pub const SERVER: &str = "https://tfs.example.test";

pub fn endpoints() -> Endpoints {
    Endpoints::new(SERVER, "contoso", "shop")
}

#[derive(Default)]
pub struct FakeRemote {
    routes: HashMap<String, Page>,
    calls: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: impl Into<String>, body: Value) -> Self {
        self.routes.insert(url.into(), Page::new(body));
        self
    }

    pub fn route_page(mut self, url: impl Into<String>, page: Page) -> Self {
        self.routes.insert(url.into(), page);
        self
    }

    /// Route a `{"value": [...]}` collection
    pub fn collection(self, url: impl Into<String>, items: Vec<Value>) -> Self {
        let count = items.len();
        self.route(url, json!({ "count": count, "value": items }))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| u.as_str() == url).count()
    }
}

impl RemoteClient for FakeRemote {
    fn fetch_page(&self, url: &str) -> Page {
        self.calls.lock().unwrap().push(url.to_string());
        self.routes.get(url).cloned().unwrap_or_else(Page::empty)
    }
}

pub fn plan_api(remote: &FakeRemote) -> PlanApi<&FakeRemote> {
    PlanApi::new(remote, endpoints())
}

/// Step markup with one `<step>` per (type, action, expected) triple
pub fn steps_markup(steps: &[(&str, &str, &str)]) -> String {
    let mut xml = format!(r#"<steps id="0" last="{}">"#, steps.len() + 1);
    for (i, (kind, action, expected)) in steps.iter().enumerate() {
        xml.push_str(&format!(
            r#"<step id="{}" type="{}"><parameterizedString isformatted="true">{}</parameterizedString><parameterizedString isformatted="true">{}</parameterizedString><description/></step>"#,
            i + 2,
            kind,
            escape(&format!("<DIV><P>{}</P></DIV>", action)),
            escape(&format!("<DIV><P>{}</P></DIV>", expected)),
        ));
    }
    xml.push_str("</steps>");
    xml
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn work_item(id: u64, title: &str, markup: Option<&str>) -> Value {
    let mut fields = json!({
        "System.Title": title,
        "System.CreatedDate": "2023-11-02T08:15:00Z",
        "System.CreatedBy": {"displayName": "Ada Lovelace"},
        "System.AreaPath": "Shop\\Checkout",
        "System.IterationPath": "Shop\\Sprint 1",
    });
    if let Some(markup) = markup {
        fields["Microsoft.VSTS.TCM.Steps"] = json!(markup);
    }
    json!({ "id": id, "fields": fields })
}
