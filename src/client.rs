/// Authenticated HTTP access to the work-tracking service
///
/// This module handles:
/// - Basic authentication with a personal access token
/// - GET requests returning parsed JSON
/// - Downgrading every failure to an empty result
///
/// The pipeline issues many dependent calls, so a single failed request is
/// logged and reported as "no data" rather than aborting the run.
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, error};
use serde_json::{Map, Value};
use std::time::Duration;

const USER_AGENT: &str = concat!("testplan-export/", env!("CARGO_PKG_VERSION"));

/// Response header carrying the paging cursor
pub const CONTINUATION_HEADER: &str = "x-ms-continuationtoken";

/// Longest body excerpt written to the log for failed requests
const ERROR_BODY_PREVIEW: usize = 1000;

/// One fetched page: the JSON body and an optional cursor to the next page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub body: Value,
    pub continuation_token: Option<String>,
}

impl Page {
    /// The "no data" page returned for every failure
    pub fn empty() -> Self {
        Self { body: Value::Object(Map::new()), continuation_token: None }
    }

    pub fn new(body: Value) -> Self {
        Self { body, continuation_token: None }
    }

    pub fn with_continuation(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        match &self.body {
            Value::Object(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }
}

/// Read-only access to the remote service.
///
/// Implementations never fail: any error becomes `Page::empty()`.
pub trait RemoteClient: Sync {
    fn fetch_page(&self, url: &str) -> Page;

    fn fetch(&self, url: &str) -> Value {
        self.fetch_page(url).body
    }
}

impl<T: RemoteClient + ?Sized> RemoteClient for &T {
    fn fetch_page(&self, url: &str) -> Page {
        (**self).fetch_page(url)
    }
}

/// Build the `Authorization` header value for a personal access token
pub fn basic_auth_header(pat: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!(":{}", pat)))
}

/// `ureq`-backed client for Azure DevOps
pub struct AzureDevOpsClient {
    agent: ureq::Agent,
    auth_header: String,
}

impl AzureDevOpsClient {
    pub fn new(pat: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).user_agent(USER_AGENT).build();
        Self { agent, auth_header: basic_auth_header(pat) }
    }
}

impl RemoteClient for AzureDevOpsClient {
    fn fetch_page(&self, url: &str) -> Page {
        debug!("GET {}", url);

        let response = match self
            .agent
            .get(url)
            .set("Authorization", &self.auth_header)
            .set("Content-Type", "application/json")
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                error!("HTTP error {} for {}", code, url);
                error!("Response text: {}", preview(&body, ERROR_BODY_PREVIEW));
                return Page::empty();
            }
            Err(e) => {
                error!("Request error for {}: {}", url, e);
                return Page::empty();
            }
        };

        debug!("Response status code: {}", response.status());
        let continuation_token =
            response.header(CONTINUATION_HEADER).map(str::to_string).filter(|t| !t.is_empty());

        let text = match response.into_string() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to read response body for {}: {}", url, e);
                return Page::empty();
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(body) => {
                log_body_shape(&body);
                match continuation_token {
                    Some(token) => Page::new(body).with_continuation(token),
                    None => Page::new(body),
                }
            }
            Err(e) => {
                error!("JSON decode error for {}: {}", url, e);
                error!("Response text: {}", preview(&text, ERROR_BODY_PREVIEW));
                Page::empty()
            }
        }
    }
}

fn log_body_shape(body: &Value) {
    match body {
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("value") {
                debug!("Response contains {} items in 'value' array", items.len());
            } else {
                debug!("Response received. Data keys: {:?}", map.keys().collect::<Vec<_>>());
            }
        }
        _ => debug!("Non-object response body"),
    }
}

/// Truncate `text` to at most `max` characters for logging
fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
