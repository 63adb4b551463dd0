//! Step definitions and the predicate seam

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::http::Method;

/// Values a passed step publishes for the steps declared after it
pub type Extracted = BTreeMap<String, Value>;

/// Outcome of applying a predicate to a response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verdict {
    pub passed: bool,
    /// Why the predicate failed (or a note when it passed)
    pub message: Option<String>,
    pub extracted: Extracted,
}

impl Verdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            ..Self::default()
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: Some(message.into()),
            extracted: Extracted::new(),
        }
    }

    /// Publish a value under `key` for later steps
    pub fn extract(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extracted.insert(key.into(), value.into());
        self
    }
}

impl From<std::result::Result<(), String>> for Verdict {
    fn from(result: std::result::Result<(), String>) -> Self {
        match result {
            Ok(()) => Verdict::pass(),
            Err(message) => Verdict::fail(message),
        }
    }
}

/// Pass/fail decision over an HTTP status code and a parsed JSON body
pub trait Predicate: Send + Sync {
    fn evaluate(&self, status: u16, body: &Value) -> Verdict;
}

impl<F> Predicate for F
where
    F: Fn(u16, &Value) -> Verdict + Send + Sync,
{
    fn evaluate(&self, status: u16, body: &Value) -> Verdict {
        self(status, body)
    }
}

/// Request template of a step
///
/// `path`, header values and body strings may contain `{{ns.key}}`
/// placeholders that are resolved right before the request is sent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestSpec {
    #[serde(default)]
    pub method: Method,
    pub path: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// One request plus its expected outcome
#[derive(Clone)]
pub struct Step {
    pub name: String,
    pub request: RequestSpec,
    pub predicate: Arc<dyn Predicate>,
    /// Name of an earlier step that must have passed
    pub depends_on: Option<String>,
}

impl Step {
    pub fn new(
        name: impl Into<String>,
        request: RequestSpec,
        predicate: impl Predicate + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            request,
            predicate: Arc::new(predicate),
            depends_on: None,
        }
    }

    pub fn depends_on(mut self, step: impl Into<String>) -> Self {
        self.depends_on = Some(step.into());
        self
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("request", &self.request)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}
