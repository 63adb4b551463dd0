//! Declarative expectations for YAML scenarios
//!
//! An `Expectation` is a `Predicate` built from data: every configured
//! check must hold, then the `extract` pointers are read from the body.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use super::step::{Predicate, Verdict};

/// Accepted HTTP status code(s)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StatusMatcher {
    One(u16),
    AnyOf(Vec<u16>),
}

impl StatusMatcher {
    pub fn matches(&self, status: u16) -> bool {
        match self {
            StatusMatcher::One(expected) => *expected == status,
            StatusMatcher::AnyOf(expected) => expected.contains(&status),
        }
    }
}

impl fmt::Display for StatusMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMatcher::One(code) => write!(f, "{}", code),
            StatusMatcher::AnyOf(codes) => write!(f, "one of {:?}", codes),
        }
    }
}

/// Assertion on a single value inside the response body
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldAssertion {
    /// JSON pointer (`/data/user/role`) or dotted path (`data.user.role`)
    pub path: String,
    /// Expected value (exact match)
    pub equals: Option<Value>,
    /// The value must be present (null counts as present)
    #[serde(default)]
    pub exists: bool,
    /// The value must be present and not null, "", [] or {}
    #[serde(default)]
    pub not_empty: bool,
}

/// Expected outcome of a step
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    /// Expected HTTP status
    pub status: Option<StatusMatcher>,
    /// Expected value of the top-level `success` flag
    pub success: Option<bool>,
    /// Substring of the top-level `message`
    pub message_contains: Option<String>,
    /// A validation error in `errors[]` must reference this field
    pub error_field: Option<String>,
    /// Body field assertions
    #[serde(default)]
    pub fields: Vec<FieldAssertion>,
    /// Values to publish on success: name -> pointer into the body
    #[serde(skip)]
    pub extract: BTreeMap<String, String>,
}

impl Expectation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(StatusMatcher::One(status));
        self
    }

    pub fn status_in(mut self, statuses: &[u16]) -> Self {
        self.status = Some(StatusMatcher::AnyOf(statuses.to_vec()));
        self
    }

    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn error_field(mut self, field: impl Into<String>) -> Self {
        self.error_field = Some(field.into());
        self
    }

    pub fn field_equals(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(FieldAssertion {
            path: path.into(),
            equals: Some(value.into()),
            ..FieldAssertion::default()
        });
        self
    }

    pub fn field_exists(mut self, path: impl Into<String>) -> Self {
        self.fields.push(FieldAssertion {
            path: path.into(),
            exists: true,
            ..FieldAssertion::default()
        });
        self
    }

    pub fn field_not_empty(mut self, path: impl Into<String>) -> Self {
        self.fields.push(FieldAssertion {
            path: path.into(),
            not_empty: true,
            ..FieldAssertion::default()
        });
        self
    }

    pub fn extract(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.extract.insert(name.into(), path.into());
        self
    }

    fn check(&self, status: u16, body: &Value) -> std::result::Result<(), String> {
        if let Some(expected) = &self.status {
            if !expected.matches(status) {
                return Err(format!(
                    "expected HTTP {}, got {}{}",
                    expected,
                    status,
                    backend_message(body)
                ));
            }
        }

        if let Some(expected) = self.success {
            match body.get("success").and_then(Value::as_bool) {
                Some(actual) if actual == expected => {}
                Some(actual) => {
                    return Err(format!(
                        "expected success={}, got success={}{}",
                        expected,
                        actual,
                        backend_message(body)
                    ))
                }
                None => {
                    return Err(format!(
                        "expected success={}, but response has no boolean 'success'",
                        expected
                    ))
                }
            }
        }

        if let Some(expected) = &self.message_contains {
            let actual = body.get("message").and_then(Value::as_str).unwrap_or("");
            if !actual.contains(expected.as_str()) {
                return Err(format!(
                    "expected message containing '{}', got '{}'",
                    expected, actual
                ));
            }
        }

        if let Some(field) = &self.error_field {
            let fields = error_fields(body);
            if !fields.iter().any(|f| f == field) {
                return Err(format!(
                    "expected a validation error for '{}', got errors for {:?}",
                    field, fields
                ));
            }
        }

        for assertion in &self.fields {
            check_field(assertion, body)?;
        }

        Ok(())
    }
}

impl Predicate for Expectation {
    fn evaluate(&self, status: u16, body: &Value) -> Verdict {
        if let Err(message) = self.check(status, body) {
            return Verdict::fail(message);
        }

        let mut verdict = Verdict::pass();
        for (name, path) in &self.extract {
            match lookup(body, path) {
                Some(value) => verdict = verdict.extract(name.clone(), value.clone()),
                None => {
                    return Verdict::fail(format!(
                        "cannot extract '{}': no value at '{}'",
                        name, path
                    ))
                }
            }
        }
        verdict
    }
}

fn check_field(assertion: &FieldAssertion, body: &Value) -> std::result::Result<(), String> {
    let value = lookup(body, &assertion.path);

    if (assertion.exists || assertion.not_empty || assertion.equals.is_some()) && value.is_none() {
        return Err(format!("expected a value at '{}', found none", assertion.path));
    }

    if assertion.not_empty && value.map(is_empty).unwrap_or(true) {
        return Err(format!("expected a non-empty value at '{}'", assertion.path));
    }

    if let (Some(expected), Some(actual)) = (&assertion.equals, value) {
        if expected != actual {
            return Err(format!(
                "expected '{}' to be {}, got {}",
                assertion.path, expected, actual
            ));
        }
    }

    Ok(())
}

/// Resolve a JSON pointer or dotted path inside `body`
pub fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() || path.starts_with('/') {
        body.pointer(path)
    } else {
        body.pointer(&format!("/{}", path.replace('.', "/")))
    }
}

/// Null, "", [] and {} are empty
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Field names referenced by `errors[].field`
pub fn error_fields(body: &Value) -> Vec<String> {
    body.get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("field").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn backend_message(body: &Value) -> String {
    match body.get("message").and_then(Value::as_str) {
        Some(message) => format!(" ({})", message),
        None => String::new(),
    }
}
