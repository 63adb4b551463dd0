//! Placeholder expansion for step requests
//!
//! Placeholders look like `{{namespace.key}}`. Namespaces are `vars`,
//! `base` and the names of steps that already passed.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::step::{Extracted, RequestSpec};
use crate::common::{join_url, url_origin};
use crate::http::HttpRequest;

/// `{{ reference }}`; group 1 is the trimmed reference
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("placeholder pattern is valid")
});

/// A placeholder with no value behind it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved(pub String);

/// Values visible to the step about to run
#[derive(Debug, Clone, Default)]
pub struct Context {
    namespaces: BTreeMap<String, Extracted>,
}

impl Context {
    pub fn new(base_url: &str, vars: Extracted) -> Self {
        let mut base = Extracted::new();
        base.insert("url".to_string(), Value::from(base_url));
        base.insert("origin".to_string(), Value::from(url_origin(base_url)));

        let mut namespaces = BTreeMap::new();
        namespaces.insert("vars".to_string(), vars);
        namespaces.insert("base".to_string(), base);
        Self { namespaces }
    }

    /// Make a passed step's values visible to later steps
    pub fn publish(&mut self, step: &str, values: Extracted) {
        self.namespaces.insert(step.to_string(), values);
    }

    /// Look up `namespace.key`; the key itself may contain dots
    pub fn lookup(&self, reference: &str) -> Option<&Value> {
        let (namespace, key) = reference.split_once('.')?;
        self.namespaces.get(namespace)?.get(key)
    }

    /// Expand every placeholder in `input` as text
    pub fn render_str(&self, input: &str) -> Result<String, Unresolved> {
        let mut out = String::with_capacity(input.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(input) {
            let (Some(whole), Some(reference)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let reference = reference.as_str();
            let value = self
                .lookup(reference)
                .ok_or_else(|| Unresolved(reference.to_string()))?;

            out.push_str(&input[last..whole.start()]);
            out.push_str(&value_to_text(value));
            last = whole.end();
        }

        out.push_str(&input[last..]);
        Ok(out)
    }

    /// Expand placeholders inside a JSON body
    ///
    /// A string that is exactly one placeholder takes the referenced
    /// value as-is, keeping its JSON type.
    pub fn render_value(&self, value: &Value) -> Result<Value, Unresolved> {
        match value {
            Value::String(s) => {
                if let Some(reference) = sole_placeholder(s) {
                    return self
                        .lookup(reference)
                        .cloned()
                        .ok_or_else(|| Unresolved(reference.to_string()));
                }
                self.render_str(s).map(Value::String)
            }
            Value::Array(items) => items
                .iter()
                .map(|v| self.render_value(v))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut rendered = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    rendered.insert(k.clone(), self.render_value(v)?);
                }
                Ok(Value::Object(rendered))
            }
            other => Ok(other.clone()),
        }
    }

    /// Resolve a request template into a request for `base_url`
    pub fn render_request(
        &self,
        spec: &RequestSpec,
        base_url: &str,
        default_headers: &BTreeMap<String, String>,
    ) -> Result<HttpRequest, Unresolved> {
        let path = self.render_str(&spec.path)?;

        let mut headers = Vec::with_capacity(default_headers.len() + spec.headers.len());
        for (name, value) in default_headers {
            if !spec.headers.contains_key(name) {
                headers.push((name.clone(), self.render_str(value)?));
            }
        }
        for (name, value) in &spec.headers {
            headers.push((name.clone(), self.render_str(value)?));
        }

        let body = match &spec.body {
            Some(body) => Some(self.render_value(body)?),
            None => None,
        };

        Ok(HttpRequest {
            method: spec.method,
            url: join_url(base_url, &path),
            headers,
            body,
        })
    }
}

/// Top-level scalar fields of a sent body, published as `request.<field>`
pub fn request_fields(body: Option<&Value>) -> Extracted {
    let mut fields = Extracted::new();
    if let Some(Value::Object(map)) = body {
        for (k, v) in map {
            if !v.is_object() && !v.is_array() {
                fields.insert(format!("request.{}", k), v.clone());
            }
        }
    }
    fields
}

fn sole_placeholder(s: &str) -> Option<&str> {
    let caps = PLACEHOLDER.captures(s)?;
    let whole = caps.get(0)?;
    if whole.start() == 0 && whole.end() == s.len() {
        caps.get(1).map(|m| m.as_str())
    } else {
        None
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use serde_json::json;

    fn context() -> Context {
        let mut vars = Extracted::new();
        vars.insert("run_id".into(), json!("r42"));
        let mut ctx = Context::new("http://127.0.0.1:3000/api", vars);

        let mut register = Extracted::new();
        register.insert("token".into(), json!("tok"));
        register.insert("user_id".into(), json!(7));
        register.extend(request_fields(Some(&json!({
            "email": "jane+r42@example.com",
            "password": "TestPass123!",
            "profile": {"nested": true}
        }))));
        ctx.publish("register", register);
        ctx
    }

    #[test]
    fn test_render_str() {
        let ctx = context();
        assert_eq!(
            ctx.render_str("/users/{{register.user_id}}?run={{ vars.run_id }}")
                .unwrap(),
            "/users/7?run=r42"
        );
        assert_eq!(ctx.render_str("no placeholders").unwrap(), "no placeholders");
        assert_eq!(ctx.render_str("dangling {{ brace").unwrap(), "dangling {{ brace");
    }

    #[test]
    fn test_unresolved_placeholder() {
        let ctx = context();
        assert_eq!(
            ctx.render_str("{{login.token}}"),
            Err(Unresolved("login.token".to_string()))
        );
        assert_eq!(
            ctx.render_str("{{nodot}}"),
            Err(Unresolved("nodot".to_string()))
        );
    }

    #[test]
    fn test_render_value_keeps_types() {
        let ctx = context();
        let body = json!({
            "email": "{{register.request.email}}",
            "user": "{{register.user_id}}",
            "label": "user-{{register.user_id}}",
            "tags": ["{{vars.run_id}}", 3]
        });
        assert_eq!(
            ctx.render_value(&body).unwrap(),
            json!({
                "email": "jane+r42@example.com",
                "user": 7,
                "label": "user-7",
                "tags": ["r42", 3]
            })
        );
    }

    #[test]
    fn test_request_fields_skip_nested() {
        let ctx = context();
        assert!(ctx.lookup("register.request.profile").is_none());
        assert_eq!(
            ctx.lookup("register.request.password"),
            Some(&json!("TestPass123!"))
        );
    }

    #[test]
    fn test_render_request() {
        let ctx = context();
        let spec = RequestSpec::get("{{base.origin}}/")
            .header("Authorization", "Bearer {{register.token}}");
        let mut defaults = BTreeMap::new();
        defaults.insert("Authorization".to_string(), "ignored".to_string());
        defaults.insert("User-Agent".to_string(), "probe".to_string());

        let request = ctx.render_request(&spec, "http://127.0.0.1:3000/api", &defaults).unwrap();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.url, "http://127.0.0.1:3000/");
        assert_eq!(
            request.headers,
            vec![
                ("User-Agent".to_string(), "probe".to_string()),
                ("Authorization".to_string(), "Bearer tok".to_string()),
            ]
        );
        assert!(request.body.is_none());
    }
}
