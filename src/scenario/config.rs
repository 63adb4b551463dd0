//! Scenario definitions
//!
//! Defines the YAML scenario file format and the validated `Scenario`
//! the runner consumes.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::expect::Expectation;
use super::step::{Extracted, RequestSpec, Step};
use crate::common::{Error, Result};

/// A scenario file as written on disk
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// Base URL used when none is given on the command line
    pub base_url: Option<String>,
    /// Values available to templates as `{{vars.<name>}}`
    #[serde(default)]
    pub vars: BTreeMap<String, Value>,
    /// The sequence of steps to execute
    pub steps: Vec<StepConfig>,
}

/// A single step in a scenario file
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    /// Unique step name, also the template namespace for its values
    pub name: String,
    /// Name of an earlier step that must pass first
    pub depends_on: Option<String>,
    /// The request to send
    pub request: RequestSpec,
    /// Expected outcome; an empty expectation accepts any JSON response
    #[serde(default)]
    pub expect: Expectation,
    /// Values to publish on success: name -> pointer into the body
    #[serde(default)]
    pub extract: BTreeMap<String, String>,
}

impl From<StepConfig> for Step {
    fn from(config: StepConfig) -> Self {
        let expectation = Expectation {
            extract: config.extract,
            ..config.expect
        };
        let step = Step::new(config.name, config.request, expectation);
        match config.depends_on {
            Some(dependency) => step.depends_on(dependency),
            None => step,
        }
    }
}

/// A named, ordered list of steps
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub base_url: Option<String>,
    pub vars: Extracted,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            base_url: None,
            vars: Extracted::new(),
            steps: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Load and validate a scenario from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a scenario from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: ScenarioFile = serde_yaml::from_str(content)?;
        let scenario = Self {
            name: file.name,
            description: file.description,
            base_url: file.base_url,
            vars: file.vars,
            steps: file.steps.into_iter().map(Step::from).collect(),
        };
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check step names and that every dependency points backwards
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(Error::invalid_scenario(&self.name, "scenario has no steps"));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.name.is_empty() {
                return Err(Error::invalid_scenario(&self.name, "step with empty name"));
            }
            if step.name.contains(['.', '{', '}']) {
                return Err(Error::invalid_scenario(
                    &self.name,
                    format!(
                        "step name '{}' must not contain '.', '{{' or '}}'",
                        step.name
                    ),
                ));
            }
            if matches!(step.name.as_str(), "vars" | "base") {
                return Err(Error::invalid_scenario(
                    &self.name,
                    format!("step name '{}' is reserved", step.name),
                ));
            }
            if let Some(dependency) = &step.depends_on {
                if !seen.contains(dependency.as_str()) {
                    return Err(Error::invalid_scenario(
                        &self.name,
                        format!(
                            "step '{}' depends on '{}', which is not declared before it",
                            step.name, dependency
                        ),
                    ));
                }
            }
            if !seen.insert(step.name.as_str()) {
                return Err(Error::invalid_scenario(
                    &self.name,
                    format!("duplicate step name '{}'", step.name),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use serde_json::json;
    use std::io::Write;

    const REGISTER_LOGIN: &str = r#"
name: register-then-login
description: Register a fresh customer and log in with the same credentials
base_url: http://127.0.0.1:3000/api
vars:
  password: TestPass123!
steps:
  - name: register
    request:
      method: POST
      path: /auth/register
      body:
        first_name: Jane
        last_name: Smith
        email: "jane+{{vars.run_id}}@example.com"
        password: "{{vars.password}}"
        phone: "9876543216"
        role: customer
    expect:
      status: 201
      success: true
      fields:
        - path: /data/user/role
          equals: customer
    extract:
      token: /data/token
  - name: login
    depends_on: register
    request:
      method: POST
      path: /auth/login
      body:
        email: "{{register.request.email}}"
        password: "{{register.request.password}}"
    expect:
      status: 200
      success: true
"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_yaml(REGISTER_LOGIN).unwrap();
        assert_eq!(scenario.name, "register-then-login");
        assert_eq!(
            scenario.base_url.as_deref(),
            Some("http://127.0.0.1:3000/api")
        );
        assert_eq!(scenario.vars["password"], json!("TestPass123!"));
        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(scenario.steps[0].request.method, Method::Post);
        assert_eq!(scenario.steps[1].depends_on.as_deref(), Some("register"));

        let verdict = scenario.steps[0].predicate.evaluate(
            201,
            &json!({"success": true, "data": {"user": {"role": "customer"}, "token": "t"}}),
        );
        assert!(verdict.passed);
        assert_eq!(verdict.extracted["token"], json!("t"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", REGISTER_LOGIN).unwrap();
        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.steps[0].name, "register");
    }

    #[test]
    fn test_forward_dependency_rejected() {
        let yaml = r#"
name: bad
steps:
  - name: login
    depends_on: register
    request: { method: POST, path: /auth/login }
  - name: register
    request: { method: POST, path: /auth/register }
"#;
        let err = Scenario::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("not declared before it"), "{}", err);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let yaml = r#"
name: dup
steps:
  - name: health
    request: { path: /health }
  - name: health
    request: { path: /health }
"#;
        let err = Scenario::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate step name"));
    }

    #[test]
    fn test_invalid_step_names_rejected() {
        let scenario = Scenario::new("s").step(Step::new(
            "auth.login",
            RequestSpec::get("/x"),
            Expectation::new(),
        ));
        assert!(scenario.validate().is_err());

        let scenario = Scenario::new("s").step(Step::new(
            "vars",
            RequestSpec::get("/x"),
            Expectation::new(),
        ));
        assert!(scenario.validate().is_err());

        assert!(Scenario::new("empty").validate().is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let yaml = r#"
name: typo
steps:
  - name: health
    request: { path: /health }
    expect: { stauts: 200 }
"#;
        assert!(matches!(
            Scenario::from_yaml(yaml).unwrap_err(),
            Error::Yaml(_)
        ));
    }
}
