//! Scenario runner
//!
//! Executes steps strictly in declaration order, one request at a time.
//! Failures are recorded per step and never abort the run, so every
//! declared step ends up in the report as passed, failed or skipped.

use std::collections::BTreeMap;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde_json::Value;

use super::config::Scenario;
use super::report::{Report, StepError, StepResult, StepStatus};
use super::step::{Extracted, Step};
use super::template::{request_fields, Context, Unresolved};
use crate::common::Error;
use crate::http::Transport;

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs steps against a backend through a `Transport`
pub struct Runner<T: Transport> {
    transport: T,
    timeout: Duration,
    default_headers: BTreeMap<String, String>,
}

impl<T: Transport> Runner<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            timeout: DEFAULT_TIMEOUT,
            default_headers: BTreeMap::new(),
        }
    }

    /// Abort requests that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Headers added to every request unless the step sets them itself
    pub fn with_default_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.default_headers = headers;
        self
    }

    /// Run an ad-hoc list of steps
    pub async fn run(&self, base_url: &str, steps: &[Step]) -> Report {
        self.execute("steps", None, base_url, steps, Extracted::new())
            .await
    }

    /// Run a scenario, exposing its variables to the step templates
    ///
    /// `vars.run_id` is filled with a per-run nonce unless the scenario
    /// defines it.
    pub async fn run_scenario(&self, base_url: &str, scenario: &Scenario) -> Report {
        let mut vars = scenario.vars.clone();
        vars.entry("run_id".to_string())
            .or_insert_with(|| Value::from(run_id()));

        self.execute(
            &scenario.name,
            scenario.description.clone(),
            base_url,
            &scenario.steps,
            vars,
        )
        .await
    }

    async fn execute(
        &self,
        name: &str,
        description: Option<String>,
        base_url: &str,
        steps: &[Step],
        vars: Extracted,
    ) -> Report {
        tracing::info!("Running scenario '{}' against {}", name, base_url);

        let mut context = Context::new(base_url, vars);
        let mut results: Vec<StepResult> = Vec::with_capacity(steps.len());

        for step in steps {
            let result = self.run_step(step, base_url, &results, &mut context).await;

            match result.status {
                StepStatus::Passed => tracing::info!("Step '{}' passed", step.name),
                StepStatus::Skipped => tracing::info!(
                    "Step '{}' skipped: {}",
                    step.name,
                    result.error.as_ref().map(|e| e.message.as_str()).unwrap_or("")
                ),
                StepStatus::Failed => tracing::warn!(
                    "Step '{}' failed: {}",
                    step.name,
                    result.error.as_ref().map(|e| e.message.as_str()).unwrap_or("")
                ),
            }

            results.push(result);
        }

        Report::new(name.to_string(), description, base_url.to_string(), results)
    }

    async fn run_step(
        &self,
        step: &Step,
        base_url: &str,
        previous: &[StepResult],
        context: &mut Context,
    ) -> StepResult {
        if let Some(dependency) = &step.depends_on {
            match previous.iter().find(|r| &r.step_name == dependency) {
                Some(r) if r.is_passed() => {}
                Some(r) => {
                    let state = match r.status {
                        StepStatus::Skipped => "was skipped",
                        _ => "failed",
                    };
                    return StepResult::skipped(
                        &step.name,
                        format!("dependency '{}' {}", dependency, state),
                    );
                }
                None => {
                    return StepResult::skipped(
                        &step.name,
                        format!("dependency '{}' has not run before this step", dependency),
                    );
                }
            }
        }

        let request = match context.render_request(&step.request, base_url, &self.default_headers)
        {
            Ok(request) => request,
            Err(Unresolved(reference)) => {
                return StepResult::skipped(
                    &step.name,
                    format!("no value for '{{{{{}}}}}'", reference),
                );
            }
        };

        let sent_fields = request_fields(request.body.as_ref());
        let url = request.url.clone();
        let started = Instant::now();

        tracing::debug!("Step '{}': {} {}", step.name, request.method, url);

        let response = match tokio::time::timeout(self.timeout, self.transport.send(request)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return failed(step, None, None, &e, started),
            Err(_) => {
                let e = Error::Timeout {
                    url,
                    secs: self.timeout.as_secs(),
                };
                return failed(step, None, None, &e, started);
            }
        };

        let body: Value = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(e) => {
                let e = Error::Parse(e.to_string());
                return failed(step, Some(response.status), Some(response.body), &e, started);
            }
        };

        let verdict = step.predicate.evaluate(response.status, &body);
        if !verdict.passed {
            let message = verdict
                .message
                .unwrap_or_else(|| "predicate rejected the response".to_string());
            let e = Error::Assertion(message);
            return failed(step, Some(response.status), Some(response.body), &e, started);
        }

        let mut published = sent_fields;
        published.extend(verdict.extracted.clone());
        context.publish(&step.name, published);

        StepResult {
            step_name: step.name.clone(),
            status: StepStatus::Passed,
            http_status: Some(response.status),
            raw_body: Some(response.body),
            extracted: verdict.extracted,
            error: None,
            duration_ms: elapsed_ms(started),
        }
    }
}

fn failed(
    step: &Step,
    http_status: Option<u16>,
    raw_body: Option<String>,
    error: &Error,
    started: Instant,
) -> StepResult {
    StepResult {
        step_name: step.name.clone(),
        status: StepStatus::Failed,
        http_status,
        raw_body,
        extracted: Extracted::new(),
        error: Some(StepError::from(error)),
        duration_ms: elapsed_ms(started),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
}

/// Nonce that keeps generated emails unique across runs
fn run_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{:x}", nanos)
}
