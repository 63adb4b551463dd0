//! Step results and scenario reports

use colored::Colorize;
use serde::Serialize;

use super::step::Extracted;
use crate::common::{Error, Result};

/// Terminal state of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
}

/// Why a step did not pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// No response: refused, DNS failure, timeout
    ConnectionError,
    /// Response body is not JSON
    ParseError,
    /// Response did not satisfy the step's predicate
    AssertionFailure,
    /// A prerequisite did not pass; the step was never sent
    DependencySkipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepError {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&Error> for StepError {
    fn from(e: &Error) -> Self {
        Self {
            kind: e.failure_kind(),
            message: e.to_string(),
        }
    }
}

/// Outcome of running one step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub step_name: String,
    pub status: StepStatus,
    pub http_status: Option<u16>,
    pub raw_body: Option<String>,
    pub extracted: Extracted,
    pub error: Option<StepError>,
    pub duration_ms: u64,
}

impl StepResult {
    pub fn skipped(step_name: &str, reason: String) -> Self {
        Self {
            step_name: step_name.to_string(),
            status: StepStatus::Skipped,
            http_status: None,
            raw_body: None,
            extracted: Extracted::new(),
            error: Some(StepError {
                kind: FailureKind::DependencySkipped,
                message: reason,
            }),
            duration_ms: 0,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == StepStatus::Passed
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

/// Step counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

impl Summary {
    pub fn from_results(results: &[StepResult]) -> Self {
        let mut summary = Summary {
            total: results.len(),
            ..Summary::default()
        };
        for result in results {
            match result.status {
                StepStatus::Passed => summary.passed += 1,
                StepStatus::Failed => summary.failed += 1,
                StepStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

/// Results of one scenario run, in step declaration order
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub scenario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub base_url: String,
    pub results: Vec<StepResult>,
    pub summary: Summary,
}

impl Report {
    pub fn new(
        scenario: String,
        description: Option<String>,
        base_url: String,
        results: Vec<StepResult>,
    ) -> Self {
        let summary = Summary::from_results(&results);
        Self {
            scenario,
            description,
            base_url,
            results,
            summary,
        }
    }

    /// True when every step passed
    pub fn is_success(&self) -> bool {
        self.summary.failed == 0 && self.summary.skipped == 0
    }

    pub fn result(&self, step_name: &str) -> Option<&StepResult> {
        self.results.iter().find(|r| r.step_name == step_name)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Print a coloured console summary
    pub fn print(&self, verbose: bool) {
        println!(
            "\n{} {}",
            "Running Scenario:".blue().bold(),
            self.scenario.white().bold()
        );
        if let Some(desc) = &self.description {
            println!("  {}", desc.dimmed());
        }
        println!("  Base URL: {}", self.base_url.dimmed());

        println!("\n{}", "Steps:".cyan());
        for (i, result) in self.results.iter().enumerate() {
            print_result(i + 1, result, verbose);
        }

        let s = &self.summary;
        let counts = format!(
            "{} passed, {} failed, {} skipped, {} total",
            s.passed, s.failed, s.skipped, s.total
        );
        if self.is_success() {
            println!("\n{} {}\n", "✓".green().bold(), counts.green().bold());
        } else {
            println!("\n{} {}\n", "✗".red().bold(), counts.red().bold());
        }
    }
}

fn print_result(step_num: usize, result: &StepResult, verbose: bool) {
    let http = result
        .http_status
        .map(|s| format!(" (HTTP {})", s))
        .unwrap_or_default();

    match result.status {
        StepStatus::Passed => println!(
            "  {} Step {}: {}{}",
            "✓".green(),
            step_num,
            result.step_name,
            http.dimmed()
        ),
        StepStatus::Failed => println!(
            "  {} Step {}: {}{}",
            "✗".red(),
            step_num,
            result.step_name,
            http.dimmed()
        ),
        StepStatus::Skipped => println!(
            "  {} Step {}: {} {}",
            "-".yellow(),
            step_num,
            result.step_name,
            "(skipped)".dimmed()
        ),
    }

    if let Some(error) = &result.error {
        println!("      {:?}: {}", error.kind, error.message);
    }

    if verbose {
        for (key, value) in &result.extracted {
            println!("      {} = {}", key.dimmed(), value);
        }
        if result.status == StepStatus::Failed {
            if let Some(body) = &result.raw_body {
                println!("      body: {}", truncate(body, 200).dimmed());
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", s.chars().take(max).collect::<String>())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, status: StepStatus) -> StepResult {
        StepResult {
            step_name: name.to_string(),
            status,
            http_status: Some(200),
            raw_body: Some("{}".to_string()),
            extracted: Extracted::new(),
            error: None,
            duration_ms: 1,
        }
    }

    #[test]
    fn test_summary_counts() {
        let report = Report::new(
            "s".into(),
            None,
            "http://x".into(),
            vec![
                result("a", StepStatus::Passed),
                result("b", StepStatus::Failed),
                StepResult::skipped("c", "dependency 'b' failed".into()),
                result("d", StepStatus::Passed),
            ],
        );
        assert_eq!(
            report.summary,
            Summary {
                passed: 2,
                failed: 1,
                skipped: 1,
                total: 4
            }
        );
        assert!(!report.is_success());
        assert_eq!(
            report.result("c").and_then(StepResult::failure_kind),
            Some(FailureKind::DependencySkipped)
        );
    }

    #[test]
    fn test_empty_report_is_success() {
        let report = Report::new("s".into(), None, "http://x".into(), Vec::new());
        assert!(report.is_success());
        assert_eq!(report.summary.total, 0);
    }

    #[test]
    fn test_json_shape() {
        let report = Report::new(
            "s".into(),
            None,
            "http://x".into(),
            vec![StepResult::skipped("login", "dependency 'register' failed".into())],
        );
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["results"][0]["status"], "skipped");
        assert_eq!(json["results"][0]["error"]["kind"], "DependencySkipped");
        assert_eq!(json["summary"]["skipped"], 1);
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
