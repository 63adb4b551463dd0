//! Error types for authprobe
//!
//! Transport, parse and assertion errors are captured per step by the
//! runner and never abort a run. Everything else (bad scenario files,
//! unreadable config) propagates to the CLI.

use thiserror::Error;

use crate::scenario::FailureKind;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for authprobe
#[derive(Error, Debug)]
pub enum Error {
    // === Transport Errors ===
    #[error("Connection to {url} failed: {message}. Is the backend running?")]
    Connection { url: String, message: String },

    #[error("Request to {url} timed out after {secs} seconds")]
    Timeout { url: String, secs: u64 },

    // === Response Errors ===
    #[error("Response body is not valid JSON: {0}")]
    Parse(String),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    // === Scenario Errors ===
    #[error("Invalid scenario '{scenario}': {reason}")]
    InvalidScenario { scenario: String, reason: String },

    #[error("Unknown built-in scenario '{0}'. Use 'authprobe list' to see available scenarios")]
    UnknownBuiltin(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a connection error for a request URL
    pub fn connection(url: &str, message: impl ToString) -> Self {
        Self::Connection {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an invalid scenario error
    pub fn invalid_scenario(scenario: &str, reason: impl ToString) -> Self {
        Self::InvalidScenario {
            scenario: scenario.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Per-step failure category for this error
    ///
    /// Anything that is not a response or assertion problem happened
    /// before a response arrived, so it counts as a connection failure.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::Parse(_) | Error::Json(_) => FailureKind::ParseError,
            Error::Assertion(_) => FailureKind::AssertionFailure,
            _ => FailureKind::ConnectionError,
        }
    }
}
