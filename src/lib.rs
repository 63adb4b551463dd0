//! authprobe - scenario runner for user-authentication HTTP APIs
//!
//! This library runs declarative request/expectation steps against a
//! backend and produces a structured report of what passed, failed or
//! was skipped.

pub mod cli;
pub mod commands;
pub mod common;
pub mod http;
pub mod scenario;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use scenario::{Report, Runner, Scenario, Step, StepStatus};
