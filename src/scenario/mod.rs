//! Scenario runner for user-authentication APIs
//!
//! A scenario is an ordered list of steps. Each step sends one HTTP
//! request and applies a predicate to the response. Steps can depend on
//! earlier steps and reuse the values those steps published.

mod builtin;
mod config;
mod expect;
mod report;
mod runner;
mod step;
mod template;

pub use builtin::{builtin, BUILTINS};
pub use config::{Scenario, ScenarioFile, StepConfig};
pub use expect::{Expectation, FieldAssertion, StatusMatcher};
pub use report::{FailureKind, Report, StepError, StepResult, StepStatus, Summary};
pub use runner::Runner;
pub use step::{Extracted, Predicate, RequestSpec, Step, Verdict};
pub use template::{Context, Unresolved};
