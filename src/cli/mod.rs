//! CLI command handling
//!
//! Resolves settings from flags, scenario files and the config file,
//! runs the scenario and prints the report.

use std::time::Duration;

use colored::Colorize;
use serde_json::Value;

use crate::commands::{Commands, RunOptions};
use crate::common::config::{Config, OutputFormat};
use crate::common::Result;
use crate::http::HttpClient;
use crate::scenario::{self, Report, Runner, Scenario};

/// Dispatch a CLI command
///
/// Returns `Ok(false)` when a scenario ran but did not fully pass.
pub async fn dispatch(command: Commands) -> Result<bool> {
    match command {
        Commands::Run { path, options } => {
            let scenario = Scenario::load(&path)?;
            run(scenario, options).await
        }

        Commands::Builtin { name, options } => {
            let scenario = scenario::builtin(&name)?;
            run(scenario, options).await
        }

        Commands::List => {
            println!("{}", "Built-in scenarios:".cyan());
            for (name, description) in scenario::BUILTINS {
                println!("  {:<14} {}", name.white().bold(), description.dimmed());
            }
            Ok(true)
        }
    }
}

/// Settings for one run after applying precedence rules
#[derive(Debug, PartialEq)]
struct Resolved {
    base_url: String,
    timeout: Duration,
    format: OutputFormat,
}

/// CLI flag > scenario file > config file > built-in default
fn resolve(options: &RunOptions, scenario: &Scenario, config: &Config) -> Resolved {
    let base_url = options
        .base_url
        .clone()
        .or_else(|| scenario.base_url.clone())
        .unwrap_or_else(|| config.defaults.base_url.clone());

    let timeout = options
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.timeouts.request());

    Resolved {
        base_url,
        timeout,
        format: options.format.unwrap_or(config.defaults.format),
    }
}

async fn run(mut scenario: Scenario, options: RunOptions) -> Result<bool> {
    let config = match &options.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    for (key, value) in &options.vars {
        scenario.vars.insert(key.clone(), Value::from(value.as_str()));
    }

    let settings = resolve(&options, &scenario, &config);
    tracing::debug!("Resolved settings: {:?}", settings);

    let client = HttpClient::new(settings.timeout)?;
    let runner = Runner::new(client)
        .with_timeout(settings.timeout)
        .with_default_headers(config.headers.clone());

    let report = runner.run_scenario(&settings.base_url, &scenario).await;
    print_report(&report, settings.format, options.verbose)?;

    Ok(report.is_success())
}

fn print_report(report: &Report, format: OutputFormat, verbose: bool) -> Result<()> {
    match format {
        OutputFormat::Text => report.print(verbose),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}
