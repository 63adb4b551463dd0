//! CLI command definitions
//!
//! Defines the clap commands for authprobe.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::common::config::OutputFormat;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario from a YAML file
    Run {
        /// Path to the YAML scenario file
        path: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Run a built-in scenario
    Builtin {
        /// Scenario name (see 'authprobe list')
        name: String,

        #[command(flatten)]
        options: RunOptions,
    },

    /// List built-in scenarios
    List,
}

/// Options shared by every command that runs a scenario
#[derive(Args, Debug, Default)]
pub struct RunOptions {
    /// Backend base URL, including any API prefix (e.g. http://127.0.0.1:3000/api)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Report format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Scenario variable, available as {{vars.KEY}}; can be repeated
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Config file to use instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short)]
    pub verbose: bool,
}

fn parse_var(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}
