//! authprobe - exercise a user-authentication API from the command line
//!
//! Runs declarative scenarios (health, registration, login) against a
//! backend and reports which steps passed, failed or were skipped.

use authprobe::commands::Commands;
use authprobe::{cli, common::logging};
use clap::Parser;

#[derive(Parser)]
#[command(name = "authprobe", about = "Scenario runner for authentication APIs")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Run { options, .. } | Commands::Builtin { options, .. } => options.verbose,
        Commands::List => false,
    };
    logging::init_cli(verbose);

    match cli::dispatch(cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
