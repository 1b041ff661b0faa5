use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use autohome_core::adapters::{ConsoleFeedback, SystemClock};
use autohome_core::configs::Settings;
use autohome_core::{AutoHome, Collaborators, action_names};
use clap::builder::PossibleValuesParser;
use clap::{ArgAction, Parser};
use tracing::Level;

/// Runs one home automation action and prints its result.
#[derive(Debug, Parser)]
#[command(name = "autohome", version)]
struct Cli {
    /// Action to run
    #[arg(value_parser = PossibleValuesParser::new(action_names()))]
    action: String,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Directory holding the configuration files
    #[arg(long, env = "AUTOHOME_CONFIG_DIR", default_value = "configs")]
    config_dir: PathBuf,
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

fn init_tracing(verbose: u8) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME").replace('-', "_");
            let level = log_level(verbose).as_str().to_lowercase();

            format!("{app_name}={level},autohome_core={level}").into()
        }))
        .init();
}

fn execute(cli: &Cli, clock: Arc<SystemClock>) -> anyhow::Result<Option<String>> {
    let settings = Settings::from_dir(&cli.config_dir)
        .with_context(|| format!("Failed to load settings from {}", cli.config_dir.display()))?;

    let collaborators = Collaborators::from_settings(&settings, clock, Arc::new(ConsoleFeedback))
        .context("Failed to set up the hardware")?;
    let home = AutoHome::new(&settings, collaborators);

    home.dispatch(&cli.action)
        .with_context(|| format!("Action '{}' failed", cli.action))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let clock = Arc::new(SystemClock::new());

    match execute(&cli, clock) {
        Ok(Some(output)) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
