use std::process::ExitCode;
use std::sync::Arc;

use autohome_core::adapters::{LogFeedback, SystemClock};
use autohome_core::configs::Settings;
use autohome_core::{AutoHome, Collaborators};
use autohome_server::run;

fn main() -> ExitCode {
    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load settings: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME").replace('-', "_");
            let level = settings.logger.level.as_str();

            format!("{app_name}={level},autohome_core={level},tower_http={level}").into()
        }))
        .init();

    // The local offset can only be read while the process is single-threaded.
    let clock = Arc::new(SystemClock::new());
    let collaborators = match Collaborators::from_settings(&settings, clock, Arc::new(LogFeedback)) {
        Ok(collaborators) => collaborators,
        Err(e) => {
            tracing::error!("Failed to set up the hardware: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let home = Arc::new(AutoHome::new(&settings, collaborators));

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start the runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&settings, home)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Server stopped: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
