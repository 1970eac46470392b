use std::process::ExitCode;

use log::{error, info};

use penumbra::{DemoConfig, RunError, run};

fn load_config() -> Result<DemoConfig, RunError> {
    match std::env::args().nth(1) {
        Some(path) => Ok(DemoConfig::load(path)?),
        None => {
            info!("No config file given, using defaults");
            Ok(DemoConfig::default())
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match load_config().and_then(run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
