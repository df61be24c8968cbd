//! The action entry point.

use std::process::ExitCode;

use return_dispatch::{
    config::Config,
    context::Context,
    env::{API_URL, EnvInputs, RUNNER_DEBUG, error_command, set_output},
    marker::DistinctMarker,
    transactions::return_dispatch,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `RUST_LOG` environment variable (if set)
/// 2. `RUNNER_DEBUG=1` sets level to DEBUG
/// 3. Default is INFO
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if *RUNNER_DEBUG {
            EnvFilter::new("return_dispatch=debug")
        } else {
            EnvFilter::new("return_dispatch=info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

async fn run() -> anyhow::Result<()> {
    let config = Config::resolve(&EnvInputs)?;
    let cx = Context::new(config, &API_URL)?;
    let marker = DistinctMarker::new();

    let outcome = return_dispatch(&cx, &marker).await?;
    for (name, value) in outcome.outputs() {
        if !set_output(name, &value)? {
            info!("GITHUB_OUTPUT is not set, output {name}={value}");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("failed to complete: {err:#}");
            warn!("does the token have the correct permissions?");
            println!("{}", error_command(&format!("failed to complete: {err:#}")));
            ExitCode::FAILURE
        }
    }
}
