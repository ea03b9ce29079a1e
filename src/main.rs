use std::process::ExitCode;

use party_rsvp::config::AppConfig;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[rocket::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Loading configuration...");
    let rocket = match AppConfig::load().map_err(Into::into).and_then(party_rsvp::rocket) {
        Ok(rocket) => rocket,
        Err(e) => {
            error!("Environment misconfigured: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("Starting server...");
    if let Err(e) = rocket.launch().await {
        error!("Server stopped: {e}");
        return ExitCode::FAILURE;
    }

    info!("Server shutting down...");
    ExitCode::SUCCESS
}
