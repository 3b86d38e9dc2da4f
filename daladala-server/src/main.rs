//! daladala: live transit vehicle tracking server.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use daladala_core::TrackingConfig;

mod web;

#[derive(Parser)]
#[command(
    name = "daladala",
    version,
    about = "Daladala Live — live transit vehicle position tracking"
)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "DALADALA_HOST")]
    host: String,

    /// Port to bind
    #[arg(long, default_value = "8000", env = "DALADALA_PORT")]
    port: u16,

    /// Seconds of silence before a vehicle is marked stale
    #[arg(long, env = "DALADALA_STALE_AFTER_SECS")]
    stale_after_secs: f64,

    /// Seconds of silence before a vehicle is marked offline
    /// (must exceed --stale-after-secs)
    #[arg(long, env = "DALADALA_OFFLINE_AFTER_SECS")]
    offline_after_secs: f64,

    /// Max seconds a report's producer timestamp may run ahead of the
    /// server clock
    #[arg(long, env = "DALADALA_FUTURE_SKEW_SECS")]
    future_skew_secs: f64,

    /// Seconds between reaper sweeps
    #[arg(long, env = "DALADALA_REAPER_INTERVAL_SECS")]
    reaper_interval_secs: f64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match TrackingConfig::new(
        cli.stale_after_secs,
        cli.offline_after_secs,
        cli.future_skew_secs,
        cli.reaper_interval_secs,
    ) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = web::serve(config, cli.host, cli.port).await {
        tracing::error!(error = %err, "server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
