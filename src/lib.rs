pub mod app;
pub mod buckets;
pub mod config;
pub mod ingest;
pub mod models;
pub mod scoring;
pub mod session;
pub mod simulator;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Riskwatch starting v{}", config::APP_VERSION);

    match app::run_once() {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Riskwatch run failed");
            eprintln!("riskwatch: {e}");
            ExitCode::FAILURE
        }
    }
}
