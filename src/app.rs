//! Command-line run: one refresh, JSON summary on stdout.

use std::net::{IpAddr, Ipv4Addr};

use serde::Serialize;

use crate::buckets::{PatientStats, RiskBuckets};
use crate::config::{self, ApiConfig, ConfigError};
use crate::ingest::{FetchError, HttpPatientApi};
use crate::scoring::ScoringEngine;
use crate::session::{IngestionStatus, RiskSession, SessionError};
use crate::simulator::{start_simulator, SimulatorConfig, SimulatorError, SimulatorHandle};

/// Set to `1` to run against a local simulator instead of the remote API.
pub const ENV_SIMULATE: &str = "RISKWATCH_SIMULATE";

/// Key shared by the CLI and the simulator it starts.
const SIMULATOR_API_KEY: &str = "riskwatch-simulator";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error(transparent)]
    Simulator(#[from] SimulatorError),

    #[error(transparent)]
    Client(#[from] FetchError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Failed to encode summary: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What the CLI prints.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub app: &'static str,
    pub version: &'static str,
    pub status: IngestionStatus,
    pub warning: Option<String>,
    pub stats: PatientStats,
    pub high_risk: Vec<String>,
    pub fever: Vec<String>,
    pub data_issues: Vec<String>,
}

impl RunSummary {
    pub fn new(status: IngestionStatus, warning: Option<String>, buckets: &RiskBuckets) -> Self {
        Self {
            app: config::APP_NAME,
            version: config::APP_VERSION,
            status,
            warning,
            stats: buckets.stats,
            high_risk: RiskBuckets::ids(&buckets.high_risk),
            fever: RiskBuckets::ids(&buckets.fever),
            data_issues: RiskBuckets::ids(&buckets.data_issues),
        }
    }
}

/// Build a runtime and run one cycle, returning the rendered summary.
pub fn run_once() -> Result<String, AppError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(AppError::Runtime)?;
    runtime.block_on(run_cycle())
}

async fn run_cycle() -> Result<String, AppError> {
    let simulate = std::env::var(ENV_SIMULATE).is_ok_and(|v| v == "1");

    // Kept alive until the cycle ends; dropping it stops the server.
    let mut simulator: Option<SimulatorHandle> = None;
    let config = if simulate {
        let sim = start_simulator(
            SimulatorConfig::new(SIMULATOR_API_KEY),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        )
        .await?;
        tracing::info!(base_url = %sim.base_url(), "Using local simulator");
        let config = ApiConfig::new(&sim.base_url(), SIMULATOR_API_KEY).without_delays();
        simulator = Some(sim);
        config
    } else {
        ApiConfig::from_env()?
    };

    let session = RiskSession::new(
        HttpPatientApi::new(&config)?,
        &config,
        ScoringEngine::default(),
    );
    let snapshot = session.refresh().await?;
    let summary = RunSummary::new(snapshot.status, snapshot.warning, &session.buckets());

    if let Some(sim) = simulator.as_mut() {
        sim.shutdown();
    }
    Ok(serde_json::to_string_pretty(&summary)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassifiedPatient;
    use crate::scoring::ScoringEngine;
    use serde_json::json;

    fn patients() -> Vec<ClassifiedPatient> {
        ScoringEngine::default().classify_all(&[
            json!({"patient_id": "A", "blood_pressure": "150/95", "temperature": 101.5, "age": 70}),
            json!({"patient_id": "B", "blood_pressure": "", "temperature": 98.0, "age": 30}),
        ])
    }

    #[test]
    fn summary_lists_bucket_ids() {
        let buckets = RiskBuckets::from_patients(&patients(), &Default::default());
        let summary = RunSummary::new(IngestionStatus::Complete, None, &buckets);
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["app"], "riskwatch");
        assert_eq!(value["status"]["state"], "complete");
        assert_eq!(value["stats"]["total"], 2);
        assert_eq!(value["high_risk"], json!(["A"]));
        assert_eq!(value["fever"], json!(["A"]));
        assert_eq!(value["data_issues"], json!(["B"]));
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let err: AppError = ConfigError::Missing("RISKWATCH_API_KEY").into();
        assert_eq!(err.to_string(), "Missing required setting RISKWATCH_API_KEY");
    }
}
