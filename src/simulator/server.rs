//! Simulator lifecycle: bind, spawn, return a handle with a shutdown channel.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::sync::oneshot;

use super::router::{simulator_router, SimulatorConfig, SimulatorState};

#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("Failed to bind simulator: {0}")]
    Bind(#[source] std::io::Error),

    #[error("Failed to get simulator address: {0}")]
    Address(#[source] std::io::Error),
}

/// Handle to a running simulator.
pub struct SimulatorHandle {
    addr: SocketAddr,
    state: Arc<SimulatorState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl SimulatorHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Root URL to hand to `ApiConfig`, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn request_count(&self) -> usize {
        self.state.request_count()
    }

    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Simulator shutdown signal sent");
        }
    }
}

impl Drop for SimulatorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start the simulator on `ip` with an ephemeral port.
pub async fn start_simulator(
    config: SimulatorConfig,
    ip: IpAddr,
) -> Result<SimulatorHandle, SimulatorError> {
    let listener = tokio::net::TcpListener::bind(SocketAddr::new(ip, 0))
        .await
        .map_err(SimulatorError::Bind)?;
    let addr = listener.local_addr().map_err(SimulatorError::Address)?;

    let state = Arc::new(SimulatorState::new(config));
    let app = simulator_router(state.clone());
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };

        tracing::info!(%addr, "Simulator started");
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Simulator error: {e}");
        }
        tracing::info!("Simulator stopped");
    });

    Ok(SimulatorHandle {
        addr,
        state,
        shutdown_tx: Some(shutdown_tx),
    })
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::buckets::RiskBuckets;
    use crate::config::ApiConfig;
    use crate::ingest::{FetchError, HttpPatientApi, IngestError, Ingestor};
    use crate::scoring::ScoringEngine;
    use crate::session::{IngestionStatus, RiskSession};
    use crate::simulator::Fault;

    const KEY: &str = "sim-key";

    async fn start(config: SimulatorConfig) -> SimulatorHandle {
        start_simulator(config, IpAddr::V4(Ipv4Addr::LOCALHOST))
            .await
            .expect("simulator should start")
    }

    fn api_config(sim: &SimulatorHandle, key: &str) -> ApiConfig {
        ApiConfig::new(&sim.base_url(), key).without_delays()
    }

    #[tokio::test]
    async fn start_and_stop() {
        let mut sim = start(SimulatorConfig::reliable(KEY)).await;
        assert!(sim.addr().port() > 0);

        let url = format!("{}/patients", sim.base_url());
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
        assert_eq!(sim.request_count(), 1);

        sim.shutdown();
    }

    #[tokio::test]
    async fn ingests_every_page_over_http() {
        let sim = start(SimulatorConfig::reliable(KEY)).await;
        let config = api_config(&sim, KEY);
        let ingestor = Ingestor::new(HttpPatientApi::new(&config).unwrap(), &config);

        let mut progress = Vec::new();
        let report = ingestor.run(|p| progress.push(p)).await.unwrap();
        assert_eq!(report.received(), 20);
        assert_eq!(report.total_pages, 4);
        assert!(report.is_complete());
        assert_eq!(progress, vec![25.0, 50.0, 75.0, 100.0]);
        assert_eq!(sim.request_count(), 4);
    }

    #[tokio::test]
    async fn recovers_from_scripted_faults() {
        let config = SimulatorConfig::reliable(KEY)
            .with_faults(1, vec![Fault::Status(429), Fault::Status(500)])
            .with_faults(3, vec![Fault::Status(503), Fault::AlternateShape]);
        let sim = start(config).await;
        let config = api_config(&sim, KEY);
        let ingestor = Ingestor::new(HttpPatientApi::new(&config).unwrap(), &config);

        let report = ingestor.run(|_| {}).await.unwrap();
        assert_eq!(report.received(), 20);
        assert!(report.skipped_pages.is_empty());
        // 4 pages + 2 retries on page 1 + 1 retry on page 3.
        assert_eq!(sim.request_count(), 7);
    }

    #[tokio::test]
    async fn malformed_later_page_is_skipped() {
        let config = SimulatorConfig::reliable(KEY).with_faults(2, vec![Fault::MalformedBody]);
        let sim = start(config).await;
        let config = api_config(&sim, KEY);
        let ingestor = Ingestor::new(HttpPatientApi::new(&config).unwrap(), &config);

        let report = ingestor.run(|_| {}).await.unwrap();
        assert_eq!(report.received(), 15);
        assert_eq!(report.skipped_pages.len(), 1);
        assert_eq!(report.skipped_pages[0].page, 2);
    }

    #[tokio::test]
    async fn wrong_key_fails_on_first_page() {
        let sim = start(SimulatorConfig::reliable(KEY)).await;
        let config = api_config(&sim, "wrong");
        let ingestor = Ingestor::new(HttpPatientApi::new(&config).unwrap(), &config);

        let err = ingestor.run(|_| {}).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::FirstPageUnavailable(FetchError::HttpError(401))
        ));
        assert_eq!(sim.request_count(), 1);
    }

    #[tokio::test]
    async fn session_end_to_end() {
        let sim = start(SimulatorConfig::reliable(KEY)).await;
        let config = api_config(&sim, KEY);
        let session = RiskSession::new(
            HttpPatientApi::new(&config).unwrap(),
            &config,
            ScoringEngine::default(),
        );

        let snapshot = session.refresh().await.unwrap();
        assert_eq!(snapshot.status, IngestionStatus::Complete);
        assert_eq!(snapshot.patients.len(), 20);

        let buckets = session.buckets();
        assert_eq!(buckets.stats.total, 20);
        assert_eq!(buckets.stats.high_risk, 8);
        assert_eq!(buckets.stats.fever, 8);
        assert_eq!(buckets.stats.data_issues, 11);
        assert!(RiskBuckets::ids(&buckets.high_risk).contains(&"DEMO019".to_string()));
    }

    #[tokio::test]
    async fn noisy_simulator_still_yields_data() {
        // Default fault rates, zero backoff, generous retry budget.
        let sim = start(SimulatorConfig::new(KEY)).await;
        let mut config = api_config(&sim, KEY);
        config.max_retries = 10;
        let ingestor = Ingestor::new(HttpPatientApi::new(&config).unwrap(), &config);

        let report = ingestor.run(|_| {}).await.unwrap();
        assert_eq!(report.received(), 20);
    }
}
