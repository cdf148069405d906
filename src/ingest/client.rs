//! Patient API transport.
//!
//! [`PatientApi`] is the seam between the retry logic and the network: it
//! performs exactly one request and reports the raw status and body. Status
//! interpretation, decoding, and retrying all happen above it.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::error::FetchError;
use crate::config::ApiConfig;

/// Header carrying the static API credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Status and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// One request for one page. Errors are transport-level only; any HTTP
/// status, including failures, comes back as a [`RawResponse`].
pub trait PatientApi: Send + Sync {
    fn get_page(
        &self,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = Result<RawResponse, FetchError>> + Send;
}

// ═══════════════════════════════════════════════════════════
// HTTP implementation
// ═══════════════════════════════════════════════════════════

/// `GET {base}/patients?page={p}&limit={n}` over reqwest.
pub struct HttpPatientApi {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpPatientApi {
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_connect() {
            FetchError::Transport(format!("Patient API unreachable at {}", self.base_url))
        } else if e.is_timeout() {
            FetchError::Transport("Request timed out".into())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

impl PatientApi for HttpPatientApi {
    async fn get_page(&self, page: u32, limit: u32) -> Result<RawResponse, FetchError> {
        let url = format!("{}/patients", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("page", page), ("limit", limit)])
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        Ok(RawResponse { status, body })
    }
}

// ═══════════════════════════════════════════════════════════
// Scripted implementation
// ═══════════════════════════════════════════════════════════

/// Scripted API for tests. Each page answers from its own queue, then
/// falls back to the page's default response.
pub struct MockPatientApi {
    scripts: Mutex<HashMap<u32, VecDeque<Result<RawResponse, FetchError>>>>,
    defaults: HashMap<u32, RawResponse>,
    latency: Duration,
    calls: AtomicUsize,
    calls_per_page: Mutex<HashMap<u32, usize>>,
}

impl MockPatientApi {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            defaults: HashMap::new(),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            calls_per_page: Mutex::new(HashMap::new()),
        }
    }

    /// Answer every unscripted request for `page` with `response`.
    pub fn with_page(mut self, page: u32, response: RawResponse) -> Self {
        self.defaults.insert(page, response);
        self
    }

    /// Queue one-shot outcomes for `page`, consumed before the default.
    pub fn with_script(self, page: u32, outcomes: Vec<Result<RawResponse, FetchError>>) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(page).or_default().extend(outcomes);
        }
        self
    }

    /// Delay every answer by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, page: u32) -> usize {
        self.calls_per_page
            .lock()
            .map(|calls| calls.get(&page).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn next_outcome(&self, page: u32) -> Result<RawResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.calls_per_page.lock() {
            *calls.entry(page).or_insert(0) += 1;
        }

        let scripted = self
            .scripts
            .lock()
            .ok()
            .and_then(|mut scripts| scripts.get_mut(&page).and_then(VecDeque::pop_front));

        scripted.unwrap_or_else(|| {
            Ok(self
                .defaults
                .get(&page)
                .cloned()
                .unwrap_or_else(|| RawResponse::new(404, r#"{"error":"Page not found"}"#)))
        })
    }
}

impl Default for MockPatientApi {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientApi for MockPatientApi {
    async fn get_page(&self, page: u32, _limit: u32) -> Result<RawResponse, FetchError> {
        let outcome = self.next_outcome(page);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_serves_script_then_default() {
        let api = MockPatientApi::new()
            .with_page(1, RawResponse::new(200, "ok"))
            .with_script(
                1,
                vec![
                    Ok(RawResponse::new(503, "")),
                    Err(FetchError::Transport("reset".into())),
                ],
            );

        assert_eq!(api.get_page(1, 5).await.unwrap().status, 503);
        assert!(api.get_page(1, 5).await.is_err());
        assert_eq!(api.get_page(1, 5).await.unwrap().body, "ok");
        assert_eq!(api.get_page(1, 5).await.unwrap().body, "ok");
        assert_eq!(api.calls_for(1), 4);
        assert_eq!(api.total_calls(), 4);
    }

    #[tokio::test]
    async fn mock_unknown_page_is_404() {
        let api = MockPatientApi::new();
        assert_eq!(api.get_page(7, 5).await.unwrap().status, 404);
        assert_eq!(api.calls_for(7), 1);
        assert_eq!(api.calls_for(1), 0);
    }

    #[test]
    fn http_api_trims_trailing_slash() {
        let api = HttpPatientApi::new(&ApiConfig::new("http://localhost:8080/api/", "k")).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8080/api");
    }

    #[tokio::test]
    async fn http_api_reports_unreachable_host_as_transport() {
        // Port 9 (discard) on localhost is not expected to be listening.
        let api = HttpPatientApi::new(&ApiConfig::new("http://127.0.0.1:9", "k")).unwrap();
        let err = api.get_page(1, 5).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert!(err.is_retryable());
    }
}
