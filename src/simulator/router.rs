//! `GET /patients` with fault injection.
//!
//! Each request first checks the API key, then picks at most one fault:
//! a scripted fault for the page if one is queued, otherwise a random one
//! drawn from the configured rates. The dataset itself never changes.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::data::sample_patients;
use crate::ingest::API_KEY_HEADER;

/// Largest page the simulator will serve.
pub const MAX_PAGE_SIZE: u32 = 20;

const DEFAULT_LIMIT: u32 = 5;

/// One way a response can go wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Reply with this status and a JSON error body.
    Status(u16),
    /// 200 with a truncated JSON body.
    MalformedBody,
    /// 200 with valid JSON in neither accepted shape.
    UnknownShape,
    /// 200 in the `patients` + `current_page` shape.
    AlternateShape,
}

/// Simulator behavior. Rates are probabilities in `[0, 1]` per request.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub api_key: String,
    pub rate_limit_rate: f64,
    pub server_error_rate: f64,
    pub alternate_shape_rate: f64,
    pub seed: u64,
    pub patients: Vec<Value>,
    /// Faults served, in order, before any random draw for that page.
    pub scripted_faults: HashMap<u32, Vec<Fault>>,
}

impl SimulatorConfig {
    /// Unreliable defaults close to the production API's observed behavior.
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            rate_limit_rate: 0.05,
            server_error_rate: 0.08,
            alternate_shape_rate: 0.1,
            seed: 0x5eed,
            patients: sample_patients(),
            scripted_faults: HashMap::new(),
        }
    }

    /// No random faults. Scripted faults still apply.
    pub fn reliable(api_key: &str) -> Self {
        Self {
            rate_limit_rate: 0.0,
            server_error_rate: 0.0,
            alternate_shape_rate: 0.0,
            ..Self::new(api_key)
        }
    }

    pub fn with_faults(mut self, page: u32, faults: Vec<Fault>) -> Self {
        self.scripted_faults.entry(page).or_default().extend(faults);
        self
    }

    pub fn with_patients(mut self, patients: Vec<Value>) -> Self {
        self.patients = patients;
        self
    }
}

/// Shared state behind the router.
pub struct SimulatorState {
    config: SimulatorConfig,
    rng: Mutex<StdRng>,
    scripts: Mutex<HashMap<u32, VecDeque<Fault>>>,
    requests: AtomicUsize,
}

impl SimulatorState {
    pub fn new(config: SimulatorConfig) -> Self {
        let scripts = config
            .scripted_faults
            .iter()
            .map(|(page, faults)| (*page, faults.iter().cloned().collect()))
            .collect();
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(config.seed)),
            scripts: Mutex::new(scripts),
            requests: AtomicUsize::new(0),
            config,
        }
    }

    /// Requests received so far, rejected ones included.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn next_fault(&self, page: u32) -> Option<Fault> {
        let scripted = self
            .scripts
            .lock()
            .ok()
            .and_then(|mut scripts| scripts.get_mut(&page).and_then(VecDeque::pop_front));
        if scripted.is_some() {
            return scripted;
        }

        let mut rng = self.rng.lock().ok()?;
        let roll: f64 = rng.gen();
        let config = &self.config;
        if roll < config.rate_limit_rate {
            Some(Fault::Status(429))
        } else if roll < config.rate_limit_rate + config.server_error_rate {
            Some(Fault::Status(if rng.gen_bool(0.5) { 500 } else { 503 }))
        } else if rng.gen::<f64>() < config.alternate_shape_rate {
            Some(Fault::AlternateShape)
        } else {
            None
        }
    }
}

/// Build the simulator router.
pub fn simulator_router(state: Arc<SimulatorState>) -> Router {
    Router::new()
        .route("/patients", get(list_patients))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<u32>,
    limit: Option<u32>,
}

async fn list_patients(
    State(state): State<Arc<SimulatorState>>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);

    let authorized = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|key| key == state.config.api_key);
    if !authorized {
        tracing::debug!("Simulator rejected request without a valid API key");
        return error_response(StatusCode::UNAUTHORIZED, "Invalid or missing API key");
    }

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_PAGE_SIZE);
    let fault = state.next_fault(page);
    if let Some(fault) = &fault {
        tracing::debug!(page, ?fault, "Simulator injecting fault");
    }

    let slice = PageSlice::new(&state.config.patients, page, limit);
    match fault {
        None => Json(slice.primary()).into_response(),
        Some(Fault::AlternateShape) => Json(slice.alternate()).into_response(),
        Some(Fault::Status(code)) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_response(status, "Simulated failure")
        }
        Some(Fault::MalformedBody) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            r#"{"data": [{"patient_id": "DEMO0"#,
        )
            .into_response(),
        Some(Fault::UnknownShape) => Json(json!({"results": slice.records})).into_response(),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

// ── Internal ──

struct PageSlice {
    records: Vec<Value>,
    page: u32,
    limit: u32,
    total: u32,
    total_pages: u32,
}

impl PageSlice {
    fn new(patients: &[Value], page: u32, limit: u32) -> Self {
        let total = u32::try_from(patients.len()).unwrap_or(u32::MAX);
        let start = (page as usize - 1).saturating_mul(limit as usize);
        let records = patients
            .iter()
            .skip(start)
            .take(limit as usize)
            .cloned()
            .collect();
        Self {
            records,
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }

    fn primary(self) -> Value {
        json!({
            "data": self.records,
            "pagination": {
                "page": self.page,
                "limit": self.limit,
                "total": self.total,
                "totalPages": self.total_pages,
                "hasNext": self.page < self.total_pages,
                "hasPrevious": self.page > 1,
            },
            "metadata": {
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "version": "v1.0",
                "requestId": Uuid::new_v4().simple().to_string(),
            }
        })
    }

    fn alternate(self) -> Value {
        let count = self.records.len();
        json!({
            "patients": self.records,
            "count": count,
            "total_records": self.total,
            "per_page": self.limit,
            "current_page": self.page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const KEY: &str = "test-key";

    fn app(config: SimulatorConfig) -> (Router, Arc<SimulatorState>) {
        let state = Arc::new(SimulatorState::new(config));
        (simulator_router(state.clone()), state)
    }

    fn request(uri: &str, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(k) = key {
            builder = builder.header(API_KEY_HEADER, k);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 65536).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_or_wrong_key_is_401() {
        let (app, state) = app(SimulatorConfig::reliable(KEY));

        let response = app.clone().oneshot(request("/patients", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.oneshot(request("/patients", Some("nope"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(state.request_count(), 2);
    }

    #[tokio::test]
    async fn serves_primary_shape_pages() {
        let (app, _) = app(SimulatorConfig::reliable(KEY));

        let response = app
            .oneshot(request("/patients?page=2&limit=5", Some(KEY)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
        assert_eq!(body["data"][0]["patient_id"], "DEMO006");
        assert_eq!(body["pagination"]["total"], 20);
        assert_eq!(body["pagination"]["totalPages"], 4);
        assert_eq!(body["pagination"]["hasNext"], true);
        assert_eq!(body["pagination"]["hasPrevious"], true);
        assert_eq!(body["metadata"]["version"], "v1.0");
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let (app, _) = app(SimulatorConfig::reliable(KEY));
        let response = app
            .oneshot(request("/patients?page=9&limit=5", Some(KEY)))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert!(body["data"].as_array().unwrap().is_empty());
        assert_eq!(body["pagination"]["hasNext"], false);
    }

    #[tokio::test]
    async fn limit_is_clamped() {
        let (app, _) = app(SimulatorConfig::reliable(KEY));
        let response = app
            .oneshot(request("/patients?page=1&limit=500", Some(KEY)))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["pagination"]["limit"], 20);
        assert_eq!(body["pagination"]["totalPages"], 1);
    }

    #[tokio::test]
    async fn scripted_faults_are_served_in_order() {
        let config = SimulatorConfig::reliable(KEY).with_faults(
            1,
            vec![Fault::Status(429), Fault::Status(503), Fault::AlternateShape],
        );
        let (app, _) = app(config);

        let r = app.clone().oneshot(request("/patients?page=1", Some(KEY))).await.unwrap();
        assert_eq!(r.status(), StatusCode::TOO_MANY_REQUESTS);

        let r = app.clone().oneshot(request("/patients?page=1", Some(KEY))).await.unwrap();
        assert_eq!(r.status(), StatusCode::SERVICE_UNAVAILABLE);

        let r = app.clone().oneshot(request("/patients?page=1", Some(KEY))).await.unwrap();
        let body = body_json(r).await;
        assert_eq!(body["current_page"], 1);
        assert_eq!(body["total_records"], 20);
        assert_eq!(body["patients"].as_array().unwrap().len(), 5);

        let r = app.oneshot(request("/patients?page=1", Some(KEY))).await.unwrap();
        let body = body_json(r).await;
        assert!(body.get("data").is_some());
    }

    #[tokio::test]
    async fn malformed_and_unknown_shape_faults() {
        let config = SimulatorConfig::reliable(KEY)
            .with_faults(1, vec![Fault::MalformedBody, Fault::UnknownShape]);
        let (app, _) = app(config);

        let r = app.clone().oneshot(request("/patients?page=1", Some(KEY))).await.unwrap();
        assert_eq!(r.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(r.into_body(), 65536).await.unwrap();
        assert!(serde_json::from_slice::<Value>(&bytes).is_err());

        let r = app.oneshot(request("/patients?page=1", Some(KEY))).await.unwrap();
        let body = body_json(r).await;
        assert!(body.get("results").is_some());
    }

    #[tokio::test]
    async fn custom_dataset_drives_pagination() {
        let patients = (0..7).map(|i| json!({"patient_id": format!("X{i}")})).collect();
        let (app, _) = app(SimulatorConfig::reliable(KEY).with_patients(patients));

        let response = app
            .oneshot(request("/patients?page=2&limit=5", Some(KEY)))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["pagination"]["total"], 7);
        assert_eq!(body["pagination"]["totalPages"], 2);
    }

    #[test]
    fn random_faults_follow_rates() {
        let always_limited = SimulatorConfig {
            rate_limit_rate: 1.0,
            ..SimulatorConfig::reliable(KEY)
        };
        let state = SimulatorState::new(always_limited);
        for _ in 0..10 {
            assert_eq!(state.next_fault(1), Some(Fault::Status(429)));
        }

        let state = SimulatorState::new(SimulatorConfig::reliable(KEY));
        for _ in 0..10 {
            assert_eq!(state.next_fault(1), None);
        }
    }

    #[test]
    fn same_seed_same_faults() {
        let config = SimulatorConfig::new(KEY);
        let a = SimulatorState::new(config.clone());
        let b = SimulatorState::new(config);
        let faults_a: Vec<_> = (0..50).map(|_| a.next_fault(1)).collect();
        let faults_b: Vec<_> = (0..50).map(|_| b.next_fault(1)).collect();
        assert_eq!(faults_a, faults_b);
    }
}
