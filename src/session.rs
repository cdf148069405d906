//! Presentation-facing ingestion session.
//!
//! A `RiskSession` owns the latest dataset and its status. `refresh()` runs
//! a full cycle (ingest, classify, publish) and is single-flight: a second
//! call while one is running is rejected instead of queued.
//!
//! Readers call `snapshot()` at any time, including mid-cycle, to render
//! progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::buckets::RiskBuckets;
use crate::config::ApiConfig;
use crate::ingest::{IngestError, IngestionReport, Ingestor, PatientApi};
use crate::models::ClassifiedPatient;
use crate::scoring::ScoringEngine;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("An ingestion cycle is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Terminal or in-progress state of the last cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IngestionStatus {
    Idle,
    Loading,
    Complete,
    /// Fewer records than page 1 announced.
    Partial { received: usize, expected: usize },
    Failed { message: String },
}

/// Everything the dashboard needs to render.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: IngestionStatus,
    /// Percentage in `[0, 100]`.
    pub progress: f64,
    pub patients: Vec<ClassifiedPatient>,
    pub warning: Option<String>,
}

impl SessionSnapshot {
    fn idle() -> Self {
        Self {
            status: IngestionStatus::Idle,
            progress: 0.0,
            patients: Vec::new(),
            warning: None,
        }
    }

    fn loading() -> Self {
        Self {
            status: IngestionStatus::Loading,
            ..Self::idle()
        }
    }
}

pub struct RiskSession<A> {
    ingestor: Ingestor<A>,
    engine: ScoringEngine,
    state: RwLock<SessionSnapshot>,
    in_flight: AtomicBool,
}

impl<A: PatientApi> RiskSession<A> {
    pub fn new(api: A, config: &ApiConfig, engine: ScoringEngine) -> Self {
        Self {
            ingestor: Ingestor::new(api, config),
            engine,
            state: RwLock::new(SessionSnapshot::idle()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn api(&self) -> &A {
        self.ingestor.api()
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read().clone()
    }

    pub fn progress(&self) -> f64 {
        self.read().progress
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Buckets over the currently published patients.
    pub fn buckets(&self) -> RiskBuckets {
        RiskBuckets::from_patients(&self.read().patients, self.engine.thresholds())
    }

    /// Run one full cycle from page 1 and publish the result.
    ///
    /// The published snapshot is also returned. On ingestion failure the
    /// session moves to `Failed` and the error is returned.
    pub async fn refresh(&self) -> Result<SessionSnapshot, SessionError> {
        let _guard = InFlightGuard::try_acquire(&self.in_flight).ok_or_else(|| {
            tracing::warn!("Refresh requested while a cycle is running");
            SessionError::AlreadyRunning
        })?;

        *self.write() = SessionSnapshot::loading();

        let result = self
            .ingestor
            .run(|progress| self.write().progress = progress)
            .await;

        match result {
            Ok(report) => Ok(self.publish(report)),
            Err(e) => {
                let mut state = self.write();
                state.status = IngestionStatus::Failed {
                    message: e.to_string(),
                };
                state.patients.clear();
                Err(e.into())
            }
        }
    }

    fn publish(&self, report: IngestionReport) -> SessionSnapshot {
        let patients = self.engine.classify_all(&report.records);
        let status = if report.is_complete() {
            IngestionStatus::Complete
        } else {
            IngestionStatus::Partial {
                received: report.received(),
                expected: report.expected_records as usize,
            }
        };

        let snapshot = SessionSnapshot {
            status,
            progress: 100.0,
            patients,
            warning: report.shortfall_warning(),
        };
        *self.write() = snapshot.clone();
        snapshot
    }

    // ── Internal ──

    fn read(&self) -> RwLockReadGuard<'_, SessionSnapshot> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionSnapshot> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Holds the single-flight flag for the lifetime of one cycle. Dropping the
/// guard clears the flag, including when the cycle's future is dropped.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
