//! Deterministic clinical risk scoring.
//!
//! ```text
//! untrusted field → coerce → per-dimension ScoreResult → ClassifiedPatient
//! ```
//!
//! Scoring never errors. Unreadable fields become data issues on the record,
//! and entries that are not records at all become fallback patients, so the
//! classified list always has one entry per fetched entry.

pub mod classify;
pub mod coerce;
pub mod engine;

pub use classify::{fallback_patient, PROCESSING_ERROR};
pub use coerce::{coerce_decimal, coerce_integer, Coerced};
pub use engine::ScoringEngine;
