//! Resilient paginated ingestion.
//!
//! ```text
//! Ingestor ──► PageFetcher ──► PatientApi (one HTTP exchange)
//!                  │
//!                  ├── RetryPolicy (429 / 5xx / transport backoff)
//!                  └── normalize  (two wire shapes ──► CanonicalPage)
//! ```
//!
//! Pages are fetched sequentially. Transient failures are absorbed inside
//! the fetcher; the ingestor only sees each page's final outcome.

pub mod client;
pub mod error;
pub mod fetcher;
pub mod normalize;
pub mod orchestrator;
pub mod retry;

pub use client::{HttpPatientApi, MockPatientApi, PatientApi, RawResponse, API_KEY_HEADER};
pub use error::{FetchError, IngestError};
pub use fetcher::PageFetcher;
pub use normalize::{normalize, parse_body};
pub use orchestrator::{IngestionReport, Ingestor, SkippedPage};
pub use retry::{exponential_delay, RetryPolicy, RetryStep};
