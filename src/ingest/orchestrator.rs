//! Ingestion orchestrator.
//!
//! Page 1 is fetched first to learn the page count, then pages
//! `2..=total_pages` are fetched strictly in order. A failed later page is
//! skipped; a failed first page ends the cycle.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;

use super::client::PatientApi;
use super::error::{FetchError, IngestError};
use super::fetcher::PageFetcher;
use crate::config::ApiConfig;

/// A page that was given up after its retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPage {
    pub page: u32,
    pub reason: String,
}

/// Result of one ingestion cycle.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    /// Raw records from every successful page, in page order.
    pub records: Vec<Value>,
    pub total_pages: u32,
    /// `total` as declared by page 1.
    pub expected_records: u32,
    pub pages_fetched: u32,
    pub skipped_pages: Vec<SkippedPage>,
}

impl IngestionReport {
    pub fn received(&self) -> usize {
        self.records.len()
    }

    /// At least as many records as page 1 announced.
    pub fn is_complete(&self) -> bool {
        self.records.len() >= self.expected_records as usize
    }

    /// Non-fatal warning to surface when records are missing.
    pub fn shortfall_warning(&self) -> Option<String> {
        if self.is_complete() {
            return None;
        }
        Some(format!(
            "Only {} of {} expected records were retrieved",
            self.records.len(),
            self.expected_records
        ))
    }
}

/// Drives one full pass over the paginated patient API.
pub struct Ingestor<A> {
    fetcher: PageFetcher<A>,
    max_retries: u32,
    inter_page_delay: Duration,
}

impl<A: PatientApi> Ingestor<A> {
    pub fn new(api: A, config: &ApiConfig) -> Self {
        Self {
            fetcher: PageFetcher::new(api, config),
            max_retries: config.max_retries,
            inter_page_delay: config.inter_page_delay,
        }
    }

    pub fn api(&self) -> &A {
        self.fetcher.api()
    }

    /// Run one ingestion cycle. `on_progress` receives a percentage in
    /// `[0, 100]` after each successful page.
    pub async fn run<P>(&self, on_progress: P) -> Result<IngestionReport, IngestError>
    where
        P: FnMut(f64) + Send,
    {
        let span = tracing::info_span!("ingest", page_size = self.fetcher.page_size());
        self.run_inner(on_progress).instrument(span).await
    }

    async fn run_inner<P>(&self, mut on_progress: P) -> Result<IngestionReport, IngestError>
    where
        P: FnMut(f64) + Send,
    {
        tracing::info!(max_retries = self.max_retries, "Starting ingestion");

        let first = match self.fetcher.fetch_page(1, self.max_retries).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(error = %e, "First page unavailable, aborting ingestion");
                return Err(IngestError::FirstPageUnavailable(e));
            }
        };

        let total_pages = first.pagination.total_pages;
        let mut report = IngestionReport {
            records: first.records,
            total_pages,
            expected_records: first.pagination.total,
            pages_fetched: 1,
            skipped_pages: Vec::new(),
        };
        on_progress(progress_percent(1, total_pages));

        for page in 2..=total_pages {
            if !self.inter_page_delay.is_zero() {
                tokio::time::sleep(self.inter_page_delay).await;
            }

            match self.fetcher.fetch_page(page, self.max_retries).await {
                Ok(canonical) => {
                    report.records.extend(canonical.records);
                    report.pages_fetched += 1;
                    on_progress(progress_percent(page, total_pages));
                }
                Err(e) => {
                    tracing::warn!(page, error = %e, "Skipping page after failed fetch");
                    report.skipped_pages.push(skipped(page, &e));
                }
            }
        }

        if report.records.is_empty() {
            tracing::error!(total_pages, "Ingestion finished with no records");
            return Err(IngestError::NoDataRetrieved);
        }

        if let Some(warning) = report.shortfall_warning() {
            tracing::warn!(
                received = report.received(),
                expected = report.expected_records,
                skipped = report.skipped_pages.len(),
                "{warning}"
            );
        }

        tracing::info!(
            received = report.received(),
            pages_fetched = report.pages_fetched,
            total_pages,
            "Ingestion complete"
        );
        Ok(report)
    }
}

fn skipped(page: u32, error: &FetchError) -> SkippedPage {
    SkippedPage {
        page,
        reason: error.to_string(),
    }
}

/// `page / total_pages` as a percentage, clamped to `[0, 100]`.
fn progress_percent(page: u32, total_pages: u32) -> f64 {
    if total_pages == 0 {
        return 100.0;
    }
    (f64::from(page) / f64::from(total_pages) * 100.0).clamp(0.0, 100.0)
}
