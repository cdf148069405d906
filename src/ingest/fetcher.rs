//! Single-page fetch with retry and backoff.

use std::time::Duration;

use tracing::Instrument;

use super::client::PatientApi;
use super::error::FetchError;
use super::normalize::parse_body;
use super::retry::{RetryPolicy, RetryStep};
use crate::config::ApiConfig;
use crate::models::CanonicalPage;

/// Fetches one page at a time, retrying transient failures.
pub struct PageFetcher<A> {
    api: A,
    policy: RetryPolicy,
    page_size: u32,
}

impl<A: PatientApi> PageFetcher<A> {
    pub fn new(api: A, config: &ApiConfig) -> Self {
        Self {
            api,
            policy: RetryPolicy::new(config.backoff.clone()),
            page_size: config.page_size,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch and normalize `page`, making at most `max_retries` attempts.
    ///
    /// Only the final outcome is returned: transient errors are absorbed
    /// while attempts remain.
    pub async fn fetch_page(&self, page: u32, max_retries: u32) -> Result<CanonicalPage, FetchError> {
        let span = tracing::info_span!("fetch_page", page);
        self.fetch_with_retry(page, max_retries).instrument(span).await
    }

    async fn fetch_with_retry(&self, page: u32, max_retries: u32) -> Result<CanonicalPage, FetchError> {
        let mut attempt = 1;
        loop {
            tracing::debug!(attempt, limit = self.page_size, "Requesting page");

            let error = match self.attempt(page).await {
                Ok(canonical) => {
                    tracing::info!(
                        attempt,
                        records = canonical.records.len(),
                        total_pages = canonical.pagination.total_pages,
                        "Fetched page"
                    );
                    return Ok(canonical);
                }
                Err(e) => e,
            };

            match self.policy.next_step(&error, attempt, max_retries) {
                RetryStep::Retry { delay, next_attempt } => {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay_ms(delay),
                        error = %error,
                        "Page request failed, retrying"
                    );
                    sleep(delay).await;
                    attempt = next_attempt;
                }
                RetryStep::Exhausted => {
                    tracing::warn!(attempt, error = %error, "Page request failed, retries exhausted");
                    return Err(error);
                }
                RetryStep::NonRetryable => {
                    tracing::warn!(attempt, error = %error, "Page request failed, not retryable");
                    return Err(error);
                }
            }
        }
    }

    /// One request: status check, decode, normalize.
    async fn attempt(&self, page: u32) -> Result<CanonicalPage, FetchError> {
        let response = self.api.get_page(page, self.page_size).await?;
        if let Some(error) = FetchError::from_status(response.status) {
            return Err(error);
        }
        parse_body(&response.body)
    }
}

/// Whole milliseconds for log fields, saturating at `u64::MAX`.
fn delay_ms(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

async fn sleep(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
