//! Ingestion error taxonomy.
//!
//! `FetchError` is per page and mostly contained by the fetcher's retry
//! loop. `IngestError` is what a whole ingestion cycle can end with.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rate limited by the patient API (HTTP 429)")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("HTTP error! status: {0}")]
    HttpError(u16),

    #[error("Invalid JSON response from server: {0}")]
    MalformedJson(String),

    #[error("Invalid response structure: {0}")]
    InvalidResponseShape(String),
}

impl FetchError {
    /// Whether another attempt at the same page may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::RateLimited | Self::ServerError(_)
        )
    }

    /// Map a non-success HTTP status to its error. `None` for 2xx.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            429 => Some(Self::RateLimited),
            500..=u16::MAX => Some(Self::ServerError(status)),
            _ => Some(Self::HttpError(status)),
        }
    }
}

#[derive(Error, Debug)]
pub enum IngestError {
    /// Without page 1 the total page count is unknown, so nothing is usable.
    #[error("Ingestion failed: first page unavailable ({0})")]
    FirstPageUnavailable(#[source] FetchError),

    #[error("Ingestion failed: no data retrieved")]
    NoDataRetrieved,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(FetchError::from_status(200), None);
        assert_eq!(FetchError::from_status(204), None);
        assert_eq!(FetchError::from_status(429), Some(FetchError::RateLimited));
        assert_eq!(FetchError::from_status(500), Some(FetchError::ServerError(500)));
        assert_eq!(FetchError::from_status(503), Some(FetchError::ServerError(503)));
        assert_eq!(FetchError::from_status(404), Some(FetchError::HttpError(404)));
        assert_eq!(FetchError::from_status(401), Some(FetchError::HttpError(401)));
        assert_eq!(FetchError::from_status(302), Some(FetchError::HttpError(302)));
    }

    #[test]
    fn retry_classification() {
        assert!(FetchError::Transport("reset".into()).is_retryable());
        assert!(FetchError::RateLimited.is_retryable());
        assert!(FetchError::ServerError(503).is_retryable());
        assert!(!FetchError::HttpError(404).is_retryable());
        assert!(!FetchError::MalformedJson("eof".into()).is_retryable());
        assert!(!FetchError::InvalidResponseShape("no data".into()).is_retryable());
    }

    #[test]
    fn ingest_error_messages() {
        let err = IngestError::FirstPageUnavailable(FetchError::ServerError(500));
        assert_eq!(
            err.to_string(),
            "Ingestion failed: first page unavailable (Server error: 500)"
        );
        assert_eq!(
            IngestError::NoDataRetrieved.to_string(),
            "Ingestion failed: no data retrieved"
        );
    }
}
