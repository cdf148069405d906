//! Application constants and injected configuration.
//!
//! Everything the core needs to know about the outside world (where the
//! patient API lives, how hard to retry, where the clinical thresholds sit)
//! is carried by the structs in this module and passed in explicitly.

use std::time::Duration;

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "riskwatch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default remote API root.
pub const DEFAULT_BASE_URL: &str = "https://assessment.ksensetech.com/api";

/// Records requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Attempts per page before the page is given up.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Pause between consecutive page fetches.
pub const DEFAULT_INTER_PAGE_DELAY_MS: u64 = 200;

/// Per-request timeout for the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const ENV_BASE_URL: &str = "RISKWATCH_BASE_URL";
const ENV_API_KEY: &str = "RISKWATCH_API_KEY";
const ENV_PAGE_SIZE: &str = "RISKWATCH_PAGE_SIZE";
const ENV_MAX_RETRIES: &str = "RISKWATCH_MAX_RETRIES";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "riskwatch_lib=info,riskwatch=info,warn"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

// ═══════════════════════════════════════════════════════════
// Remote API
// ═══════════════════════════════════════════════════════════

/// Connection and paging parameters for the remote patient API.
#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Sent as `x-api-key`. Never serialized.
    #[serde(skip)]
    pub api_key: String,
    pub page_size: u32,
    pub max_retries: u32,
    pub inter_page_delay: Duration,
    pub request_timeout: Duration,
    pub backoff: BackoffConfig,
}

impl ApiConfig {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            inter_page_delay: Duration::from_millis(DEFAULT_INTER_PAGE_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            backoff: BackoffConfig::default(),
        }
    }

    /// Build from `RISKWATCH_*` environment variables.
    ///
    /// The API key is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = lookup(ENV_API_KEY)
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_API_KEY))?;

        let mut config = Self::new(&base_url, &api_key);
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            config.page_size = parse_positive(ENV_PAGE_SIZE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            config.max_retries = parse_positive(ENV_MAX_RETRIES, &raw)?;
        }
        Ok(config)
    }

    /// Disable every wait (backoff and inter-page delay). Used by tests and
    /// by the local simulator run.
    pub fn without_delays(mut self) -> Self {
        self.inter_page_delay = Duration::ZERO;
        self.backoff = BackoffConfig::none();
        self
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

/// Base delays for exponential backoff. The delay before retrying after
/// attempt `n` is `base * 2^(n-1)`.
#[derive(Debug, Clone, Serialize)]
pub struct BackoffConfig {
    /// Applied after HTTP 429.
    pub rate_limit_base: Duration,
    /// Applied after HTTP 5xx.
    pub server_error_base: Duration,
    /// Applied after connection-level failures.
    pub transport_base: Duration,
}

impl BackoffConfig {
    pub fn none() -> Self {
        Self {
            rate_limit_base: Duration::ZERO,
            server_error_base: Duration::ZERO,
            transport_base: Duration::ZERO,
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            rate_limit_base: Duration::from_millis(1000),
            server_error_base: Duration::from_millis(500),
            transport_base: Duration::from_millis(500),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Clinical thresholds
// ═══════════════════════════════════════════════════════════

/// Alert thresholds used by scoring and bucketing.
#[derive(Debug, Clone, Serialize)]
pub struct RiskThresholds {
    /// Minimum total score for the high-risk bucket.
    pub high_risk_score: u32,
    /// °F. Temperature score 1 and the fever bucket start here.
    pub fever_temperature: f64,
    /// °F. Temperature score 2 starts here.
    pub high_fever_temperature: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high_risk_score: 4,
            fever_temperature: 99.6,
            high_fever_temperature: 101.0,
        }
    }
}

/// Lower bounds (inclusive) of each blood-pressure and age band.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringBands {
    pub systolic_elevated: f64,
    pub systolic_stage1: f64,
    pub systolic_stage2: f64,
    pub diastolic_stage1: f64,
    pub diastolic_stage2: f64,
    pub age_middle: f64,
    /// Ages strictly above this score 2.
    pub age_senior: f64,
}

impl Default for ScoringBands {
    fn default() -> Self {
        Self {
            systolic_elevated: 120.0,
            systolic_stage1: 130.0,
            systolic_stage2: 140.0,
            diastolic_stage1: 80.0,
            diastolic_stage2: 90.0,
            age_middle: 40.0,
            age_senior: 65.0,
        }
    }
}

/// Everything the scoring engine is parameterized by.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScoringConfig {
    pub thresholds: RiskThresholds,
    pub bands: ScoringBands,
}
