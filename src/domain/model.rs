use std::time::Duration;

pub const DEFAULT_CAPACITY_TARGET: usize = 50;
pub const DEFAULT_REFILL_THRESHOLD: f64 = 0.5;
pub const DEFAULT_DECIMAL_PLACES: u8 = 5;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub random_org: RandomOrgConfig,
    pub cache: CacheSettings,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct RandomOrgConfig {
    pub api_key: String,
    pub endpoint: String,
    pub user_agent: String,
    pub request_timeout: Option<Duration>,
}

/// Runtime knobs for the pool and its refills.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheSettings {
    pub enabled: bool,
    pub capacity_target: usize,
    pub refill_threshold: f64,
    pub decimal_places: u8,
    pub refill_timeout: Option<Duration>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity_target: DEFAULT_CAPACITY_TARGET,
            refill_threshold: DEFAULT_REFILL_THRESHOLD,
            decimal_places: DEFAULT_DECIMAL_PLACES,
            refill_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
        }
    }
}

/// Failures of the remote source. None of these ever reach a draw caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("http status {0}")]
    Http(u16),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Quota bookkeeping reported by random.org with every successful call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Usage {
    pub bits_used: Option<u64>,
    pub bits_left: Option<i64>,
    pub requests_left: Option<i64>,
    pub advisory_delay_ms: Option<u64>,
    pub completion_time: Option<chrono::DateTime<chrono::Utc>>,
}
