//! Loads the TOML configuration (random.org client, cache policy, logging) and normalizes it
//! into `AppConfig`.
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokio::fs;

use crate::domain::model::{
    AppConfig, CacheSettings, RandomOrgConfig, DEFAULT_CAPACITY_TARGET, DEFAULT_DECIMAL_PLACES,
    DEFAULT_REFILL_THRESHOLD, DEFAULT_TIMEOUT_SECONDS,
};
use crate::infra::random_org::{DEFAULT_ENDPOINT, MAX_DECIMAL_PLACES};

pub const API_KEY_ENV: &str = "TRUERNG_API_KEY";
pub const CONFIG_PATH_ENV: &str = "TRUERNG_CONFIG";

pub const MIN_CACHED_NUMBERS: i64 = 10;
pub const MAX_CACHED_NUMBERS: i64 = 200;
pub const MIN_UPDATE_POINT: f64 = 0.01;
pub const MAX_UPDATE_POINT: f64 = 1.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Default)]
struct RawAppFile {
    #[serde(default)]
    random_org: RawRandomOrg,
    #[serde(default)]
    cache: RawCache,
    #[serde(default)]
    logging: RawLogging,
}

#[derive(Debug, Deserialize, Default)]
struct RawRandomOrg {
    api_key: Option<String>,
    endpoint: Option<String>,
    decimal_places: Option<i64>,
    timeout_seconds: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawCache {
    enabled: Option<bool>,
    max_cached_numbers: Option<i64>,
    update_point: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawLogging {
    level: Option<String>,
    #[serde(default)]
    debug: bool,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads and validates `config_path`; `TRUERNG_API_KEY` replaces the file's key when set.
    pub async fn load(config_path: &Path) -> Result<AppConfig, ConfigError> {
        let content = fs::read_to_string(config_path).await?;
        let mut cfg = Self::parse(&content)?;
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            cfg.random_org.api_key = key.trim().to_string();
        }
        Ok(cfg)
    }

    pub fn parse(content: &str) -> Result<AppConfig, ConfigError> {
        let raw: RawAppFile = toml::from_str(content)?;

        let endpoint = raw
            .random_org
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_ENDPOINT)
            .to_string();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ConfigError::Invalid(format!(
                "random_org.endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }

        let decimal_places = parse_decimal_places(raw.random_org.decimal_places)?;
        let timeout_seconds = raw
            .random_org
            .timeout_seconds
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS);
        let timeout = (timeout_seconds > 0).then(|| Duration::from_secs(timeout_seconds));

        let capacity_target = parse_capacity(raw.cache.max_cached_numbers)?;
        let refill_threshold = parse_update_point(raw.cache.update_point)?;

        let mut log_level = normalize_log_level(raw.logging.level.as_deref().unwrap_or("info"))?;
        if raw.logging.debug {
            log_level = "debug".to_string();
        }

        Ok(AppConfig {
            random_org: RandomOrgConfig {
                api_key: raw.random_org.api_key.unwrap_or_default().trim().to_string(),
                endpoint,
                user_agent: raw
                    .random_org
                    .user_agent
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(default_user_agent),
                request_timeout: timeout,
            },
            cache: CacheSettings {
                enabled: raw.cache.enabled.unwrap_or(true),
                capacity_target,
                refill_threshold,
                decimal_places,
                refill_timeout: timeout,
            },
            log_level,
        })
    }
}

fn default_user_agent() -> String {
    concat!("truerng/", env!("CARGO_PKG_VERSION")).to_string()
}

fn parse_capacity(v: Option<i64>) -> Result<usize, ConfigError> {
    let Some(n) = v else {
        return Ok(DEFAULT_CAPACITY_TARGET);
    };
    if !(MIN_CACHED_NUMBERS..=MAX_CACHED_NUMBERS).contains(&n) {
        return Err(ConfigError::Invalid(format!(
            "cache.max_cached_numbers must be between {MIN_CACHED_NUMBERS} and {MAX_CACHED_NUMBERS}, got {n}"
        )));
    }
    Ok(n as usize)
}

fn parse_update_point(v: Option<f64>) -> Result<f64, ConfigError> {
    let Some(p) = v else {
        return Ok(DEFAULT_REFILL_THRESHOLD);
    };
    if !(MIN_UPDATE_POINT..=MAX_UPDATE_POINT).contains(&p) {
        return Err(ConfigError::Invalid(format!(
            "cache.update_point must be between {MIN_UPDATE_POINT} and {MAX_UPDATE_POINT}, got {p}"
        )));
    }
    Ok(p)
}

fn parse_decimal_places(v: Option<i64>) -> Result<u8, ConfigError> {
    let Some(d) = v else {
        return Ok(DEFAULT_DECIMAL_PLACES);
    };
    if !(1..=MAX_DECIMAL_PLACES as i64).contains(&d) {
        return Err(ConfigError::Invalid(format!(
            "random_org.decimal_places must be between 1 and {MAX_DECIMAL_PLACES}, got {d}"
        )));
    }
    Ok(d as u8)
}

fn normalize_log_level(level: &str) -> Result<String, ConfigError> {
    let l = level.trim().to_ascii_lowercase();
    if l.is_empty() {
        return Err(ConfigError::Invalid("logging.level cannot be empty".into()));
    }
    match l.as_str() {
        "error" | "warn" | "info" | "debug" | "trace" | "off" => Ok(l),
        _ => Err(ConfigError::Invalid(format!(
            "invalid logging.level '{level}', expected error|warn|info|debug|trace|off"
        ))),
    }
}
