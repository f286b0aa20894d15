//! Reqwest-backed random.org JSON-RPC client implementing the `RandomSource` port; maps
//! transport, HTTP and RPC failures into `SourceError` and keeps the quota counters current.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::domain::model::{RandomOrgConfig, SourceError, Usage};
use crate::infra::json_rpc::{
    DecimalData, GenerateDecimalFractionsParams, RpcRequest, RpcResponse, RpcResult,
    GENERATE_DECIMAL_FRACTIONS,
};
use crate::infra::time::parse_completion_time;
use crate::ports::random_source::RandomSource;

pub const DEFAULT_ENDPOINT: &str = "https://api.random.org/json-rpc/4/invoke";
pub const MAX_DECIMALS_PER_REQUEST: usize = 10_000;
pub const MAX_DECIMAL_PLACES: u8 = 14;

pub struct RandomOrgClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    next_id: AtomicU64,
    usage: Mutex<Usage>,
}

impl RandomOrgClient {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        user_agent: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .pool_idle_timeout(Duration::from_secs(120));
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
            usage: Mutex::new(Usage::default()),
        })
    }

    pub fn from_config(cfg: &RandomOrgConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            cfg.api_key.clone(),
            cfg.endpoint.clone(),
            &cfg.user_agent,
            cfg.request_timeout,
        )
    }

    /// Counters from the most recent successful call.
    pub fn usage(&self) -> Usage {
        self.usage.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn classify_error(e: &reqwest::Error) -> SourceError {
        if e.is_timeout() {
            SourceError::Timeout
        } else if e.is_decode() {
            SourceError::Malformed(e.to_string())
        } else {
            SourceError::Transport(e.to_string())
        }
    }

    fn record_usage(&self, result: &RpcResult<DecimalData>) {
        let mut usage = self.usage.lock().unwrap_or_else(PoisonError::into_inner);
        usage.bits_used = Some(result.bits_used);
        usage.bits_left = Some(result.bits_left);
        usage.requests_left = Some(result.requests_left);
        usage.advisory_delay_ms = Some(result.advisory_delay);
        usage.completion_time = result
            .random
            .completion_time
            .as_deref()
            .and_then(parse_completion_time);
    }

    async fn invoke<P, T>(&self, method: &'static str, params: P) -> Result<RpcResult<T>, SourceError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest::new(method, params, id);
        let start = tokio::time::Instant::now();
        debug!(method, id, endpoint = %self.endpoint, "RPC request start");

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(method, id, error = %e, "RPC request failed");
                Self::classify_error(&e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(method, id, status = status.as_u16(), "RPC request rejected");
            return Err(SourceError::Http(status.as_u16()));
        }

        let bytes = resp.bytes().await.map_err(|e| Self::classify_error(&e))?;
        let parsed: RpcResponse<T> = serde_json::from_slice(&bytes)
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        debug!(
            method,
            id,
            latency_ms = start.elapsed().as_millis() as u64,
            "RPC response received"
        );
        parsed.into_result()
    }
}

/// Rejects requests random.org would refuse before spending a round trip on them.
pub fn validate_request(count: usize, decimal_places: u8) -> Result<(), SourceError> {
    if !(1..=MAX_DECIMALS_PER_REQUEST).contains(&count) {
        return Err(SourceError::InvalidRequest(format!(
            "n must be within [1, {MAX_DECIMALS_PER_REQUEST}], got {count}"
        )));
    }
    if !(1..=MAX_DECIMAL_PLACES).contains(&decimal_places) {
        return Err(SourceError::InvalidRequest(format!(
            "decimalPlaces must be within [1, {MAX_DECIMAL_PLACES}], got {decimal_places}"
        )));
    }
    Ok(())
}

/// Every delivered value must be a fraction in [0,1).
pub fn check_fractions(values: &[f64]) -> Result<(), SourceError> {
    match values.iter().find(|v| !(0.0..1.0).contains(*v)) {
        Some(bad) => Err(SourceError::Malformed(format!(
            "value {bad} outside [0,1)"
        ))),
        None => Ok(()),
    }
}

#[async_trait::async_trait]
impl RandomSource for RandomOrgClient {
    fn api_key(&self) -> &str {
        &self.api_key
    }

    async fn fetch_decimals(&self, count: usize, decimal_places: u8) -> Result<Vec<f64>, SourceError> {
        validate_request(count, decimal_places)?;
        if self.api_key.is_empty() {
            return Err(SourceError::InvalidRequest("missing api key".to_string()));
        }

        let params = GenerateDecimalFractionsParams {
            api_key: &self.api_key,
            n: count,
            decimal_places,
        };
        let result: RpcResult<DecimalData> = self.invoke(GENERATE_DECIMAL_FRACTIONS, params).await?;
        self.record_usage(&result);
        check_fractions(&result.random.data)?;

        debug!(
            received = result.random.data.len(),
            bits_left = result.bits_left,
            requests_left = result.requests_left,
            "Decimal fractions received"
        );
        Ok(result.random.data)
    }
}
