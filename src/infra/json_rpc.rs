//! JSON-RPC 2.0 envelopes and the random.org payloads the pool needs.
use serde::{Deserialize, Serialize};

use crate::domain::model::SourceError;

pub const GENERATE_DECIMAL_FRACTIONS: &str = "generateDecimalFractions";

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<P> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: P,
    pub id: u64,
}

impl<P> RpcRequest<P> {
    pub fn new(method: &'static str, params: P, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDecimalFractionsParams<'a> {
    pub api_key: &'a str,
    pub n: usize,
    pub decimal_places: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse<T> {
    #[serde(default)]
    pub jsonrpc: String,
    pub result: Option<RpcResult<T>>,
    pub error: Option<RpcErrorBody>,
    #[serde(default)]
    pub id: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcResult<T> {
    pub random: T,
    #[serde(default)]
    pub bits_used: u64,
    #[serde(default)]
    pub bits_left: i64,
    #[serde(default)]
    pub requests_left: i64,
    #[serde(default)]
    pub advisory_delay: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecimalData {
    pub data: Vec<f64>,
    #[serde(default)]
    pub completion_time: Option<String>,
}

impl<T> RpcResponse<T> {
    /// An `error` member wins over `result`; a body with neither is malformed.
    pub fn into_result(self) -> Result<RpcResult<T>, SourceError> {
        if let Some(err) = self.error {
            return Err(SourceError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        self.result.ok_or_else(|| {
            SourceError::Malformed("response carried neither result nor error".to_string())
        })
    }
}
