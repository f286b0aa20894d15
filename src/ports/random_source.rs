//! Remote true-random source handing out batches of decimal fractions in [0,1).
use crate::domain::model::SourceError;

#[async_trait::async_trait]
pub trait RandomSource: Send + Sync {
    /// Credential identifying the source. An empty key means "unconfigured".
    fn api_key(&self) -> &str;

    async fn fetch_decimals(&self, count: usize, decimal_places: u8) -> Result<Vec<f64>, SourceError>;
}
