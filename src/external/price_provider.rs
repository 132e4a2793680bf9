use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Current spot price of `coin_id` quoted in `vs_currency`.
    async fn fetch_spot_price(
        &self,
        coin_id: &str,
        vs_currency: &str,
    ) -> Result<f64, PriceProviderError>;
}
