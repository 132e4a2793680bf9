use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::config::AssetConfig;
use crate::external::price_provider::{PriceProvider, PriceProviderError};

type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

/// CoinGecko-backed price provider using `/simple/price`.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    pub fn new(base_url: String, api_key: Option<String>) -> Result<Self, PriceProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &AssetConfig) -> Result<Self, PriceProviderError> {
        Self::new(config.price_api_base_url.clone(), config.price_api_key.clone())
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    async fn fetch_spot_price(
        &self,
        coin_id: &str,
        vs_currency: &str,
    ) -> Result<f64, PriceProviderError> {
        let url = format!("{}/simple/price", self.base_url);

        let mut request = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .query(&[("ids", coin_id), ("vs_currencies", vs_currency)]);

        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PriceProviderError::BadResponse(format!("HTTP {}: {}", status, body)));
        }

        let body = resp
            .json::<SimplePriceResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        extract_price(&body, coin_id, vs_currency)
    }
}

// Response shape: { "bitcoin": { "usd": 12345.6 } }
fn extract_price(
    body: &SimplePriceResponse,
    coin_id: &str,
    vs_currency: &str,
) -> Result<f64, PriceProviderError> {
    let quotes = body
        .get(coin_id)
        .ok_or_else(|| PriceProviderError::BadResponse(format!("id missing in response: {}", coin_id)))?;

    quotes
        .get(&vs_currency.to_lowercase())
        .copied()
        .ok_or_else(|| {
            PriceProviderError::BadResponse(format!("{} missing for id: {}", vs_currency, coin_id))
        })
}
