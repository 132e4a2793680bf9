use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::config::AssetConfig;
use crate::errors::AppError;
use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{NewPriceSample, PriceSample};
use crate::store::MarketStore;

/// Fetch the current spot price and append it to the store.
pub async fn collect_price(
    store: &dyn MarketStore,
    provider: &dyn PriceProvider,
    asset: &AssetConfig,
) -> Result<PriceSample, AppError> {
    let price = provider
        .fetch_spot_price(&asset.coin_id, &asset.vs_currency)
        .await
        .map_err(|e| {
            error!("Error fetching {} price: {}", asset.name, e);
            map_provider_error(e)
        })?;

    let stored = store
        .insert_price_sample(NewPriceSample::now(&asset.coin_id, price))
        .await?;

    info!(
        "Current {} price: {} {}",
        asset.name,
        format_usd(price),
        asset.vs_currency.to_uppercase()
    );
    info!("Price successfully stored in database");

    Ok(stored)
}

/// Samples recorded since `now`'s UTC midnight, newest first.
pub async fn todays_samples(
    store: &dyn MarketStore,
    asset: &AssetConfig,
    now: DateTime<Utc>,
) -> Result<Vec<PriceSample>, AppError> {
    store.price_samples_since(&asset.coin_id, start_of_day(now)).await
}

pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

/// Formats as `$67,123.45`.
pub fn format_usd(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, fraction)
}

fn map_provider_error(e: PriceProviderError) -> AppError {
    match e {
        PriceProviderError::RateLimited => {
            AppError::External("Price provider rate limited the request".to_string())
        }
        other => AppError::External(format!("Price provider error: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct FixedPrice(f64);

    #[async_trait]
    impl PriceProvider for FixedPrice {
        async fn fetch_spot_price(&self, _: &str, _: &str) -> Result<f64, PriceProviderError> {
            Ok(self.0)
        }
    }

    struct Throttled;

    #[async_trait]
    impl PriceProvider for Throttled {
        async fn fetch_spot_price(&self, _: &str, _: &str) -> Result<f64, PriceProviderError> {
            Err(PriceProviderError::RateLimited)
        }
    }

    #[test]
    fn test_format_usd_groups_thousands() {
        assert_eq!(format_usd(67123.456), "$67,123.46");
        assert_eq!(format_usd(1234567.0), "$1,234,567.00");
        assert_eq!(format_usd(999.999), "$1,000.00");
        assert_eq!(format_usd(0.5), "$0.50");
        assert_eq!(format_usd(-1500.25), "-$1,500.25");
    }

    #[test]
    fn test_start_of_day_is_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 12, 1, 15, 42, 7).unwrap();
        let midnight = Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap();
        assert_eq!(start_of_day(now), midnight);
    }

    #[tokio::test]
    async fn test_collect_price_stores_sample() {
        let store = MemoryStore::new();
        let asset = AssetConfig::default();

        let sample = collect_price(&store, &FixedPrice(65000.0), &asset).await.unwrap();
        assert_eq!(sample.asset, "bitcoin");
        assert_eq!(sample.price, 65000.0);
        assert_eq!(store.price_count().await, 1);
    }

    #[tokio::test]
    async fn test_collect_price_failure_stores_nothing() {
        let store = MemoryStore::new();
        let result = collect_price(&store, &Throttled, &AssetConfig::default()).await;
        assert!(matches!(result, Err(AppError::External(_))));
        assert_eq!(store.price_count().await, 0);
    }
}
