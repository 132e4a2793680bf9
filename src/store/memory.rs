use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{NewNewsItem, NewPriceSample, NewsItem, PriceSample};
use crate::store::MarketStore;

/// In-process store with the same ordering and URL uniqueness as `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    prices: RwLock<Vec<PriceSample>>,
    news: RwLock<Vec<NewsItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn price_count(&self) -> usize {
        self.prices.read().await.len()
    }

    pub async fn news_count(&self) -> usize {
        self.news.read().await.len()
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn insert_price_sample(&self, sample: NewPriceSample) -> Result<PriceSample, AppError> {
        let stored = sample.into_sample(Uuid::new_v4());
        self.prices.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn price_samples_since(
        &self,
        asset: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>, AppError> {
        let mut samples: Vec<PriceSample> = self
            .prices
            .read()
            .await
            .iter()
            .filter(|s| s.asset == asset && s.created_at >= since)
            .cloned()
            .collect();
        samples.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(samples)
    }

    async fn news_url_exists(&self, url: &str) -> Result<bool, AppError> {
        Ok(self.news.read().await.iter().any(|n| n.url == url))
    }

    async fn insert_news_item(&self, item: NewNewsItem) -> Result<bool, AppError> {
        let mut news = self.news.write().await;
        if news.iter().any(|n| n.url == item.url) {
            return Ok(false);
        }
        news.push(item.into_item(Uuid::new_v4()));
        Ok(true)
    }

    async fn latest_news(&self, limit: i64) -> Result<Vec<NewsItem>, AppError> {
        let mut news = self.news.read().await.clone();
        news.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        news.truncate(limit.max(0) as usize);
        Ok(news)
    }
}
