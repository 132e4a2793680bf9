use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::db::{news_queries, price_queries};
use crate::errors::AppError;
use crate::models::{NewNewsItem, NewPriceSample, NewsItem, PriceSample};
use crate::store::MarketStore;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MarketStore for PgStore {
    async fn insert_price_sample(&self, sample: NewPriceSample) -> Result<PriceSample, AppError> {
        Ok(price_queries::insert_sample(&self.pool, &sample).await?)
    }

    async fn price_samples_since(
        &self,
        asset: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>, AppError> {
        Ok(price_queries::fetch_since(&self.pool, asset, since).await?)
    }

    async fn news_url_exists(&self, url: &str) -> Result<bool, AppError> {
        Ok(news_queries::url_exists(&self.pool, url).await?)
    }

    async fn insert_news_item(&self, item: NewNewsItem) -> Result<bool, AppError> {
        let inserted = news_queries::insert_item(&self.pool, &item).await?;
        Ok(inserted.is_some())
    }

    async fn latest_news(&self, limit: i64) -> Result<Vec<NewsItem>, AppError> {
        Ok(news_queries::fetch_latest(&self.pool, limit).await?)
    }
}
