//! Persistence seam for price samples and news items.
//!
//! Jobs talk to a `MarketStore` rather than to a pool directly so the
//! pipeline can run against Postgres in production and an in-memory store
//! in tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::{NewNewsItem, NewPriceSample, NewsItem, PriceSample};

#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn insert_price_sample(&self, sample: NewPriceSample) -> Result<PriceSample, AppError>;

    /// Samples for `asset` created at or after `since`, newest first.
    async fn price_samples_since(
        &self,
        asset: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>, AppError>;

    async fn news_url_exists(&self, url: &str) -> Result<bool, AppError>;

    /// Returns `false` when an item with the same URL is already stored.
    async fn insert_news_item(&self, item: NewNewsItem) -> Result<bool, AppError>;

    /// The `limit` most recent items, newest first.
    async fn latest_news(&self, limit: i64) -> Result<Vec<NewsItem>, AppError>;
}
