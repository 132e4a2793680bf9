use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::models::{NewPriceSample, PriceSample};

pub async fn insert_sample(
    pool: &PgPool,
    sample: &NewPriceSample,
) -> Result<PriceSample, sqlx::Error> {
    sqlx::query_as::<_, PriceSample>(
        r#"
        INSERT INTO price_samples (id, asset, price, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, asset, price, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&sample.asset)
    .bind(sample.price)
    .bind(sample.created_at)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        error!("Failed to insert price sample for {} (price: {}): {}", sample.asset, sample.price, e);
        e
    })
}

/// Samples for `asset` created at or after `since`, newest first.
pub async fn fetch_since(
    pool: &PgPool,
    asset: &str,
    since: DateTime<Utc>,
) -> Result<Vec<PriceSample>, sqlx::Error> {
    sqlx::query_as::<_, PriceSample>(
        r#"
        SELECT id, asset, price, created_at
        FROM price_samples
        WHERE asset = $1 AND created_at >= $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(asset)
    .bind(since)
    .fetch_all(pool)
    .await
}
