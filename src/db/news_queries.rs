use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewNewsItem, NewsItem};

pub async fn url_exists(pool: &PgPool, url: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM news_items WHERE url = $1)")
        .bind(url)
        .fetch_one(pool)
        .await
}

/// Inserts the item unless its URL is already stored.
///
/// Returns `None` when the URL was taken, including by a concurrent writer
/// that won the race after the caller's existence check.
pub async fn insert_item(
    pool: &PgPool,
    item: &NewNewsItem,
) -> Result<Option<NewsItem>, sqlx::Error> {
    sqlx::query_as::<_, NewsItem>(
        r#"
        INSERT INTO news_items (id, summary, url, created_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (url) DO NOTHING
        RETURNING id, summary, url, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&item.summary)
    .bind(&item.url)
    .bind(item.created_at)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_latest(pool: &PgPool, limit: i64) -> Result<Vec<NewsItem>, sqlx::Error> {
    sqlx::query_as::<_, NewsItem>(
        r#"
        SELECT id, summary, url, created_at
        FROM news_items
        ORDER BY created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
