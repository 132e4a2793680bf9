use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored news summary. `url` is the natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NewsItem {
    pub id: Uuid,
    pub summary: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNewsItem {
    pub summary: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl NewNewsItem {
    pub fn now(summary: String, url: String) -> Self {
        Self {
            summary,
            url,
            created_at: Utc::now(),
        }
    }

    pub fn into_item(self, id: Uuid) -> NewsItem {
        NewsItem {
            id,
            summary: self.summary,
            url: self.url,
            created_at: self.created_at,
        }
    }
}

/// A single web search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub description: String,
}
