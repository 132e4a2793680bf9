use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One recorded quote for the tracked asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PriceSample {
    pub id: Uuid,
    pub asset: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPriceSample {
    pub asset: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

impl NewPriceSample {
    pub fn now(asset: &str, price: f64) -> Self {
        Self {
            asset: asset.to_string(),
            price,
            created_at: Utc::now(),
        }
    }

    pub fn into_sample(self, id: Uuid) -> PriceSample {
        PriceSample {
            id,
            asset: self.asset,
            price: self.price,
            created_at: self.created_at,
        }
    }
}
