use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::config::SearchConfig;
use crate::errors::AppError;
use crate::external::search_provider::SearchProvider;
use crate::models::SearchHit;

const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const QUERY_SUFFIX: &str = " in the last 24 hours";

/// Brave web search, restricted to recent results.
pub struct BraveSearchProvider {
    api_key: String,
    result_count: u32,
    freshness: String,
    client: Client,
}

impl BraveSearchProvider {
    pub fn new(api_key: String, result_count: u32, freshness: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::External(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            result_count,
            freshness,
            client,
        })
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self, AppError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::Config("BRAVE_API_KEY not set".to_string()))?;

        Self::new(api_key, config.result_count, config.freshness.clone())
    }
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    results: Option<Vec<BraveResult>>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

#[async_trait]
impl SearchProvider for BraveSearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AppError> {
        let q = format!("{}{}", query, QUERY_SUFFIX);
        let count = self.result_count.to_string();
        info!("Search query: {}", q);

        let response = self
            .client
            .get(BRAVE_SEARCH_URL)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[
                ("q", q.as_str()),
                ("freshness", self.freshness.as_str()),
                ("count", count.as_str()),
                ("text_decorations", "false"),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Brave search request failed: {}", e);
                AppError::External(format!("Search API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Brave search error {}: {}", status, error_text);
            return Err(AppError::External(format!(
                "Search API returned error {}: {}",
                status, error_text
            )));
        }

        let body = response.text().await.map_err(|e| {
            AppError::External(format!("Failed to read search response: {}", e))
        })?;

        parse_results(&body)
    }
}

fn parse_results(body: &str) -> Result<Vec<SearchHit>, AppError> {
    let parsed: BraveResponse = serde_json::from_str(body).map_err(|e| {
        error!("Failed to parse Brave response: {}", e);
        AppError::External(format!("Failed to parse search response: {}", e))
    })?;

    match parsed.web.and_then(|web| web.results) {
        Some(results) => {
            info!("Raw results count: {}", results.len());
            Ok(results
                .into_iter()
                .map(|r| SearchHit {
                    title: r.title,
                    url: r.url,
                    description: r.description,
                })
                .collect())
        }
        None => {
            let preview: String = body.chars().take(500).collect();
            warn!("No web results in search response: {}", preview);
            Ok(Vec::new())
        }
    }
}
