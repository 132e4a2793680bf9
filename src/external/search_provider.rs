use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::SearchHit;

/// Trait for web search providers
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AppError>;
}

/// Stand-in used when no search API key is configured. Every search fails
/// with a configuration error, so only the news step is affected.
pub struct UnconfiguredSearch {
    reason: String,
}

impl UnconfiguredSearch {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl SearchProvider for UnconfiguredSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, AppError> {
        Err(AppError::Config(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_search_reports_reason() {
        let search = UnconfiguredSearch::new("BRAVE_API_KEY not set");
        match search.search("bitcoin").await {
            Err(AppError::Config(msg)) => assert_eq!(msg, "BRAVE_API_KEY not set"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
