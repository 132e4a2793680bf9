use serde::Deserialize;
use tracing::{error, info, warn};

use crate::config::SearchConfig;
use crate::errors::AppError;
use crate::external::search_provider::SearchProvider;
use crate::models::{NewNewsItem, SearchHit};
use crate::services::llm_service::{LlmService, ToolCall, ToolDefinition};
use crate::store::MarketStore;

pub const SEARCH_TOOL_NAME: &str = "search_news";

/// Prompts the model turns into search queries, one collection pass each.
pub const NEWS_SEARCHES: [&str; 2] = [
    "Search for today's stock market news, focusing on S&P 500, Dow Jones, Nasdaq, and major company earnings.",
    "Search for today's Bitcoin price news and major cryptocurrency market updates.",
];

/// Counters for one news collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsCollection {
    pub searches_run: usize,
    pub searches_failed: usize,
    pub stored: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

pub fn search_tool() -> ToolDefinition {
    ToolDefinition {
        name: SEARCH_TOOL_NAME.to_string(),
        description: "Search for latest finance news using a web search API".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query for finance news"
                }
            },
            "required": ["query"],
            "additionalProperties": false
        }),
    }
}

pub fn format_summary(hit: &SearchHit) -> String {
    format!(
        "Title: {}\nDescription: {}\nSource: {}",
        hit.title, hit.description, hit.url
    )
}

/// Stores the item unless its URL is already known. Returns whether it was stored.
pub async fn store_if_new(
    store: &dyn MarketStore,
    summary: String,
    url: String,
) -> Result<bool, AppError> {
    if store.news_url_exists(&url).await? {
        info!("News already exists in database, skipping: {}", url);
        return Ok(false);
    }

    let inserted = store.insert_news_item(NewNewsItem::now(summary, url.clone())).await?;
    if inserted {
        info!("Stored news item: {}", url);
    } else {
        info!("News item was stored concurrently, skipping: {}", url);
    }
    Ok(inserted)
}

/// Runs every prompt in `NEWS_SEARCHES`; a failing prompt does not stop the next.
pub async fn collect_news(
    store: &dyn MarketStore,
    llm: &LlmService,
    search: &dyn SearchProvider,
    config: &SearchConfig,
) -> NewsCollection {
    let mut totals = NewsCollection::default();

    for prompt in NEWS_SEARCHES {
        info!("Executing search: {}", prompt);
        totals.searches_run += 1;

        if let Err(e) = collect_for_prompt(store, llm, search, config, prompt, &mut totals).await {
            error!("News search failed for prompt {:?}: {}", prompt, e);
            totals.searches_failed += 1;
        }
    }

    info!(
        "News collection finished: {} stored, {} skipped, {} failed, {}/{} searches failed",
        totals.stored, totals.skipped, totals.failed, totals.searches_failed, totals.searches_run
    );
    totals
}

async fn collect_for_prompt(
    store: &dyn MarketStore,
    llm: &LlmService,
    search: &dyn SearchProvider,
    config: &SearchConfig,
    prompt: &str,
    totals: &mut NewsCollection,
) -> Result<(), AppError> {
    let calls = llm.request_tool_calls(prompt, vec![search_tool()]).await?;
    if calls.is_empty() {
        warn!("No tool calls made by the model");
        return Ok(());
    }

    for call in calls {
        if call.name != SEARCH_TOOL_NAME {
            warn!("Ignoring unknown tool call: {}", call.name);
            continue;
        }

        let query = parse_query(&call)?;
        let hits = search.search(&query).await?;
        if hits.is_empty() {
            info!("No results found for query: {}", query);
            continue;
        }

        info!("Found {} results for query: {}", hits.len(), query);
        for hit in hits.into_iter().take(config.results_per_query) {
            let summary = format_summary(&hit);
            match store_if_new(store, summary, hit.url.clone()).await {
                Ok(true) => totals.stored += 1,
                Ok(false) => totals.skipped += 1,
                Err(e) => {
                    error!("Error storing news item {}: {}", hit.url, e);
                    totals.failed += 1;
                }
            }
        }
    }

    Ok(())
}

fn parse_query(call: &ToolCall) -> Result<String, AppError> {
    let args: SearchArgs = serde_json::from_str(&call.arguments).map_err(|e| {
        AppError::External(format!("Invalid arguments for tool call {}: {}", call.id, e))
    })?;

    let query = args.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation(format!("Tool call {} has an empty query", call.id)));
    }
    Ok(query.to_string())
}
