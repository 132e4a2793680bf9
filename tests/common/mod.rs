//! In-process fakes for the pipeline's external seams.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crypto_agents::config::AppConfig;
use crypto_agents::errors::{AppError, LlmError};
use crypto_agents::external::price_provider::{PriceProvider, PriceProviderError};
use crypto_agents::external::search_provider::SearchProvider;
use crypto_agents::models::{OutgoingEmail, SearchHit};
use crypto_agents::services::llm_service::{
    ChatMessage, ChatReply, LlmProvider, LlmService, ToolCall, ToolDefinition,
};
use crypto_agents::services::notification_service::Mailer;
use crypto_agents::state::AppContext;
use crypto_agents::store::MemoryStore;

pub const DRAFT: &str = "Subject: Bitcoin holds steady\n\nDear reader,\nPrices were calm today.\n\nBest Regards,";

pub struct FixedPrice(pub f64);

#[async_trait]
impl PriceProvider for FixedPrice {
    async fn fetch_spot_price(&self, _coin_id: &str, _vs_currency: &str) -> Result<f64, PriceProviderError> {
        Ok(self.0)
    }
}

pub struct BrokenPrice;

#[async_trait]
impl PriceProvider for BrokenPrice {
    async fn fetch_spot_price(&self, _coin_id: &str, _vs_currency: &str) -> Result<f64, PriceProviderError> {
        Err(PriceProviderError::Network("connection refused".to_string()))
    }
}

/// Answers tool requests with one `search_news` call echoing the prompt, and
/// completions with `DRAFT`.
///
/// A gated instance signals `entered` on each completion and then waits for
/// `release`, which holds the report step in flight.
#[derive(Default)]
pub struct ScriptedLlm {
    pub completions: AtomicUsize,
    pub tool_requests: AtomicUsize,
    pub last_user_prompt: Mutex<Option<String>>,
    pub gated: bool,
    pub entered: Notify,
    pub release: Notify,
}

impl ScriptedLlm {
    pub fn gated() -> Self {
        Self { gated: true, ..Self::default() }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
    ) -> Result<ChatReply, LlmError> {
        let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();

        if let Some(tool) = tools.first() {
            let n = self.tool_requests.fetch_add(1, Ordering::SeqCst);
            return Ok(ChatReply {
                content: None,
                tool_calls: vec![ToolCall {
                    id: format!("call_{}", n),
                    name: tool.name.clone(),
                    arguments: serde_json::json!({ "query": prompt }).to_string(),
                }],
            });
        }

        if self.gated {
            self.entered.notify_one();
            self.release.notified().await;
        }

        self.completions.fetch_add(1, Ordering::SeqCst);
        *self.last_user_prompt.lock().unwrap() = Some(prompt);
        Ok(ChatReply {
            content: Some(DRAFT.to_string()),
            tool_calls: Vec::new(),
        })
    }
}

/// Returns canned hits per query keyword; unknown queries fail.
#[derive(Default)]
pub struct CannedSearch {
    pub hits: HashMap<&'static str, Vec<SearchHit>>,
}

impl CannedSearch {
    pub fn with(mut self, keyword: &'static str, urls: &[&str]) -> Self {
        let hits = urls
            .iter()
            .map(|url| SearchHit {
                title: format!("Headline for {}", url),
                url: url.to_string(),
                description: "Markets moved.".to_string(),
            })
            .collect();
        self.hits.insert(keyword, hits);
        self
    }
}

#[async_trait]
impl SearchProvider for CannedSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AppError> {
        self.hits
            .iter()
            .find(|(keyword, _)| query.contains(*keyword))
            .map(|(_, hits)| hits.clone())
            .ok_or_else(|| AppError::External(format!("search backend down for {}", query)))
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.report.attach_chart = false;
    config.report.signature = "\n--\nTest Agent".to_string();
    config
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub llm: Arc<ScriptedLlm>,
    pub mailer: Arc<RecordingMailer>,
    pub context: AppContext,
}

pub fn harness(
    config: AppConfig,
    price_provider: Arc<dyn PriceProvider>,
    search: CannedSearch,
) -> Harness {
    harness_with_llm(config, price_provider, search, ScriptedLlm::default())
}

pub fn harness_with_llm(
    config: AppConfig,
    price_provider: Arc<dyn PriceProvider>,
    search: CannedSearch,
    llm: ScriptedLlm,
) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let llm = Arc::new(llm);
    let mailer = Arc::new(RecordingMailer::default());

    let context = AppContext {
        config: Arc::new(config),
        store: store.clone(),
        price_provider,
        search_provider: Arc::new(search),
        llm: Arc::new(LlmService::with_provider(llm.clone())),
        mailer: mailer.clone(),
    };

    Harness { store, llm, mailer, context }
}
