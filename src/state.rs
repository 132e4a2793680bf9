use std::sync::Arc;

use crate::config::AppConfig;
use crate::external::price_provider::PriceProvider;
use crate::external::search_provider::SearchProvider;
use crate::services::llm_service::LlmService;
use crate::services::notification_service::Mailer;
use crate::store::MarketStore;

/// Clients and configuration shared by every pipeline step.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn MarketStore>,
    pub price_provider: Arc<dyn PriceProvider>,
    pub search_provider: Arc<dyn SearchProvider>,
    pub llm: Arc<LlmService>,
    pub mailer: Arc<dyn Mailer>,
}
