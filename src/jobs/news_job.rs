use tracing::info;

use crate::errors::AppError;
use crate::services::job_scheduler_service::JobResult;
use crate::services::news_service::{self, NEWS_SEARCHES};
use crate::state::AppContext;

/// Collects news for every fixed search prompt.
///
/// Individual prompt or item failures are counted, not fatal. The job only
/// fails when no search succeeded at all.
pub async fn run(ctx: AppContext) -> Result<JobResult, AppError> {
    info!("📰 Collecting market news...");

    let totals = news_service::collect_news(
        ctx.store.as_ref(),
        ctx.llm.as_ref(),
        ctx.search_provider.as_ref(),
        &ctx.config.search,
    )
    .await;

    if totals.searches_failed == NEWS_SEARCHES.len() {
        return Err(AppError::External(format!(
            "All {} news searches failed",
            totals.searches_failed
        )));
    }

    Ok(JobResult {
        items_processed: (totals.stored + totals.skipped) as i32,
        items_failed: totals.failed as i32,
    })
}
