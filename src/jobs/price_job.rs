use tracing::info;

use crate::errors::AppError;
use crate::services::job_scheduler_service::JobResult;
use crate::services::price_service;
use crate::state::AppContext;

pub async fn run(ctx: AppContext) -> Result<JobResult, AppError> {
    info!("💰 Collecting {} price...", ctx.config.asset.name);

    price_service::collect_price(
        ctx.store.as_ref(),
        ctx.price_provider.as_ref(),
        &ctx.config.asset,
    )
    .await?;

    Ok(JobResult { items_processed: 1, items_failed: 0 })
}
