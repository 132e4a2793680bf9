use chrono::Utc;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{EmailAttachment, OutgoingEmail};
use crate::services::chart_service::{self, ChartOptions};
use crate::services::job_scheduler_service::JobResult;
use crate::services::{price_service, report_service};
use crate::state::AppContext;

/// Drafts today's market report and emails it with a price chart.
///
/// Skips (successfully) when no price was recorded today. A chart that fails
/// to render only drops the attachment.
pub async fn run(ctx: AppContext) -> Result<JobResult, AppError> {
    info!("✉️ Building market report...");

    let asset = &ctx.config.asset;
    let report_config = &ctx.config.report;

    let prices = price_service::todays_samples(ctx.store.as_ref(), asset, Utc::now()).await?;
    let news = ctx.store.latest_news(i64::from(report_config.news_limit)).await?;

    let Some(report) = report_service::compose_report(
        ctx.llm.as_ref(),
        &prices,
        &news,
        asset,
        &report_config.signature,
    )
    .await?
    else {
        warn!("No {} price samples recorded today, skipping report", asset.name);
        return Ok(JobResult { items_processed: 0, items_failed: 0 });
    };

    info!("Email subject: {}", report.subject);
    info!("Email body:\n{}", report.body);

    let attachment = if report_config.attach_chart {
        let options = ChartOptions {
            width: report_config.chart_width,
            height: report_config.chart_height,
        };
        match chart_service::render_price_chart(&prices, asset, options) {
            Ok(data) => Some(EmailAttachment {
                filename: format!("{}_price_trend.png", asset.symbol.to_lowercase()),
                content_type: "image/png".to_string(),
                data,
            }),
            Err(e) => {
                warn!("Error creating chart, sending without attachment: {}", e);
                None
            }
        }
    } else {
        None
    };

    let email = OutgoingEmail {
        subject: report.subject,
        body: report.body,
        attachment,
    };
    ctx.mailer.send(&email).await?;

    info!(
        "Report sent ({} price samples, {} news items)",
        prices.len(),
        news.len()
    );
    Ok(JobResult { items_processed: 1, items_failed: 0 })
}
