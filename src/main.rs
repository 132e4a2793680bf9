use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use crypto_agents::cli::{Cli, Command};
use crypto_agents::config::{AppConfig, DatabaseConfig};
use crypto_agents::db;
use crypto_agents::external::brave::BraveSearchProvider;
use crypto_agents::external::coingecko::CoinGeckoProvider;
use crypto_agents::external::search_provider::{SearchProvider, UnconfiguredSearch};
use crypto_agents::jobs::{news_job, price_job, report_job};
use crypto_agents::logging::{init_logging, LoggingConfig};
use crypto_agents::services::job_scheduler_service::{
    execute_job_with_tracking, run_cycle, JobSchedulerService, StepOutcome,
};
use crypto_agents::services::llm_service::LlmService;
use crypto_agents::services::notification_service::{LogMailer, Mailer, SmtpMailer};
use crypto_agents::state::AppContext;
use crypto_agents::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = dotenvy::from_path(&cli.env_file) {
        if !e.not_found() {
            return Err(e).with_context(|| format!("Failed to load {}", cli.env_file.display()));
        }
    }

    // Initialize logging FIRST; the guard flushes the log file on exit.
    let _log_guard = init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    if let Command::Migrate = cli.cmd {
        let pool = db::connect(&DatabaseConfig::from_env()?).await?;
        db::run_migrations(&pool).await?;
        return Ok(());
    }

    let mut config = AppConfig::from_env()?;
    if let Command::Schedule(args) = &cli.cmd {
        if let Some(minutes) = args.interval_minutes {
            config.scheduler.interval_minutes = minutes;
        }
        if args.skip_initial_run {
            config.scheduler.run_on_start = false;
        }
    }

    let context = build_context(config).await?;

    let outcome = match cli.cmd {
        Command::CollectPrice => {
            execute_job_with_tracking("collect_price", context, price_job::run).await
        }
        Command::CollectNews => {
            execute_job_with_tracking("collect_news", context, news_job::run).await
        }
        Command::SendReport => {
            execute_job_with_tracking("send_report", context, report_job::run).await
        }
        Command::RunOnce => {
            let report = run_cycle(&context).await;
            if !report.all_succeeded() {
                anyhow::bail!("Failed steps: {}", report.failed_steps().join(", "));
            }
            return Ok(());
        }
        Command::Schedule(_) => return run_schedule(context).await,
        Command::Migrate => return Ok(()),
    };

    exit_status(outcome)
}

async fn build_context(config: AppConfig) -> anyhow::Result<AppContext> {
    let pool = db::connect(&config.database).await?;
    if config.database.run_migrations {
        db::run_migrations(&pool).await?;
    }

    info!(
        "💰 Tracking {} ({}) priced in {}",
        config.asset.name, config.asset.coin_id, config.asset.vs_currency
    );
    let price_provider = CoinGeckoProvider::from_config(&config.asset)?;

    let search_provider: Arc<dyn SearchProvider> = match BraveSearchProvider::from_config(&config.search) {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            warn!("News search unavailable: {}", e);
            Arc::new(UnconfiguredSearch::new(e.to_string()))
        }
    };

    let mailer: Arc<dyn Mailer> = if config.smtp.enabled {
        Arc::new(SmtpMailer::from_config(&config.smtp)?)
    } else {
        info!("SMTP disabled, report emails will only be logged");
        Arc::new(LogMailer)
    };

    let llm = LlmService::new(&config.llm);

    Ok(AppContext {
        config: Arc::new(config),
        store: Arc::new(PgStore::new(pool)),
        price_provider: Arc::new(price_provider),
        search_provider,
        llm: Arc::new(llm),
        mailer,
    })
}

async fn run_schedule(context: AppContext) -> anyhow::Result<()> {
    let scheduler_config = context.config.scheduler.clone();
    let run_on_start = scheduler_config.run_on_start;

    let mut scheduler = JobSchedulerService::new(context, scheduler_config).await?;

    if run_on_start {
        info!("Running initial agent sequence...");
        scheduler.run_exclusive().await;
    }

    scheduler.start().await?;
    info!("Scheduler is running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Scheduler stopped by user");
    scheduler.stop().await?;
    Ok(())
}

fn exit_status(outcome: StepOutcome) -> anyhow::Result<()> {
    match outcome.error {
        Some(e) => {
            error!("{} failed", outcome.job_name);
            anyhow::bail!(e)
        }
        None => Ok(()),
    }
}
