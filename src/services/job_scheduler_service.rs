use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::config::SchedulerConfig;
use crate::errors::AppError;
use crate::jobs::{news_job, price_job, report_job};
use crate::state::AppContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobResult {
    pub items_processed: i32,
    pub items_failed: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub job_name: &'static str,
    pub result: Option<JobResult>,
    pub error: Option<String>,
    pub duration_ms: i64,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub steps: Vec<StepOutcome>,
}

impl CycleReport {
    pub fn all_succeeded(&self) -> bool {
        self.steps.iter().all(StepOutcome::succeeded)
    }

    pub fn failed_steps(&self) -> Vec<&'static str> {
        self.steps
            .iter()
            .filter(|s| !s.succeeded())
            .map(|s| s.job_name)
            .collect()
    }
}

/// Runs price → news → report once. A failed step is logged and the next
/// step still runs.
pub async fn run_cycle(ctx: &AppContext) -> CycleReport {
    info!("Starting agent sequence...");

    let steps = vec![
        execute_job_with_tracking("collect_price", ctx.clone(), price_job::run).await,
        execute_job_with_tracking("collect_news", ctx.clone(), news_job::run).await,
        execute_job_with_tracking("send_report", ctx.clone(), report_job::run).await,
    ];
    let report = CycleReport { steps };

    if report.all_succeeded() {
        info!("All agents completed successfully");
    } else {
        error!("Agent sequence finished with failures: {:?}", report.failed_steps());
    }
    report
}

/// Logs start, success (with counts and duration) or failure of one step.
pub async fn execute_job_with_tracking<F, Fut>(
    job_name: &'static str,
    context: AppContext,
    job_fn: F,
) -> StepOutcome
where
    F: FnOnce(AppContext) -> Fut,
    Fut: Future<Output = Result<JobResult, AppError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();

    let result = job_fn(context).await;

    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
                job_name, job_result.items_processed, job_result.items_failed, duration_ms
            );
            StepOutcome { job_name, result: Some(job_result), error: None, duration_ms }
        }
        Err(e) => {
            error!("❌ Job failed: {} - {}", job_name, e);
            StepOutcome { job_name, result: None, error: Some(e.to_string()), duration_ms }
        }
    }
}

/// Interval driver: re-runs the pipeline on a fixed cadence.
pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: AppContext,
    config: SchedulerConfig,
    cycle_lock: Arc<Mutex<()>>,
}

impl JobSchedulerService {
    pub async fn new(context: AppContext, config: SchedulerConfig) -> Result<Self, AppError> {
        config.validate()?;

        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            context,
            config,
            cycle_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Runs one cycle unless another is still in flight.
    pub async fn run_exclusive(&self) -> Option<CycleReport> {
        run_guarded(&self.cycle_lock, &self.context).await
    }

    pub async fn start(&mut self) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        let interval = Duration::from_secs(self.config.interval_minutes * 60);
        let context = self.context.clone();
        let cycle_lock = self.cycle_lock.clone();

        let job = Job::new_repeated_async(interval, move |_uuid, _l| {
            let context = context.clone();
            let cycle_lock = cycle_lock.clone();
            Box::pin(async move {
                run_guarded(&cycle_lock, &context).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create pipeline job: {}", e)))?;

        self.scheduler.add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add pipeline job: {}", e)))?;

        self.scheduler.start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("📅 Scheduled: agent pipeline every {} minutes", self.config.interval_minutes);
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        self.scheduler.shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }
}

async fn run_guarded(cycle_lock: &Mutex<()>, context: &AppContext) -> Option<CycleReport> {
    let Ok(_guard) = cycle_lock.try_lock() else {
        warn!("Previous agent sequence still running, skipping this tick");
        return None;
    };
    Some(run_cycle(context).await)
}
