//! End-to-end pipeline runs with in-memory fakes for every external service.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{harness, harness_with_llm, test_config, BrokenPrice, CannedSearch, FixedPrice, ScriptedLlm};
use crypto_agents::jobs::{price_job, report_job};
use crypto_agents::services::job_scheduler_service::{run_cycle, JobSchedulerService};

fn search() -> CannedSearch {
    CannedSearch::default()
        .with("stock market", &["https://news.example.com/stocks"])
        .with("Bitcoin", &["https://news.example.com/btc"])
}

#[tokio::test]
async fn test_full_cycle_sends_one_report() {
    let h = harness(test_config(), Arc::new(FixedPrice(67123.456)), search());

    let report = run_cycle(&h.context).await;

    assert!(report.all_succeeded(), "failed: {:?}", report.failed_steps());
    assert_eq!(
        report.steps.iter().map(|s| s.job_name).collect::<Vec<_>>(),
        vec!["collect_price", "collect_news", "send_report"]
    );
    assert_eq!(h.store.price_count().await, 1);
    assert_eq!(h.store.news_count().await, 2);

    let sent = h.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Bitcoin holds steady");
    assert!(sent[0].body.starts_with("Dear reader,"));
    assert!(sent[0].body.contains("Best Regards,\n--\nTest Agent"));
    assert!(sent[0].attachment.is_none());

    let prompt = h.llm.last_user_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("$67,123.46"));
    assert!(prompt.contains("Recent Financial News:"));
}

#[tokio::test]
async fn test_failed_price_step_does_not_stop_the_cycle() {
    let h = harness(test_config(), Arc::new(BrokenPrice), search());

    let report = run_cycle(&h.context).await;

    assert_eq!(report.failed_steps(), vec!["collect_price"]);
    assert_eq!(report.steps.len(), 3);
    assert_eq!(h.store.news_count().await, 2);
    // No price today, so the report step skips without sending.
    assert!(h.mailer.sent.lock().unwrap().is_empty());
    assert_eq!(h.llm.completions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_report_without_news_uses_price_only_prompt() {
    let h = harness(test_config(), Arc::new(FixedPrice(50000.0)), CannedSearch::default());

    price_job::run(h.context.clone()).await.unwrap();
    let result = report_job::run(h.context.clone()).await.unwrap();

    assert_eq!(result.items_processed, 1);
    let prompt = h.llm.last_user_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.starts_with("Based on this data, create a brief price update email:"));
    assert_eq!(h.mailer.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_report_skipped_without_prices() {
    let h = harness(test_config(), Arc::new(FixedPrice(1.0)), search());

    let result = report_job::run(h.context.clone()).await.unwrap();

    assert_eq!(result.items_processed, 0);
    assert!(h.mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_scheduler_runs_exclusive_cycle() {
    let h = harness(test_config(), Arc::new(FixedPrice(42000.0)), search());
    let scheduler_config = h.context.config.scheduler.clone();

    let scheduler = JobSchedulerService::new(h.context.clone(), scheduler_config)
        .await
        .unwrap();
    let report = scheduler.run_exclusive().await.unwrap();

    assert!(report.all_succeeded());
    assert_eq!(h.mailer.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_scheduler_rejects_zero_interval() {
    let h = harness(test_config(), Arc::new(FixedPrice(1.0)), search());
    let mut scheduler_config = h.context.config.scheduler.clone();
    scheduler_config.interval_minutes = 0;

    assert!(JobSchedulerService::new(h.context.clone(), scheduler_config).await.is_err());
}

#[tokio::test]
async fn test_busy_tick_is_skipped() {
    let h = harness_with_llm(
        test_config(),
        Arc::new(FixedPrice(42000.0)),
        search(),
        ScriptedLlm::gated(),
    );
    let scheduler = JobSchedulerService::new(h.context.clone(), h.context.config.scheduler.clone())
        .await
        .unwrap();

    let (first, overlapping) = tokio::join!(scheduler.run_exclusive(), async {
        // The first cycle is now parked inside the report step.
        h.llm.entered.notified().await;
        let overlapping = scheduler.run_exclusive().await;
        h.llm.release.notify_one();
        overlapping
    });

    assert!(overlapping.is_none());
    assert!(first.unwrap().all_succeeded());
    assert_eq!(h.store.price_count().await, 1);
    assert_eq!(h.mailer.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_report_attaches_price_chart() {
    let mut config = test_config();
    config.report.attach_chart = true;
    let h = harness(config, Arc::new(FixedPrice(65000.0)), CannedSearch::default());

    price_job::run(h.context.clone()).await.unwrap();
    report_job::run(h.context.clone()).await.unwrap();

    let sent = h.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let attachment = sent[0].attachment.as_ref().expect("chart attached");
    assert_eq!(attachment.filename, "btc_price_trend.png");
    assert_eq!(attachment.content_type, "image/png");
    assert!(attachment.data.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[tokio::test]
async fn test_chart_failure_still_sends_report() {
    let mut config = test_config();
    config.report.attach_chart = true;
    config.report.chart_width = 0;
    let h = harness(config, Arc::new(FixedPrice(65000.0)), CannedSearch::default());

    price_job::run(h.context.clone()).await.unwrap();
    let result = report_job::run(h.context.clone()).await.unwrap();

    assert_eq!(result.items_processed, 1);
    let sent = h.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].attachment.is_none());
}
