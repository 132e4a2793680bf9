pub mod chart_service;
pub mod job_scheduler_service;
pub mod llm_service;
pub mod news_service;
pub mod notification_service;
pub mod price_service;
pub mod report_service;
