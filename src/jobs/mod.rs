//! Pipeline steps run by the interval driver.
//!
//! Each step is an `async fn(AppContext) -> Result<JobResult, AppError>` so the
//! scheduler can wrap every step with the same start/success/failure logging.
//!
//! - `price_job` - records the current spot price
//! - `news_job` - searches for fresh market news and stores new items
//! - `report_job` - drafts, charts and emails the market summary

pub mod news_job;
pub mod price_job;
pub mod report_job;
