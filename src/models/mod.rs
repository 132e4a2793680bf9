mod price_sample;
mod news_item;
mod report;

pub use price_sample::{NewPriceSample, PriceSample};
pub use news_item::{NewNewsItem, NewsItem, SearchHit};
pub use report::{ComposedReport, EmailAttachment, OutgoingEmail};
