use std::sync::OnceLock;

use regex::Regex;
use tracing::{error, info};

use crate::config::AssetConfig;
use crate::errors::AppError;
use crate::models::{ComposedReport, NewsItem, PriceSample};
use crate::services::llm_service::LlmService;
use crate::services::price_service::format_usd;

const SIGN_OFF: &str = "Best Regards,";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportPrompt {
    pub system: String,
    pub user: String,
}

pub fn build_context(prices: &[PriceSample], news: &[NewsItem], asset: &AssetConfig) -> String {
    let mut context = format!("Recent {} Prices:\n", asset.name);
    for sample in prices {
        context.push_str(&format!(
            "- {} at {}\n",
            format_usd(sample.price),
            sample.created_at.to_rfc3339()
        ));
    }

    if !news.is_empty() {
        context.push_str("\nRecent Financial News:\n");
        for item in news {
            context.push_str(&format!("- {}\n", item.summary));
        }
    }

    context
}

/// Analysis prompt when news is available, price-only update otherwise.
pub fn build_prompt(prices: &[PriceSample], news: &[NewsItem], asset: &AssetConfig) -> ReportPrompt {
    let context = build_context(prices, news, asset);
    let has_news = !news.is_empty();

    let system = if has_news {
        format!(
            "You are a professional financial and crypto analyst. Create a very concise but insightful \
             analysis of the recent {name} price movements and related financial news. Focus on key \
             correlations between market events and price changes. Keep the analysis short, professional, \
             and actionable. Format in a clear email structure with a subject line on the first line. \
             End the email with '{sign_off}' on a new line.",
            name = asset.name,
            sign_off = SIGN_OFF
        )
    } else {
        format!(
            "You are a professional financial analyst. Create a very brief price update email focusing only \
             on the {name} price movements. Keep it concise and professional. Format with a subject line on \
             the first line that indicates it's a price update only. End the email with '{sign_off}' on a \
             new line.",
            name = asset.name,
            sign_off = SIGN_OFF
        )
    };

    let kind = if has_news { "short analysis" } else { "brief price update" };
    let user = format!("Based on this data, create a {} email:\n\n{}", kind, context);

    ReportPrompt { system, user }
}

/// Puts the signature after every sign-off line, or at the end if there is none.
pub fn append_signature(content: &str, signature: &str) -> String {
    if content.contains(SIGN_OFF) {
        content.replace(SIGN_OFF, &format!("{}{}", SIGN_OFF, signature))
    } else {
        format!("{}{}", content, signature)
    }
}

/// Splits drafted content into (subject, body). The first line is the subject.
pub fn split_subject(content: &str, asset: &AssetConfig) -> (String, String) {
    let content = content.trim();
    let prefix = subject_prefix();

    match content.split_once('\n') {
        Some((first, rest)) => (subject_line(first, prefix, asset), rest.trim().to_string()),
        // A lone "Subject: ..." line is all subject, no body.
        None if prefix.is_match(content) => (subject_line(content, prefix, asset), String::new()),
        None => (default_subject(asset), content.to_string()),
    }
}

fn subject_line(line: &str, prefix: &Regex, asset: &AssetConfig) -> String {
    let subject = prefix.replace(line, "").trim().trim_matches('*').trim().to_string();
    if subject.is_empty() { default_subject(asset) } else { subject }
}

fn subject_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| Regex::new(r"(?i)^\s*\**\s*subject\s*:\s*\**").expect("valid subject regex"))
}

fn default_subject(asset: &AssetConfig) -> String {
    format!("{} Market Update", asset.name)
}

/// Drafts the report email. `None` when there are no price samples to report on.
pub async fn compose_report(
    llm: &LlmService,
    prices: &[PriceSample],
    news: &[NewsItem],
    asset: &AssetConfig,
    signature: &str,
) -> Result<Option<ComposedReport>, AppError> {
    if prices.is_empty() {
        return Ok(None);
    }

    let prompt = build_prompt(prices, news, asset);
    info!(
        "Creating {} from {} price samples and {} news items",
        if news.is_empty() { "price update" } else { "analysis" },
        prices.len(),
        news.len()
    );

    let draft = llm
        .generate_completion(&prompt.system, &prompt.user)
        .await
        .map_err(|e| {
            error!("Error creating analysis: {}", e);
            AppError::from(e)
        })?;

    let (subject, body) = split_subject(&draft, asset);
    Ok(Some(ComposedReport {
        subject,
        body: append_signature(&body, signature),
        includes_news: !news.is_empty(),
    }))
}
