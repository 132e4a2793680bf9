use std::str::FromStr;

use crate::errors::AppError;

const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
const DEFAULT_SIGNATURE: &str =
    "\n\n--\nFinance Agent\nAutomated Market Analysis\nUpdates every 10 minutes | 24/7 monitoring\n";

/// Full runtime configuration, assembled from environment variables.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub asset: AssetConfig,
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub smtp: SmtpConfig,
    pub report: ReportConfig,
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            database: DatabaseConfig::from_env()?,
            asset: AssetConfig::from_env(),
            search: SearchConfig::from_env()?,
            llm: LlmConfig::from_env()?,
            smtp: SmtpConfig::from_env()?,
            report: ReportConfig::from_env()?,
            scheduler: SchedulerConfig::from_env()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
            run_migrations: false,
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            url: required("DATABASE_URL")?,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            run_migrations: parse_or("DATABASE_RUN_MIGRATIONS", defaults.run_migrations)?,
        })
    }
}

/// The tracked asset and the quote API used to price it.
#[derive(Debug, Clone)]
pub struct AssetConfig {
    pub coin_id: String,
    pub symbol: String,
    pub name: String,
    pub vs_currency: String,
    pub price_api_base_url: String,
    pub price_api_key: Option<String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            coin_id: "bitcoin".to_string(),
            symbol: "BTC".to_string(),
            name: "Bitcoin".to_string(),
            vs_currency: "usd".to_string(),
            price_api_base_url: DEFAULT_COINGECKO_URL.to_string(),
            price_api_key: None,
        }
    }
}

impl AssetConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            coin_id: string_or("ASSET_COIN_ID", defaults.coin_id),
            symbol: string_or("ASSET_SYMBOL", defaults.symbol),
            name: string_or("ASSET_NAME", defaults.name),
            vs_currency: string_or("ASSET_VS_CURRENCY", defaults.vs_currency),
            price_api_base_url: string_or("PRICE_API_BASE_URL", defaults.price_api_base_url),
            price_api_key: optional("COINGECKO_API_KEY"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub result_count: u32,
    pub freshness: String,
    pub results_per_query: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            result_count: 20,
            freshness: "pd".to_string(),
            results_per_query: 10,
        }
    }
}

impl SearchConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            api_key: optional("BRAVE_API_KEY"),
            result_count: parse_or("SEARCH_RESULT_COUNT", defaults.result_count)?,
            freshness: string_or("SEARCH_FRESHNESS", defaults.freshness),
            results_per_query: parse_or("SEARCH_RESULTS_PER_QUERY", defaults.results_per_query)?,
        })
    }
}

/// Configuration for LLM service
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub enabled: bool,
    pub provider: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "openai".to_string(),
            api_key: None,
            model: "gpt-4".to_string(),
            max_tokens: None,
            temperature: None,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            enabled: parse_or("LLM_ENABLED", defaults.enabled)?,
            provider: string_or("LLM_PROVIDER", defaults.provider),
            api_key: optional("OPENAI_API_KEY"),
            model: string_or("LLM_MODEL", defaults.model),
            max_tokens: parse_optional("LLM_MAX_TOKENS")?,
            temperature: parse_optional("LLM_TEMPERATURE")?,
            timeout_secs: parse_or("LLM_TIMEOUT_SECS", defaults.timeout_secs)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub starttls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: Option<String>,
    pub from_name: String,
    pub to_email: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "smtp.gmail.com".to_string(),
            port: 465,
            starttls: false,
            username: None,
            password: None,
            from_email: None,
            from_name: "Finance Agent".to_string(),
            to_email: None,
        }
    }
}

impl SmtpConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        let username = optional("SMTP_USERNAME");
        Ok(Self {
            enabled: parse_or("SMTP_ENABLED", defaults.enabled)?,
            host: string_or("SMTP_HOST", defaults.host),
            port: parse_or("SMTP_PORT", defaults.port)?,
            starttls: parse_or("SMTP_STARTTLS", defaults.starttls)?,
            password: optional("SMTP_PASSWORD").or_else(|| optional("GMAIL_APP_PASSWORD")),
            from_email: optional("SMTP_FROM_EMAIL").or_else(|| username.clone()),
            username,
            from_name: string_or("SMTP_FROM_NAME", defaults.from_name),
            to_email: optional("SMTP_TO_EMAIL"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub news_limit: u32,
    pub attach_chart: bool,
    pub chart_width: u32,
    pub chart_height: u32,
    pub signature: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            news_limit: 10,
            attach_chart: true,
            chart_width: 1200,
            chart_height: 600,
            signature: DEFAULT_SIGNATURE.to_string(),
        }
    }
}

impl ReportConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            news_limit: parse_or("REPORT_NEWS_LIMIT", defaults.news_limit)?,
            attach_chart: parse_or("REPORT_ATTACH_CHART", defaults.attach_chart)?,
            chart_width: parse_or("CHART_WIDTH", defaults.chart_width)?,
            chart_height: parse_or("CHART_HEIGHT", defaults.chart_height)?,
            signature: string_or("REPORT_SIGNATURE", defaults.signature),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval_minutes: u64,
    pub run_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 10,
            run_on_start: true,
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        let config = Self {
            interval_minutes: parse_or("SCHEDULE_INTERVAL_MINUTES", defaults.interval_minutes)?,
            run_on_start: parse_or("SCHEDULE_RUN_ON_START", defaults.run_on_start)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.interval_minutes == 0 {
            return Err(AppError::Config(
                "SCHEDULE_INTERVAL_MINUTES must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn required(key: &str) -> Result<String, AppError> {
    optional(key).ok_or_else(|| AppError::Config(format!("{} not set", key)))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn string_or(key: &str, default: String) -> String {
    optional(key).unwrap_or(default)
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    Ok(parse_optional(key)?.unwrap_or(default))
}

fn parse_optional<T: FromStr>(key: &str) -> Result<Option<T>, AppError> {
    match optional(key) {
        Some(raw) => parse_value(key, &raw).map(Some),
        None => Ok(None),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", key, raw)))
}
