use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub log_file: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            loki_enabled: std::env::var("LOKI_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            loki_url: std::env::var("LOKI_URL").ok(),
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "crypto-agents".to_string()),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info".to_string()),
            log_dir: std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("logs")),
            log_file: std::env::var("LOG_FILE")
                .unwrap_or_else(|_| "crypto_agents.log".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.loki_enabled && self.loki_url.is_none() {
            return Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string());
        }
        if self.log_file.trim().is_empty() {
            return Err("LOG_FILE must not be empty".to_string());
        }
        Ok(())
    }
}

/// Installs the console and file sinks (plus Loki when enabled).
///
/// The returned guard flushes the file writer on drop, so the caller keeps it
/// alive for the lifetime of the process.
pub fn init_logging(config: LoggingConfig) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    config.validate()?;

    std::fs::create_dir_all(&config.log_dir)?;
    let file_appender = tracing_appender::rolling::never(&config.log_dir, &config.log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = tracing_subscriber::fmt::layer();
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer);

    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(console_layer)
        .with(file_layer);

    #[cfg(feature = "loki")]
    {
        if config.loki_enabled {
            if let Some(loki_url) = config.loki_url.clone() {
                let loki_layer = build_loki_layer(&config, &loki_url)?;
                registry.with(loki_layer).init();
                tracing::info!("📊 Logging initialized (console, {}, Loki at {})",
                    config.log_dir.join(&config.log_file).display(), loki_url);
                return Ok(guard);
            }
        }
    }

    registry.init();
    tracing::info!("📊 Logging initialized (console, {})",
        config.log_dir.join(&config.log_file).display());

    Ok(guard)
}

#[cfg(feature = "loki")]
fn build_loki_layer(
    config: &LoggingConfig,
    loki_url: &str,
) -> Result<tracing_loki::Layer, Box<dyn std::error::Error>> {
    let url = url::Url::parse(loki_url)?;

    let (loki_layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url)?;

    // Spawn the background task that sends logs to Loki
    tokio::spawn(task);

    Ok(loki_layer)
}
