use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            loki_enabled: false,
            loki_url: None,
            service_name: "hedgeai".to_string(),
            environment: "development".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            loki_enabled: std::env::var("LOKI_ENABLED")
                .ok()
                .and_then(|raw| raw.trim().parse().ok())
                .unwrap_or(defaults.loki_enabled),
            loki_url: std::env::var("LOKI_URL").ok().filter(|url| !url.trim().is_empty()),
            service_name: std::env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.loki_enabled && self.loki_url.is_none() {
            anyhow::bail!("LOKI_ENABLED is true but LOKI_URL is not set");
        }
        Ok(())
    }
}

pub fn init_logging(config: LoggingConfig) -> anyhow::Result<()> {
    config.validate()?;

    #[cfg(feature = "loki")]
    {
        if config.loki_enabled {
            if let Some(loki_url) = config.loki_url.clone() {
                return init_with_loki(config, &loki_url);
            }
        }
    }

    init_console_only(config)
}

fn init_console_only(config: LoggingConfig) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::info!(
        "📊 Console logging initialized ({} / {})",
        config.service_name,
        config.environment
    );
    Ok(())
}

#[cfg(feature = "loki")]
fn init_with_loki(config: LoggingConfig, loki_url: &str) -> anyhow::Result<()> {
    let url = url::Url::parse(loki_url)?;

    let (loki_layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url)?;

    // Ships buffered events to Loki; must run on the tokio runtime.
    tokio::spawn(task);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .with(loki_layer)
        .try_init()?;

    tracing::info!("✅ Loki logging initialized at {}", loki_url);
    Ok(())
}
