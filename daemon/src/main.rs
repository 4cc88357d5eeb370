//! Social KYC daemon: loads configuration, connects storage and runs the
//! service until SIGINT or SIGTERM.

use anyhow::Context;
use clap::Parser;
use socialkyc_node::{init_logging, Backends, LogFormat, ServiceConfig, SocialKycNode};
use socialkyc_store_pg::PgStore;
use socialkyc_types::SystemClock;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "socialkyc-daemon", about = "Social KYC verification service")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base; CLI
    /// flags and env vars override them.
    #[arg(long, env = "SOCIALKYC_CONFIG")]
    config: Option<PathBuf>,

    /// API key for the rendering proxy.
    #[arg(long, env = "SOCIALKYC_SCRAPER_API_KEY", hide_env_values = true)]
    scraper_api_key: Option<String>,

    /// Rendering proxy endpoint.
    #[arg(long, env = "SOCIALKYC_SCRAPER_URL")]
    scraper_url: Option<String>,

    /// Chat webhook for failure alerts.
    #[arg(long, env = "SOCIALKYC_ALERT_WEBHOOK_URL", hide_env_values = true)]
    alert_webhook_url: Option<String>,

    /// URL of the remote JSON configuration.
    #[arg(long, env = "SOCIALKYC_REMOTE_CONFIG_URL")]
    remote_config_url: Option<String>,

    /// PostgreSQL connection string.
    #[arg(long, env = "SOCIALKYC_DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    #[arg(long, env = "SOCIALKYC_FACEBOOK_APP_ID")]
    facebook_app_id: Option<String>,

    #[arg(long, env = "SOCIALKYC_FACEBOOK_APP_SECRET", hide_env_values = true)]
    facebook_app_secret: Option<String>,

    /// Template tree root.
    #[arg(long, env = "SOCIALKYC_TEMPLATES_DIR")]
    templates_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SOCIALKYC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SOCIALKYC_LOG_FORMAT")]
    log_format: Option<String>,
}

impl Cli {
    fn overlay(self, mut config: ServiceConfig) -> ServiceConfig {
        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }
        set(&mut config.scraper.api_key, self.scraper_api_key);
        set(&mut config.scraper.base_url, self.scraper_url);
        set(&mut config.alerts.webhook_url, self.alert_webhook_url);
        set(&mut config.remote_config.url, self.remote_config_url);
        set(&mut config.database.url, self.database_url);
        set(&mut config.facebook.app_id, self.facebook_app_id);
        set(&mut config.facebook.app_secret, self.facebook_app_secret);
        set(&mut config.templates_dir, self.templates_dir);
        set(&mut config.log_level, self.log_level);
        set(&mut config.log_format, self.log_format);
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            ServiceConfig::from_toml_file(&path)
                .with_context(|| format!("failed to load config file {path}"))?
        }
        None => ServiceConfig::default(),
    };
    let config = cli.overlay(file_config);

    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level)?;
    config.validate()?;

    let store = PgStore::connect(&config.database.url, config.database.max_connections)
        .await
        .context("failed to connect to postgres")?;
    store.migrate().await.context("failed to create tables")?;

    let store = Arc::new(store);
    let backends = Backends::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(SystemClock),
    );
    let mut node = SocialKycNode::new(config, backends)?;
    node.start().await?;

    node.shutdown_controller().wait_for_signal().await;
    tracing::info!("shutdown signal received, stopping node");
    node.stop().await;

    tracing::info!("social kyc daemon exited cleanly");
    Ok(())
}
