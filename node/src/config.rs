//! Service configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::NodeError;

/// Configuration for the social KYC service.
///
/// Loaded from a TOML file via [`ServiceConfig::from_toml_file`]; the daemon
/// overlays CLI flags and environment variables before calling
/// [`ServiceConfig::validate`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter, e.g. "info" or "info,socialkyc_node=debug".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Root of the `<step>/<network>/<kind>/<language>.txt` template tree.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    #[serde(default)]
    pub verification: VerificationConfig,

    #[serde(default)]
    pub scraper: ScraperConfig,

    #[serde(default)]
    pub twitter: TwitterConfig,

    #[serde(default)]
    pub facebook: FacebookConfig,

    #[serde(default)]
    pub remote_config: RemoteConfigConfig,

    #[serde(default)]
    pub alerts: AlertsConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u64,

    #[serde(default = "default_retry_window_secs")]
    pub retry_window_secs: u64,

    #[serde(default = "default_language")]
    pub default_language: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Rendering proxy endpoint.
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Time the proxy may spend rendering one page.
    #[serde(default = "default_render_timeout_secs")]
    pub render_timeout_secs: u64,

    #[serde(default = "default_scrape_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_scrape_attempts")]
    pub max_attempts: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitterConfig {
    /// Domains a post URL may be hosted on.
    #[serde(default = "default_twitter_domains")]
    pub domains: Vec<String>,
}

/// Facebook is only offered when both credentials are set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacebookConfig {
    #[serde(default)]
    pub app_id: String,

    #[serde(default)]
    pub app_secret: String,
}

impl FacebookConfig {
    pub fn is_configured(&self) -> bool {
        !self.app_id.trim().is_empty() && !self.app_secret.trim().is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfigConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Substrings every accepted payload must contain.
    #[serde(default)]
    pub required_markers: Vec<String>,

    #[serde(default = "default_remote_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default)]
    pub webhook_url: String,

    /// Frequency for alert rows created on first start.
    #[serde(default = "default_alert_frequency_secs")]
    pub default_frequency_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("./verification/translations")
}

fn default_max_attempts() -> u64 {
    3
}

fn default_retry_window_secs() -> u64 {
    24 * 60 * 60
}

fn default_language() -> String {
    "en".to_string()
}

fn default_render_timeout_secs() -> u64 {
    30
}

fn default_scrape_request_timeout_secs() -> u64 {
    60
}

fn default_scrape_attempts() -> u32 {
    3
}

fn default_twitter_domains() -> Vec<String> {
    vec!["twitter.com".to_string(), "x.com".to_string()]
}

fn default_refresh_interval_secs() -> u64 {
    60
}

fn default_remote_request_timeout_secs() -> u64 {
    10
}

fn default_alert_frequency_secs() -> u64 {
    60 * 60
}

fn default_max_connections() -> u32 {
    10
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ServiceConfig {
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject configurations the service cannot start with.
    pub fn validate(&self) -> Result<(), NodeError> {
        let required = [
            ("scraper.base_url", &self.scraper.base_url),
            ("scraper.api_key", &self.scraper.api_key),
            ("remote_config.url", &self.remote_config.url),
            ("alerts.webhook_url", &self.alerts.webhook_url),
            ("database.url", &self.database.url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(NodeError::Config(format!("{name} is required")));
            }
        }
        if self.remote_config.required_markers.is_empty() {
            return Err(NodeError::Config(
                "remote_config.required_markers must not be empty".into(),
            ));
        }
        if self.verification.max_attempts == 0 {
            return Err(NodeError::Config(
                "verification.max_attempts must be at least 1".into(),
            ));
        }
        if self.remote_config.refresh_interval_secs == 0 {
            return Err(NodeError::Config(
                "remote_config.refresh_interval_secs must be at least 1".into(),
            ));
        }
        if self.twitter.domains.is_empty() {
            return Err(NodeError::Config("twitter.domains must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            log_level: default_log_level(),
            templates_dir: default_templates_dir(),
            verification: VerificationConfig::default(),
            scraper: ScraperConfig::default(),
            twitter: TwitterConfig::default(),
            facebook: FacebookConfig::default(),
            remote_config: RemoteConfigConfig::default(),
            alerts: AlertsConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_window_secs: default_retry_window_secs(),
            default_language: default_language(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            render_timeout_secs: default_render_timeout_secs(),
            request_timeout_secs: default_scrape_request_timeout_secs(),
            max_attempts: default_scrape_attempts(),
        }
    }
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            domains: default_twitter_domains(),
        }
    }
}

impl Default for RemoteConfigConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            refresh_interval_secs: default_refresh_interval_secs(),
            required_markers: Vec::new(),
            request_timeout_secs: default_remote_request_timeout_secs(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            default_frequency_secs: default_alert_frequency_secs(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ServiceConfig {
        ServiceConfig::from_toml_str(
            r#"
            [scraper]
            base_url = "https://render.example.com/v1"
            api_key = "key"

            [remote_config]
            url = "https://config.example.com/kyc.json"
            required_markers = ["\"kyc\"", "\"social\""]

            [alerts]
            webhook_url = "https://hooks.example.com/T000"

            [database]
            url = "postgres://localhost/socialkyc"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = complete();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = ServiceConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.verification.max_attempts, 3);
        assert_eq!(config.verification.default_language, "en");
        assert_eq!(config.twitter.domains, vec!["twitter.com", "x.com"]);
        assert_eq!(config.log_format, "human");
        assert!(!config.facebook.is_configured());
    }

    #[test]
    fn partial_toml_overrides() {
        let config = ServiceConfig::from_toml_str(
            r#"
            log_level = "debug"
            [verification]
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.verification.max_attempts, 5);
        assert_eq!(config.verification.retry_window_secs, 86_400);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn complete_config_validates() {
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn missing_required_values_fail_validation() {
        let mut config = complete();
        config.scraper.api_key = " ".into();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("scraper.api_key"));

        let mut config = complete();
        config.alerts.webhook_url.clear();
        assert!(config.validate().is_err());

        let mut config = complete();
        config.remote_config.required_markers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn facebook_needs_both_credentials() {
        let mut config = complete();
        config.facebook.app_id = "app".into();
        assert!(!config.facebook.is_configured());
        config.facebook.app_secret = "secret".into();
        assert!(config.facebook.is_configured());
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = ServiceConfig::from_toml_file("/nonexistent/socialkyc.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
