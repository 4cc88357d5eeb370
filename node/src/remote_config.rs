//! Remote configuration synchronizer.
//!
//! A JSON document is fetched from a remote URL at startup and then on a
//! fixed interval. Every accepted payload replaces the in-memory
//! [`ConfigSnapshot`] as a whole; readers clone an `Arc` and never observe a
//! partial update.

use async_trait::async_trait;
use socialkyc_fetch::RetryPolicy;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Error)]
pub enum RemoteConfigError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("payload is missing required marker {0:?}")]
    MissingMarker(String),

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    #[error("invalid json: {0}")]
    Json(String),
}

/// One accepted payload. `version` starts at 0 for the empty snapshot and
/// increases by one per replacement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub version: u64,
    pub body: String,
}

impl ConfigSnapshot {
    pub fn json(&self) -> Result<serde_json::Value, RemoteConfigError> {
        serde_json::from_str(&self.body).map_err(|e| RemoteConfigError::Json(e.to_string()))
    }
}

#[derive(Debug)]
pub struct SnapshotHolder {
    current: RwLock<Arc<ConfigSnapshot>>,
}

impl SnapshotHolder {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(ConfigSnapshot {
                version: 0,
                body: String::new(),
            })),
        }
    }

    pub fn current(&self) -> Arc<ConfigSnapshot> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Install `body` as the next version and return that version.
    pub fn replace(&self, body: String) -> u64 {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let version = guard.version + 1;
        *guard = Arc::new(ConfigSnapshot { version, body });
        version
    }
}

impl Default for SnapshotHolder {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the raw configuration payload comes from.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn fetch(&self) -> Result<String, RemoteConfigError>;
}

/// Plain `GET` of a JSON document.
pub struct HttpConfigSource {
    http_client: reqwest::Client,
    url: String,
}

impl HttpConfigSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteConfigError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteConfigError::Request(e.to_string()))?;
        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ConfigSource for HttpConfigSource {
    async fn fetch(&self) -> Result<String, RemoteConfigError> {
        let response = self
            .http_client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RemoteConfigError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteConfigError::Status(status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| RemoteConfigError::Request(e.to_string()))
    }
}

pub struct RemoteConfigSynchronizer {
    source: Arc<dyn ConfigSource>,
    holder: Arc<SnapshotHolder>,
    required_markers: Vec<String>,
    refresh_interval: Duration,
    retry: RetryPolicy,
}

impl RemoteConfigSynchronizer {
    pub fn new(
        source: Arc<dyn ConfigSource>,
        holder: Arc<SnapshotHolder>,
        required_markers: Vec<String>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            source,
            holder,
            required_markers,
            refresh_interval,
            retry: RetryPolicy::background(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn holder(&self) -> &Arc<SnapshotHolder> {
        &self.holder
    }

    /// Load the first snapshot. The service must not start if this fails.
    pub async fn initial_refresh(&self) -> Result<u64, RemoteConfigError> {
        let version = self.refresh().await?;
        tracing::info!(version, "initial remote config loaded");
        Ok(version)
    }

    /// Fetch and install one payload, retrying within this refresh's budget.
    pub async fn refresh(&self) -> Result<u64, RemoteConfigError> {
        let attempts = self.retry.attempts();
        let mut last = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.retry.delay(attempt - 1)).await;
            }
            match self.fetch_checked().await {
                Ok(body) => {
                    let version = self.holder.replace(body);
                    tracing::debug!(version, attempt = attempt + 1, "remote config replaced");
                    return Ok(version);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        error = %e,
                        "remote config fetch failed"
                    );
                    last = e.to_string();
                }
            }
        }

        Err(RemoteConfigError::Exhausted { attempts, last })
    }

    async fn fetch_checked(&self) -> Result<String, RemoteConfigError> {
        let body = self.source.fetch().await?;
        if let Some(marker) = self
            .required_markers
            .iter()
            .find(|marker| !body.contains(marker.as_str()))
        {
            return Err(RemoteConfigError::MissingMarker(marker.clone()));
        }
        Ok(body)
    }

    /// Refresh every `refresh_interval` until shutdown. A failed refresh
    /// keeps the current snapshot and is tried again on the next tick.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut interval = interval_at(Instant::now() + self.refresh_interval, self.refresh_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = interval.tick() => {}
            }
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                result = self.refresh() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "remote config refresh failed, keeping current snapshot");
                    }
                }
            }
        }
        tracing::info!("remote config synchronizer shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Scripted {
        responses: Mutex<Vec<Result<String, RemoteConfigError>>>,
    }

    impl Scripted {
        fn new(mut responses: Vec<Result<String, RemoteConfigError>>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
            })
        }
    }

    #[async_trait]
    impl ConfigSource for Scripted {
        async fn fetch(&self) -> Result<String, RemoteConfigError> {
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(RemoteConfigError::Status(503)))
        }
    }

    fn synchronizer(source: Arc<Scripted>) -> RemoteConfigSynchronizer {
        RemoteConfigSynchronizer::new(
            source,
            Arc::new(SnapshotHolder::new()),
            vec!["\"kyc\"".into()],
            Duration::from_secs(60),
        )
        .with_retry(RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2)))
    }

    #[test]
    fn replace_bumps_the_version() {
        let holder = SnapshotHolder::new();
        assert_eq!(holder.current().version, 0);
        assert_eq!(holder.replace("a".into()), 1);
        assert_eq!(holder.replace("b".into()), 2);
        assert_eq!(*holder.current(), ConfigSnapshot { version: 2, body: "b".into() });
    }

    #[test]
    fn readers_keep_their_snapshot() {
        let holder = SnapshotHolder::new();
        holder.replace("old".into());
        let held = holder.current();
        holder.replace("new".into());
        assert_eq!(held.body, "old");
        assert_eq!(holder.current().body, "new");
    }

    #[tokio::test]
    async fn refresh_retries_until_a_valid_payload() {
        let sync = synchronizer(Scripted::new(vec![
            Err(RemoteConfigError::Status(500)),
            Ok(r#"{"kyc": {"enabled": true}}"#.into()),
        ]));
        assert_eq!(sync.initial_refresh().await.unwrap(), 1);
        let json = sync.holder().current().json().unwrap();
        assert_eq!(json["kyc"]["enabled"], true);
    }

    #[tokio::test]
    async fn payload_without_markers_leaves_the_snapshot_unchanged() {
        let sync = synchronizer(Scripted::new(vec![
            Ok(r#"{"kyc": 1}"#.into()),
            Ok(r#"{"other": 1}"#.into()),
            Ok(r#"{"other": 2}"#.into()),
            Ok(r#"{"other": 3}"#.into()),
        ]));
        sync.refresh().await.unwrap();
        let err = sync.refresh().await.unwrap_err();
        assert!(matches!(err, RemoteConfigError::Exhausted { attempts: 3, .. }));
        assert_eq!(
            *sync.holder().current(),
            ConfigSnapshot { version: 1, body: r#"{"kyc": 1}"#.into() }
        );
    }

    #[tokio::test]
    async fn initial_refresh_failure_is_reported() {
        let sync = synchronizer(Scripted::new(Vec::new()));
        assert!(sync.initial_refresh().await.is_err());
        assert_eq!(sync.holder().current().version, 0);
    }
}
