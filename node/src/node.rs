//! Service wiring: builds the verification engine from configuration and
//! runs the background tasks.

use crate::alerting::{AlertFrequencies, AlertLoop, AlertSink, WebhookSink};
use crate::config::ServiceConfig;
use crate::remote_config::{ConfigSource, HttpConfigSource, RemoteConfigSynchronizer, SnapshotHolder};
use crate::shutdown::ShutdownController;
use crate::NodeError;
use socialkyc_fetch::{PageFetcher, RetryPolicy, ScrapingClient, ScrapingClientConfig};
use socialkyc_store::{AlertStore, SocialStore, UserRepository};
use socialkyc_types::{Clock, KycStep};
use socialkyc_verification::{
    FacebookVerifier, OrchestratorConfig, SocialKyc, TemplateStore, TwitterVerifier,
    VerifierRegistry,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long [`SocialKycNode::stop`] waits for background tasks.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Storage, clock and outbound seams the node runs on.
///
/// Outbound seams left unset are built from the configuration.
pub struct Backends {
    pub users: Arc<dyn UserRepository>,
    pub socials: Arc<dyn SocialStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub clock: Arc<dyn Clock>,
    pub fetcher: Option<Arc<dyn PageFetcher>>,
    pub config_source: Option<Arc<dyn ConfigSource>>,
    pub alert_sink: Option<Arc<dyn AlertSink>>,
}

impl Backends {
    pub fn new(
        users: Arc<dyn UserRepository>,
        socials: Arc<dyn SocialStore>,
        alerts: Arc<dyn AlertStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            socials,
            alerts,
            clock,
            fetcher: None,
            config_source: None,
            alert_sink: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_config_source(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.config_source = Some(source);
        self
    }

    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alert_sink = Some(sink);
        self
    }
}

pub struct SocialKycNode {
    config: ServiceConfig,
    kyc: Arc<SocialKyc>,
    alert_store: Arc<dyn AlertStore>,
    clock: Arc<dyn Clock>,
    synchronizer: Arc<RemoteConfigSynchronizer>,
    frequencies: Arc<AlertFrequencies>,
    alert_loops: Vec<Arc<AlertLoop>>,
    shutdown: ShutdownController,
    /// Handles for spawned background tasks (joined during shutdown).
    task_handles: Vec<JoinHandle<()>>,
}

impl SocialKycNode {
    /// Build every component. Nothing is spawned and no request is sent
    /// until [`start`](Self::start).
    pub fn new(config: ServiceConfig, backends: Backends) -> Result<Self, NodeError> {
        let fetcher: Arc<dyn PageFetcher> = match backends.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(ScrapingClient::new(scraping_config(&config))?),
        };

        let mut verifiers = VerifierRegistry::new();
        verifiers.register(Arc::new(TwitterVerifier::with_domains(
            fetcher,
            config.twitter.domains.clone(),
        )));
        if config.facebook.is_configured() {
            verifiers.register(Arc::new(FacebookVerifier::new(
                config.facebook.app_id.clone(),
                config.facebook.app_secret.clone(),
            )?));
        } else {
            tracing::info!("facebook credentials not set, facebook verification disabled");
        }
        let networks = verifiers.networks();

        let templates = TemplateStore::load(
            &config.templates_dir,
            &KycStep::SOCIAL_STEPS,
            &networks,
            &config.verification.default_language,
        )?;

        let kyc = Arc::new(SocialKyc::new(
            OrchestratorConfig {
                max_attempts: config.verification.max_attempts,
                retry_window_secs: config.verification.retry_window_secs,
            },
            backends.users,
            backends.socials,
            verifiers,
            Arc::new(templates),
            backends.clock.clone(),
        ));

        let config_source: Arc<dyn ConfigSource> = match backends.config_source {
            Some(source) => source,
            None => Arc::new(HttpConfigSource::new(
                config.remote_config.url.clone(),
                Duration::from_secs(config.remote_config.request_timeout_secs),
            )?),
        };
        let synchronizer = Arc::new(RemoteConfigSynchronizer::new(
            config_source,
            Arc::new(SnapshotHolder::new()),
            config.remote_config.required_markers.clone(),
            Duration::from_secs(config.remote_config.refresh_interval_secs),
        ));

        let alert_sink: Arc<dyn AlertSink> = match backends.alert_sink {
            Some(sink) => sink,
            None => Arc::new(
                WebhookSink::new(config.alerts.webhook_url.clone())
                    .map_err(|e| NodeError::Config(e.to_string()))?,
            ),
        };
        let frequencies = Arc::new(AlertFrequencies::new(Duration::from_secs(
            config.alerts.default_frequency_secs,
        )));
        let alert_loops = KycStep::SOCIAL_STEPS
            .into_iter()
            .map(|step| {
                Arc::new(AlertLoop::new(
                    step,
                    networks.clone(),
                    backends.alerts.clone(),
                    alert_sink.clone(),
                    frequencies.clone(),
                    backends.clock.clone(),
                ))
            })
            .collect();

        Ok(Self {
            config,
            kyc,
            alert_store: backends.alerts,
            clock: backends.clock,
            synchronizer,
            frequencies,
            alert_loops,
            shutdown: ShutdownController::new(),
            task_handles: Vec::new(),
        })
    }

    /// Load the initial remote config, make sure every alert row exists, and
    /// spawn the background tasks.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        if !self.task_handles.is_empty() {
            return Err(NodeError::AlreadyStarted);
        }
        self.synchronizer.initial_refresh().await?;
        self.prepare_alert_rows().await?;

        let synchronizer = self.synchronizer.clone();
        let shutdown_rx = self.shutdown.subscribe();
        self.task_handles
            .push(tokio::spawn(synchronizer.run(shutdown_rx)));

        for alert_loop in &self.alert_loops {
            let shutdown_rx = self.shutdown.subscribe();
            self.task_handles
                .push(tokio::spawn(alert_loop.clone().run(shutdown_rx)));
        }

        tracing::info!(
            networks = ?self.kyc.verifiers().networks(),
            alert_loops = self.alert_loops.len(),
            "social kyc node started"
        );
        Ok(())
    }

    /// Create missing alert rows and adopt each step's stored frequency.
    async fn prepare_alert_rows(&self) -> Result<(), NodeError> {
        let now = self.clock.now();
        let default_secs = self.config.alerts.default_frequency_secs;
        for alert_loop in &self.alert_loops {
            let step = alert_loop.kyc_step();
            for social in self.kyc.verifiers().networks() {
                self.alert_store
                    .ensure_alert_state(step, social, default_secs, now)
                    .await?;
                let state = self.alert_store.read_alert_state(step, social).await?;
                self.frequencies
                    .set(step, Duration::from_secs(state.frequency_secs));
            }
        }
        Ok(())
    }

    /// Signal every background task and wait for them to finish.
    pub async fn stop(&mut self) {
        tracing::info!("social kyc node stopping");
        self.shutdown.shutdown();

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all)
            .await
            .is_err()
        {
            tracing::warn!(
                "shutdown timeout ({:?}), some tasks may still be running",
                SHUTDOWN_TIMEOUT
            );
        }
        tracing::info!("social kyc node stopped");
    }

    pub fn kyc(&self) -> &Arc<SocialKyc> {
        &self.kyc
    }

    pub fn snapshot(&self) -> &Arc<SnapshotHolder> {
        self.synchronizer.holder()
    }

    pub fn frequencies(&self) -> &Arc<AlertFrequencies> {
        &self.frequencies
    }

    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

fn scraping_config(config: &ServiceConfig) -> ScrapingClientConfig {
    let retry = RetryPolicy::scraping();
    let mut scraping = ScrapingClientConfig::new(
        config.scraper.base_url.clone(),
        config.scraper.api_key.clone(),
    );
    scraping.render_timeout = Duration::from_secs(config.scraper.render_timeout_secs);
    scraping.request_timeout = Duration::from_secs(config.scraper.request_timeout_secs);
    scraping.retry = RetryPolicy::new(config.scraper.max_attempts, retry.min_backoff, retry.max_backoff);
    scraping
}
