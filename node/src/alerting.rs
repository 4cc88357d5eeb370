//! Failure-rate alerting.
//!
//! One [`AlertLoop`] runs per social KYC step. Every tick it summarizes, per
//! registered network, the unsuccessful attempts and the successes since the
//! last alert, and posts the summary to a webhook when attempts failed because
//! the rendering proxy kept failing.
//!
//! Replicas coordinate through the alert row: it is read and advanced under a
//! row lock, and a replica that finds the row advanced less than 80% of a
//! period ago backs off.

use async_trait::async_trait;
use dashmap::DashMap;
use socialkyc_store::{AlertStore, StoreError};
use socialkyc_types::{Clock, KycStep, SocialNetwork, Timestamp};
use socialkyc_utils::format_duration;
use socialkyc_verification::{category, EXHAUSTED_RETRIES};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Webhook deadline.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Shortest tick period a loop will run with.
const MIN_FREQUENCY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum AlertError {
    /// Another replica advanced the row recently. Not a failure.
    #[error("alert row for step {0} on {1} was advanced by another replica")]
    RaceCondition(KycStep, SocialNetwork),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("webhook error: {0}")]
    Webhook(String),
}

/// Current tick period per KYC step, shared by every loop of the process.
#[derive(Debug)]
pub struct AlertFrequencies {
    periods: DashMap<KycStep, Duration>,
    default: Duration,
}

impl AlertFrequencies {
    pub fn new(default: Duration) -> Self {
        Self {
            periods: DashMap::new(),
            default: default.max(MIN_FREQUENCY),
        }
    }

    pub fn get(&self, step: KycStep) -> Duration {
        self.periods
            .get(&step)
            .map(|period| *period)
            .unwrap_or(self.default)
    }

    /// Store `period` for `step`. Returns whether the value changed.
    pub fn set(&self, step: KycStep, period: Duration) -> bool {
        let period = period.max(MIN_FREQUENCY);
        self.periods.insert(step, period) != Some(period)
    }
}

/// Where alert messages go.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), AlertError>;
}

/// Posts `{"text": ...}` to a chat webhook.
pub struct WebhookSink {
    http_client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Result<Self, AlertError> {
        let http_client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| AlertError::Webhook(e.to_string()))?;
        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    async fn send(&self, text: &str) -> Result<(), AlertError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| AlertError::Webhook(e.without_url().to_string()))?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(AlertError::Webhook(format!("unexpected status {status}")));
        }
        Ok(())
    }
}

/// What one (step, network) check found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertReport {
    pub kyc_step: KycStep,
    pub social: SocialNetwork,
    pub since: Timestamp,
    pub until: Timestamp,
    /// Unsuccessful attempts per category.
    pub failures: BTreeMap<String, u64>,
    pub successes: u64,
    pub sent: bool,
}

impl AlertReport {
    pub fn should_alert(&self) -> bool {
        self.failures.get(EXHAUSTED_RETRIES).copied().unwrap_or(0) > 0
    }

    pub fn message(&self) -> String {
        let mut text = format!(
            "[{social}][kyc step {step}] unsuccessful attempts in the last {window}:",
            social = self.social,
            step = self.kyc_step,
            window = format_duration(self.since.elapsed_since(self.until)),
        );
        for (failure, count) in &self.failures {
            text.push_str(&format!("\n{failure}: {count}"));
        }
        text.push_str(&format!("\nsuccessful: {}", self.successes));
        text
    }
}

/// Collapse raw reasons into alert categories.
pub fn categorize<'a>(reasons: impl IntoIterator<Item = (&'a str, u64)>) -> BTreeMap<String, u64> {
    let mut categories = BTreeMap::new();
    for (reason, count) in reasons {
        *categories.entry(category(reason).to_string()).or_insert(0) += count;
    }
    categories
}

pub struct AlertLoop {
    kyc_step: KycStep,
    networks: Vec<SocialNetwork>,
    store: Arc<dyn AlertStore>,
    sink: Arc<dyn AlertSink>,
    frequencies: Arc<AlertFrequencies>,
    clock: Arc<dyn Clock>,
}

impl AlertLoop {
    pub fn new(
        kyc_step: KycStep,
        networks: Vec<SocialNetwork>,
        store: Arc<dyn AlertStore>,
        sink: Arc<dyn AlertSink>,
        frequencies: Arc<AlertFrequencies>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            kyc_step,
            networks,
            store,
            sink,
            frequencies,
            clock,
        }
    }

    pub fn kyc_step(&self) -> KycStep {
        self.kyc_step
    }

    /// Check every network once. Networks another replica just handled are
    /// skipped; other errors are logged and do not stop the remaining checks.
    pub async fn tick(&self) -> Vec<AlertReport> {
        let mut reports = Vec::new();
        for &social in &self.networks {
            match self.check(social).await {
                Ok(report) => reports.push(report),
                Err(AlertError::RaceCondition(step, social)) => {
                    tracing::debug!(step = %step, social = %social, "alert row recently advanced, skipping");
                }
                Err(e) => {
                    tracing::error!(step = %self.kyc_step, social = %social, error = %e, "alert check failed");
                }
            }
        }
        reports
    }

    /// Summarize and advance the (step, `social`) alert row, then post the
    /// summary if it warrants an alert.
    pub async fn check(&self, social: SocialNetwork) -> Result<AlertReport, AlertError> {
        let mut txn = self.store.lock_alert_state(self.kyc_step, social).await?;
        let now = self.clock.now();
        let state = txn.state().clone();

        let period = self.frequencies.get(self.kyc_step);
        let elapsed_ms = u128::from(state.last_alert_at.elapsed_since(now)) * 1000;
        if elapsed_ms * 10 < period.as_millis() * 8 {
            return Err(AlertError::RaceCondition(self.kyc_step, social));
        }

        if Duration::from_secs(state.frequency_secs) != period
            && self
                .frequencies
                .set(self.kyc_step, Duration::from_secs(state.frequency_secs))
        {
            tracing::info!(
                step = %self.kyc_step,
                social = %social,
                frequency_secs = state.frequency_secs,
                "alert frequency changed"
            );
        }

        let reasons = txn.unsuccessful_reasons_since(state.last_alert_at).await?;
        let successes = txn.successes_since(state.last_alert_at).await?;
        txn.set_last_alert_at(now).await?;
        txn.commit().await?;

        let mut report = AlertReport {
            kyc_step: self.kyc_step,
            social,
            since: state.last_alert_at,
            until: now,
            failures: categorize(reasons.iter().map(|r| (r.reason.as_str(), r.count))),
            successes,
            sent: false,
        };

        if report.should_alert() {
            match self.sink.send(&report.message()).await {
                Ok(()) => report.sent = true,
                Err(e) => {
                    tracing::warn!(step = %self.kyc_step, social = %social, error = %e, "failed to post alert");
                }
            }
        }
        Ok(report)
    }

    /// Tick until shutdown, following period changes picked up from storage.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut period = self.frequencies.get(self.kyc_step);
        let mut interval = ticker(period);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = interval.tick() => {}
            }
            self.tick().await;

            let current = self.frequencies.get(self.kyc_step);
            if current != period {
                period = current;
                interval = ticker(period);
            }
        }
        tracing::info!(step = %self.kyc_step, "alert loop shutting down");
    }
}

fn ticker(period: Duration) -> Interval {
    let period = period.max(MIN_FREQUENCY);
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_collapse_reason_prefixes() {
        let categories = categorize([
            ("fetch failed: exhausted retries", 2),
            ("scrape failed: exhausted retries", 1),
            ("fetch failed: body read", 4),
            ("duplicate userhandle", 1),
            ("post not found", 3),
        ]);
        assert_eq!(categories.get(EXHAUSTED_RETRIES), Some(&3));
        assert_eq!(categories.get("body read"), Some(&4));
        assert_eq!(categories.get("duplicate userhandle"), Some(&1));
        assert_eq!(categories.get("post not found"), Some(&3));
    }

    #[test]
    fn frequencies_default_and_clamp() {
        let frequencies = AlertFrequencies::new(Duration::from_secs(60));
        assert_eq!(frequencies.get(KycStep::SOCIAL_1), Duration::from_secs(60));
        assert!(frequencies.set(KycStep::SOCIAL_1, Duration::from_secs(120)));
        assert!(!frequencies.set(KycStep::SOCIAL_1, Duration::from_secs(120)));
        assert!(frequencies.set(KycStep::SOCIAL_2, Duration::ZERO));
        assert_eq!(frequencies.get(KycStep::SOCIAL_2), MIN_FREQUENCY);
        assert_eq!(frequencies.get(KycStep::SOCIAL_1), Duration::from_secs(120));
    }

    #[test]
    fn only_exhausted_retries_alert() {
        let mut report = AlertReport {
            kyc_step: KycStep::SOCIAL_1,
            social: SocialNetwork::Twitter,
            since: Timestamp::new(0),
            until: Timestamp::new(3_600),
            failures: BTreeMap::from([("post not found".to_string(), 5)]),
            successes: 10,
            sent: false,
        };
        assert!(!report.should_alert());
        report.failures.insert(EXHAUSTED_RETRIES.to_string(), 1);
        assert!(report.should_alert());

        let message = report.message();
        assert!(message.starts_with("[twitter][kyc step 3] unsuccessful attempts in the last 1h 0m:"));
        assert!(message.contains("\nexhausted retries: 1"));
        assert!(message.contains("\npost not found: 5"));
        assert!(message.ends_with("\nsuccessful: 10"));
    }
}
