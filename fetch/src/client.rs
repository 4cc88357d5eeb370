//! HTTP client for the rendering proxy.

use crate::error::FetchError;
use crate::params::QueryParams;
use crate::retry::RetryPolicy;
use crate::PageFetcher;

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Default deadline for a single proxy request.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time the proxy may spend rendering a page.
const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct ScrapingClientConfig {
    /// Proxy endpoint, e.g. `https://proxy.example.com/v1/render`.
    pub base_url: String,
    pub api_key: String,
    /// Rendering budget forwarded to the proxy as the `timeout` parameter.
    pub render_timeout: Duration,
    /// Deadline for each HTTP request to the proxy.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl ScrapingClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::scraping(),
        }
    }
}

/// Client for the rendering proxy.
///
/// Sends `GET {base_url}?<render params>&api_key=..&url=<target>` and returns
/// the rendered body, retrying transport errors and non-success statuses.
pub struct ScrapingClient {
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
    base_url: Url,
    api_key: String,
    render_timeout: Duration,
    retry: RetryPolicy,
}

impl ScrapingClient {
    pub fn new(config: ScrapingClientConfig) -> Result<Self, FetchError> {
        if config.api_key.trim().is_empty() {
            return Err(FetchError::MissingApiKey);
        }
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url,
            api_key: config.api_key,
            render_timeout: config.render_timeout,
            retry: config.retry,
        })
    }

    /// Fetch `target_url`, replacing any default parameter named in `overrides`.
    pub async fn fetch_with(
        &self,
        target_url: &str,
        overrides: &[(&str, &str)],
    ) -> Result<String, FetchError> {
        let request_url = self.request_url(target_url, overrides);
        let attempts = self.retry.attempts();
        let mut last_failure = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.retry.delay(attempt - 1)).await;
            }

            match self.http_client.get(request_url.clone()).send().await {
                Ok(response) if response.status().is_success() => {
                    return response
                        .text()
                        .await
                        .map_err(|e| FetchError::FetchReadFailed(e.to_string()));
                }
                Ok(response) => {
                    last_failure = format!("HTTP status {}", response.status());
                }
                Err(e) => {
                    // reqwest includes the request URL in its message, and
                    // with it the API key.
                    let e = e.without_url();
                    last_failure = if e.is_timeout() {
                        format!("request timed out: {e}")
                    } else if e.is_connect() {
                        format!("connection failed: {e}")
                    } else {
                        e.to_string()
                    };
                }
            }

            tracing::warn!(
                target_url,
                attempt = attempt + 1,
                attempts,
                reason = %last_failure,
                "scrape attempt failed"
            );
        }

        Err(FetchError::FetchFailed {
            attempts,
            reason: last_failure,
        })
    }

    fn request_url(&self, target_url: &str, overrides: &[(&str, &str)]) -> Url {
        let mut params = QueryParams::defaults(self.render_timeout);
        for (key, value) in overrides {
            params.set(*key, *value);
        }

        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params.iter() {
                query.append_pair(key, value);
            }
            query.append_pair("api_key", &self.api_key);
            query.append_pair("url", target_url);
        }
        url
    }
}

#[async_trait]
impl PageFetcher for ScrapingClient {
    async fn fetch(&self, target_url: &str) -> Result<String, FetchError> {
        self.fetch_with(target_url, &[]).await
    }
}
