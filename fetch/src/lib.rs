//! Scraping client for the headless-rendering proxy.
//!
//! Social networks do not serve post content to plain HTTP clients, so pages
//! are fetched through a third-party proxy that executes JavaScript and
//! returns the rendered markup. Verifiers depend only on [`PageFetcher`].

pub mod client;
pub mod error;
pub mod params;
pub mod retry;

pub use client::{ScrapingClient, ScrapingClientConfig};
pub use error::FetchError;
pub use retry::RetryPolicy;

use async_trait::async_trait;

/// Fetches the rendered markup of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `target_url` with the default rendering parameters.
    async fn fetch(&self, target_url: &str) -> Result<String, FetchError>;
}
