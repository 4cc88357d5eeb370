use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Every attempt failed with a transport error or a non-success status.
    #[error("fetch failed after {attempts} attempts: {reason}")]
    FetchFailed { attempts: u32, reason: String },

    /// The proxy answered successfully but the body could not be read.
    #[error("failed to read response body: {0}")]
    FetchReadFailed(String),

    #[error("invalid proxy url: {0}")]
    InvalidUrl(String),

    #[error("scraping API key is not configured")]
    MissingApiKey,

    #[error("HTTP client error: {0}")]
    Client(String),
}
