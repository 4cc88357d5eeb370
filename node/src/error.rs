use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("template error: {0}")]
    Template(#[from] socialkyc_verification::TemplateError),

    #[error("scraping client error: {0}")]
    Fetch(#[from] socialkyc_fetch::FetchError),

    #[error("verifier error: {0}")]
    Verifier(#[from] socialkyc_verification::VerifyError),

    #[error("remote config error: {0}")]
    RemoteConfig(#[from] crate::remote_config::RemoteConfigError),

    #[error("store error: {0}")]
    Store(#[from] socialkyc_store::StoreError),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("node already started")]
    AlreadyStarted,
}
