use socialkyc_fetch::FetchError;
use socialkyc_store::StoreError;
use socialkyc_types::{KycStep, SocialNetwork};
use std::path::PathBuf;
use thiserror::Error;

/// Why a verifier rejected a proof.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid post url: {0}")]
    InvalidUrl(String),

    #[error("no username in post url {0}")]
    UsernameNotFound(String),

    #[error("expected text not found on the page")]
    TextNotFound,

    #[error("post link not found on the page")]
    PostNotFound,

    #[error("page content could not be parsed")]
    InvalidPageContent,

    #[error("scrape failed: {0}")]
    ScrapeFailed(#[from] FetchError),

    #[error("{0} verification is unavailable")]
    Unavailable(SocialNetwork),

    #[error("missing credential: {0}")]
    MissingCredentials(&'static str),
}

/// Errors returned to callers of the orchestrator.
///
/// Verification failures are not errors: they come back as a structured
/// [`crate::Verification`]. These are the gating refusals plus anything the
/// collaborators could not do.
#[derive(Debug, Error)]
pub enum SocialKycError {
    #[error("kyc step {step} is not available: {reason}")]
    NotAvailable { step: KycStep, reason: &'static str },

    #[error("kyc step {0} is already passed")]
    Duplicate(KycStep),

    #[error("no verifier registered for {0}")]
    UnsupportedNetwork(SocialNetwork),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile {path}: {reason}")]
    Compile { path: PathBuf, reason: String },

    #[error("no {language} template for step {step}, {network}, {kind}")]
    MissingDefault {
        step: KycStep,
        network: SocialNetwork,
        kind: &'static str,
        language: String,
    },

    #[error("no template loaded for step {step}, {network}, {kind}")]
    NotLoaded {
        step: KycStep,
        network: SocialNetwork,
        kind: &'static str,
    },
}
