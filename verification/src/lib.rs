//! Social account verification for the KYC pipeline.
//!
//! A user proves ownership of a social account by publishing a post that
//! contains a phrase we issue. The [`SocialKyc`] orchestrator gates the
//! attempt, hands the proof to the [`Verifier`] registered for the network,
//! and records the outcome:
//! - **Success**: the social link and step completion are stored and the
//!   user's passed-step marker advances.
//! - **Failure**: the classified [`FailureReason`] is appended to the attempt
//!   log. Running out of attempts puts the step on cooldown.

pub mod content;
pub mod error;
pub mod facebook;
pub mod orchestrator;
pub mod post_url;
pub mod reason;
pub mod registry;
pub mod templates;
pub mod twitter;
pub mod verifier;

pub use error::{SocialKycError, TemplateError, VerifyError};
pub use facebook::FacebookVerifier;
pub use orchestrator::{
    OrchestratorConfig, SocialKyc, Verification, VerificationMetadata, VerificationResult,
};
pub use reason::{category, FailureReason, EXHAUSTED_RETRIES};
pub use registry::VerifierRegistry;
pub use templates::{TemplateKind, TemplateStore};
pub use twitter::TwitterVerifier;
pub use verifier::{Proof, Verifier};
