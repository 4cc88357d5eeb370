//! The per-network verification seam.

use crate::VerifyError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use socialkyc_types::SocialNetwork;

/// What the user submits to prove account ownership.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proof {
    /// Link to the post carrying the expected text.
    PostUrl(String),
    /// Platform access token for networks verified through their API.
    AccessToken(String),
}

impl Proof {
    pub fn as_str(&self) -> &str {
        match self {
            Proof::PostUrl(s) | Proof::AccessToken(s) => s,
        }
    }

    /// A proof with nothing but whitespace counts as not submitted.
    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

#[async_trait]
pub trait Verifier: Send + Sync {
    fn network(&self) -> SocialNetwork;

    /// Check that `proof` shows `expected_text`. Returns the account handle
    /// when the network exposes one.
    async fn verify_post(
        &self,
        proof: &Proof,
        expected_text: &str,
    ) -> Result<Option<String>, VerifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_proofs_are_blank() {
        assert!(Proof::PostUrl(String::new()).is_blank());
        assert!(Proof::AccessToken(" \t\n".into()).is_blank());
        assert!(!Proof::PostUrl("https://x.com/a/status/1".into()).is_blank());
    }
}
