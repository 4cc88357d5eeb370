//! Facebook verification.
//!
//! Facebook proofs are access tokens checked against the Graph API, which is
//! not integrated. The verifier validates its credentials at construction and
//! refuses every proof.

use crate::{Proof, Verifier, VerifyError};
use async_trait::async_trait;
use socialkyc_types::SocialNetwork;

pub struct FacebookVerifier {
    app_id: String,
}

impl FacebookVerifier {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Result<Self, VerifyError> {
        let app_id = app_id.into();
        if app_id.trim().is_empty() {
            return Err(VerifyError::MissingCredentials("facebook app id"));
        }
        let app_secret: String = app_secret.into();
        if app_secret.trim().is_empty() {
            return Err(VerifyError::MissingCredentials("facebook app secret"));
        }
        Ok(Self { app_id })
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

#[async_trait]
impl Verifier for FacebookVerifier {
    fn network(&self) -> SocialNetwork {
        SocialNetwork::Facebook
    }

    async fn verify_post(
        &self,
        _proof: &Proof,
        _expected_text: &str,
    ) -> Result<Option<String>, VerifyError> {
        Err(VerifyError::Unavailable(SocialNetwork::Facebook))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_required() {
        assert!(matches!(
            FacebookVerifier::new("", "secret"),
            Err(VerifyError::MissingCredentials(_))
        ));
        assert!(matches!(
            FacebookVerifier::new("app", " "),
            Err(VerifyError::MissingCredentials(_))
        ));
    }

    #[tokio::test]
    async fn every_proof_is_refused() {
        let verifier = FacebookVerifier::new("app", "secret").unwrap();
        assert_eq!(verifier.app_id(), "app");
        let err = verifier
            .verify_post(&Proof::AccessToken("token".into()), "text")
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::Unavailable(SocialNetwork::Facebook)));
    }
}
