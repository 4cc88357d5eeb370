//! Twitter (X) post verification by scraping the rendered post page.

use crate::content::validate_post_page;
use crate::post_url::{extract_username, has_root_domain_and_https};
use crate::{Proof, Verifier, VerifyError};
use async_trait::async_trait;
use socialkyc_fetch::PageFetcher;
use socialkyc_types::SocialNetwork;
use std::sync::Arc;

/// Domains a post URL may live on unless configured otherwise.
pub const DEFAULT_DOMAINS: [&str; 2] = ["twitter.com", "x.com"];

pub struct TwitterVerifier {
    fetcher: Arc<dyn PageFetcher>,
    domains: Vec<String>,
}

impl TwitterVerifier {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::with_domains(fetcher, DEFAULT_DOMAINS.iter().map(|d| d.to_string()).collect())
    }

    pub fn with_domains(fetcher: Arc<dyn PageFetcher>, domains: Vec<String>) -> Self {
        Self { fetcher, domains }
    }

    fn is_allowed(&self, post_url: &str) -> bool {
        self.domains
            .iter()
            .any(|domain| has_root_domain_and_https(post_url, domain))
    }
}

#[async_trait]
impl Verifier for TwitterVerifier {
    fn network(&self) -> SocialNetwork {
        SocialNetwork::Twitter
    }

    async fn verify_post(
        &self,
        proof: &Proof,
        expected_text: &str,
    ) -> Result<Option<String>, VerifyError> {
        let Proof::PostUrl(post_url) = proof else {
            return Err(VerifyError::InvalidUrl("twitter requires a post url".into()));
        };
        if !self.is_allowed(post_url) {
            return Err(VerifyError::InvalidUrl(post_url.clone()));
        }
        let handle = extract_username(post_url)?;

        let markup = self.fetcher.fetch(post_url).await?;
        validate_post_page(&markup, expected_text, post_url)?;

        tracing::debug!(handle = %handle, "twitter post verified");
        Ok(Some(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socialkyc_fetch::FetchError;
    use socialkyc_nullables::NullFetcher;

    const POST: &str = "https://x.com/alice/status/1712692723336032437";

    fn page() -> String {
        format!(
            "<html><head><title>alice on X: \"Proving I am alice\" / X</title></head>\
             <body><a href=\"{POST}\">link</a></body></html>"
        )
    }

    fn verifier(fetcher: &Arc<NullFetcher>) -> TwitterVerifier {
        TwitterVerifier::new(fetcher.clone())
    }

    #[tokio::test]
    async fn returns_handle_for_valid_post() {
        let fetcher = Arc::new(NullFetcher::new());
        fetcher.respond(POST, page());
        let handle = verifier(&fetcher)
            .verify_post(&Proof::PostUrl(POST.into()), "Proving I am alice")
            .await
            .unwrap();
        assert_eq!(handle.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn foreign_domain_is_rejected_before_fetching() {
        let fetcher = Arc::new(NullFetcher::new());
        let err = verifier(&fetcher)
            .verify_post(
                &Proof::PostUrl("https://mastodon.social/alice/status/1".into()),
                "Proving I am alice",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::InvalidUrl(_)));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn access_token_is_not_a_twitter_proof() {
        let fetcher = Arc::new(NullFetcher::new());
        let err = verifier(&fetcher)
            .verify_post(&Proof::AccessToken("tok".into()), "text")
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_as_scrape_failed() {
        let fetcher = Arc::new(NullFetcher::new());
        fetcher.fail(POST);
        let err = verifier(&fetcher)
            .verify_post(&Proof::PostUrl(POST.into()), "Proving I am alice")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerifyError::ScrapeFailed(FetchError::FetchFailed { .. })
        ));
    }

    #[tokio::test]
    async fn custom_domain_list() {
        let fetcher = Arc::new(NullFetcher::new());
        let v = TwitterVerifier::with_domains(fetcher, vec!["twitter.com".into()]);
        let err = v
            .verify_post(&Proof::PostUrl(POST.into()), "Proving I am alice")
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::InvalidUrl(_)));
    }
}
