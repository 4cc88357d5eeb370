//! Verifier lookup by network.

use crate::Verifier;
use socialkyc_types::SocialNetwork;
use std::collections::HashMap;
use std::sync::Arc;

/// The verifiers available to this process, built once at startup.
#[derive(Clone, Default)]
pub struct VerifierRegistry {
    verifiers: HashMap<SocialNetwork, Arc<dyn Verifier>>,
}

impl VerifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `verifier` under its own network, replacing any earlier one.
    pub fn register(&mut self, verifier: Arc<dyn Verifier>) {
        self.verifiers.insert(verifier.network(), verifier);
    }

    pub fn with(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.register(verifier);
        self
    }

    pub fn get(&self, network: SocialNetwork) -> Option<Arc<dyn Verifier>> {
        self.verifiers.get(&network).cloned()
    }

    /// Registered networks in their canonical order.
    pub fn networks(&self) -> Vec<SocialNetwork> {
        SocialNetwork::ALL
            .into_iter()
            .filter(|network| self.verifiers.contains_key(network))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FacebookVerifier, TwitterVerifier};
    use socialkyc_nullables::NullFetcher;

    #[test]
    fn lookup_by_network() {
        let registry = VerifierRegistry::new()
            .with(Arc::new(TwitterVerifier::new(Arc::new(NullFetcher::new()))));
        assert!(registry.get(SocialNetwork::Twitter).is_some());
        assert!(registry.get(SocialNetwork::Facebook).is_none());
        assert_eq!(registry.networks(), vec![SocialNetwork::Twitter]);
    }

    #[test]
    fn networks_keep_canonical_order() {
        let registry = VerifierRegistry::new()
            .with(Arc::new(FacebookVerifier::new("app", "secret").unwrap()))
            .with(Arc::new(TwitterVerifier::new(Arc::new(NullFetcher::new()))));
        assert_eq!(
            registry.networks(),
            vec![SocialNetwork::Twitter, SocialNetwork::Facebook]
        );
    }
}
