//! Social links, step completions and the unsuccessful-attempt log.

use crate::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use socialkyc_types::{KycStep, SocialNetwork, Timestamp, UserId};

/// Proof that `user_id` owns `user_handle` on `social`.
///
/// Unique per (user, network) and per (network, handle).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub user_id: UserId,
    pub social: SocialNetwork,
    pub user_handle: String,
}

/// A passed social KYC step. One per (user, step).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCompletion {
    pub created_at: Timestamp,
    pub kyc_step: KycStep,
    pub social: SocialNetwork,
    pub user_id: UserId,
    pub user_handle: String,
}

/// One failed verification attempt. Rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsuccessfulAttempt {
    pub created_at: Timestamp,
    pub kyc_step: KycStep,
    pub social: SocialNetwork,
    pub user_id: UserId,
    pub reason: String,
}

#[async_trait]
pub trait SocialStore: Send + Sync {
    /// Insert a link. Violations surface as [`StoreError::Duplicate`].
    ///
    /// Inserting a link identical to one already stored succeeds without
    /// change, so a user can prove the same account for later steps.
    async fn insert_social_link(&self, link: &SocialLink) -> Result<(), StoreError>;

    /// Record a completed step, replacing any earlier record for the same
    /// (user, step).
    async fn insert_step_completion(&self, completion: &StepCompletion) -> Result<(), StoreError>;

    async fn append_unsuccessful_attempt(
        &self,
        attempt: &UnsuccessfulAttempt,
    ) -> Result<(), StoreError>;

    /// Attempts for (user, step) created at or after `since`.
    async fn count_unsuccessful_attempts(
        &self,
        user_id: &UserId,
        kyc_step: KycStep,
        since: Timestamp,
    ) -> Result<u64, StoreError>;
}
