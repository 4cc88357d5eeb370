//! Verification orchestrator: gates a social KYC step, runs the network's
//! verifier, and persists the outcome.

use crate::reason::FailureReason;
use crate::registry::VerifierRegistry;
use crate::templates::{TemplateKind, TemplateStore};
use crate::{Proof, SocialKycError};
use serde::{Deserialize, Serialize};
use socialkyc_store::{
    SocialLink, SocialStore, StepCompletion, StoreError, UnsuccessfulAttempt, UserRepository,
    UserUpdate,
};
use socialkyc_types::{Clock, KycStep, SocialNetwork, Timestamp, User, UserId};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Failed attempts allowed per (user, step) within the retry window.
    pub max_attempts: u64,
    /// Lookback for the attempt budget, and the cooldown after a step was
    /// last updated.
    pub retry_window_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_window_secs: 24 * 60 * 60,
        }
    }
}

/// One verification request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMetadata {
    pub user_id: UserId,
    pub kyc_step: KycStep,
    pub social: SocialNetwork,
    /// `None`, or a blank proof, asks only for the text the user should post.
    pub proof: Option<Proof>,
    pub language: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum VerificationResult {
    Success,
    Failure { reason: FailureReason },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// `None` when no proof was submitted.
    pub result: Option<VerificationResult>,
    pub remaining_attempts: u64,
    /// Set only when no proof was submitted.
    pub expected_post_text: Option<String>,
}

pub struct SocialKyc {
    config: OrchestratorConfig,
    users: Arc<dyn UserRepository>,
    store: Arc<dyn SocialStore>,
    verifiers: VerifierRegistry,
    templates: Arc<TemplateStore>,
    clock: Arc<dyn Clock>,
}

impl SocialKyc {
    pub fn new(
        config: OrchestratorConfig,
        users: Arc<dyn UserRepository>,
        store: Arc<dyn SocialStore>,
        verifiers: VerifierRegistry,
        templates: Arc<TemplateStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            users,
            store,
            verifiers,
            templates,
            clock,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn verifiers(&self) -> &VerifierRegistry {
        &self.verifiers
    }

    /// Mark `step` passed without a social proof. A no-op unless the
    /// preceding step is passed and this one is not.
    pub async fn skip_verification(
        &self,
        step: KycStep,
        user_id: &UserId,
    ) -> Result<(), SocialKycError> {
        let user = self.users.get_user_by_id(user_id).await?;
        if !user.can_attempt(step) {
            tracing::debug!(user_id = %user_id, step = %step, "skip ignored");
            return Ok(());
        }
        let now = self.clock.now();
        self.pass_step(&user, step, now).await?;
        tracing::info!(user_id = %user_id, step = %step, "kyc step skipped");
        Ok(())
    }

    pub async fn verify_post(
        &self,
        metadata: &VerificationMetadata,
    ) -> Result<Verification, SocialKycError> {
        let step = metadata.kyc_step;
        let user = self.users.get_user_by_id(&metadata.user_id).await?;
        let now = self.clock.now();
        self.check_available(&user, step, now)?;

        let remaining = self.remaining_attempts(&user.id, step, now).await?;
        if remaining == 0 {
            return Err(SocialKycError::NotAvailable {
                step,
                reason: "no attempts left",
            });
        }

        let verifier = self
            .verifiers
            .get(metadata.social)
            .ok_or(SocialKycError::UnsupportedNetwork(metadata.social))?;

        let expected_text = self.templates.render(
            step,
            metadata.social,
            TemplateKind::Post,
            &metadata.language,
            &user,
        )?;
        let Some(proof) = metadata.proof.as_ref().filter(|p| !p.is_blank()) else {
            return Ok(Verification {
                result: None,
                remaining_attempts: remaining,
                expected_post_text: Some(expected_text),
            });
        };

        let handle = match verifier.verify_post(proof, &expected_text).await {
            Ok(handle) => handle,
            Err(err) => {
                tracing::info!(
                    user_id = %user.id,
                    step = %step,
                    social = %metadata.social,
                    error = %err,
                    "verification failed"
                );
                let reason = FailureReason::from_verify_error(&err);
                return self
                    .record_failure(&user, step, metadata.social, reason, remaining, now)
                    .await;
            }
        };

        if let Some(handle) = &handle {
            let link = SocialLink {
                user_id: user.id.clone(),
                social: metadata.social,
                user_handle: handle.clone(),
            };
            match self.store.insert_social_link(&link).await {
                Ok(()) => {}
                Err(StoreError::Duplicate(constraint)) => {
                    tracing::info!(
                        user_id = %user.id,
                        social = %metadata.social,
                        handle = %handle,
                        constraint = %constraint,
                        "social link already claimed"
                    );
                    let reason = FailureReason::from_constraint(constraint);
                    return self
                        .record_failure(&user, step, metadata.social, reason, remaining, now)
                        .await;
                }
                Err(err) => return Err(err.into()),
            }
        }

        let completion = StepCompletion {
            created_at: now,
            kyc_step: step,
            social: metadata.social,
            user_id: user.id.clone(),
            user_handle: handle.unwrap_or_else(|| user.id.to_string()),
        };
        self.store.insert_step_completion(&completion).await?;
        self.pass_step(&user, step, now).await?;

        tracing::info!(
            user_id = %user.id,
            step = %step,
            social = %metadata.social,
            handle = %completion.user_handle,
            "kyc step passed"
        );
        Ok(Verification {
            result: Some(VerificationResult::Success),
            remaining_attempts: remaining,
            expected_post_text: None,
        })
    }

    fn check_available(
        &self,
        user: &User,
        step: KycStep,
        now: Timestamp,
    ) -> Result<(), SocialKycError> {
        let Some(previous) = step.previous() else {
            return Err(SocialKycError::NotAvailable {
                step,
                reason: "no preceding step",
            });
        };
        if user.kyc_step_passed < previous {
            return Err(SocialKycError::NotAvailable {
                step,
                reason: "preceding step not passed",
            });
        }
        if user.kyc_step_passed >= step {
            return Err(SocialKycError::Duplicate(step));
        }
        if let Some(updated_at) = user.step_last_updated_at(step) {
            if !updated_at.has_expired(self.config.retry_window_secs, now) {
                return Err(SocialKycError::NotAvailable {
                    step,
                    reason: "cooling down",
                });
            }
        }
        Ok(())
    }

    async fn remaining_attempts(
        &self,
        user_id: &UserId,
        step: KycStep,
        now: Timestamp,
    ) -> Result<u64, SocialKycError> {
        // An attempt stops counting at the same instant its cooldown would end.
        let since = now.saturating_sub_secs(self.config.retry_window_secs.saturating_sub(1));
        let used = self
            .store
            .count_unsuccessful_attempts(user_id, step, since)
            .await?;
        Ok(self.config.max_attempts.saturating_sub(used))
    }

    /// Log the failed attempt, then start the cooldown if it was the last one.
    async fn record_failure(
        &self,
        user: &User,
        step: KycStep,
        social: SocialNetwork,
        reason: FailureReason,
        remaining: u64,
        now: Timestamp,
    ) -> Result<Verification, SocialKycError> {
        let attempt = UnsuccessfulAttempt {
            created_at: now,
            kyc_step: step,
            social,
            user_id: user.id.clone(),
            reason: reason.as_str().to_string(),
        };
        self.store.append_unsuccessful_attempt(&attempt).await?;

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            let mut update = UserUpdate::new(user.id.clone());
            update.kyc_steps_last_updated_at = Some(user.steps_stamped(step, now));
            self.users.modify_user(&update).await?;
            tracing::warn!(user_id = %user.id, step = %step, "attempts exhausted");
        }

        Ok(Verification {
            result: Some(VerificationResult::Failure { reason }),
            remaining_attempts: remaining,
            expected_post_text: None,
        })
    }

    async fn pass_step(
        &self,
        user: &User,
        step: KycStep,
        now: Timestamp,
    ) -> Result<(), SocialKycError> {
        let mut update = UserUpdate::new(user.id.clone());
        update.kyc_step_passed = Some(step);
        update.kyc_steps_last_updated_at = Some(user.steps_stamped(step, now));
        self.users.modify_user(&update).await?;
        Ok(())
    }
}
