//! User records as seen by the verification engine.
//!
//! The user store is owned by another service. This engine reads the whole
//! record but only ever writes back the passed-step marker and the per-step
//! timestamps.

use crate::{KycStep, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Highest KYC step the user has passed.
    pub kyc_step_passed: KycStep,
    /// When each step was last updated, indexed by [`KycStep::index`].
    #[serde(default)]
    pub kyc_steps_last_updated_at: Vec<Option<Timestamp>>,
}

impl User {
    pub fn step_last_updated_at(&self, step: KycStep) -> Option<Timestamp> {
        step.index()
            .and_then(|i| self.kyc_steps_last_updated_at.get(i).copied().flatten())
    }

    /// The per-step timestamp list with `step` stamped at `now`, growing the
    /// list if the user has never reached that far.
    pub fn steps_stamped(&self, step: KycStep, now: Timestamp) -> Vec<Option<Timestamp>> {
        let mut stamps = self.kyc_steps_last_updated_at.clone();
        if let Some(i) = step.index() {
            if stamps.len() <= i {
                stamps.resize(i + 1, None);
            }
            stamps[i] = Some(now);
        }
        stamps
    }

    /// Whether the preceding step is passed and this one is not.
    pub fn can_attempt(&self, step: KycStep) -> bool {
        step.previous()
            .is_some_and(|previous| self.kyc_step_passed == previous)
    }
}
