//! KYC step identifiers.
//!
//! Steps are ordered: a user at `kyc_step_passed = N` may only attempt step
//! `N + 1`. The numbering is shared with the wider KYC pipeline, so social
//! steps are interleaved with steps this crate never drives (face, quiz).

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KycStep(u8);

impl KycStep {
    pub const NONE: Self = Self(0);
    pub const FACIAL_RECOGNITION: Self = Self(1);
    pub const LIVENESS_DETECTION: Self = Self(2);
    pub const SOCIAL_1: Self = Self(3);
    pub const QUIZ: Self = Self(4);
    pub const SOCIAL_2: Self = Self(5);

    /// Every step verified by posting on a social network.
    pub const SOCIAL_STEPS: [Self; 2] = [Self::SOCIAL_1, Self::SOCIAL_2];

    pub const fn new(step: u8) -> Self {
        Self(step)
    }

    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// The step that must be passed before this one can be attempted.
    pub fn previous(&self) -> Option<KycStep> {
        self.0.checked_sub(1).map(Self)
    }

    /// Position of this step in a user's per-step timestamp list.
    ///
    /// [`KycStep::NONE`] has no slot.
    pub fn index(&self) -> Option<usize> {
        self.0.checked_sub(1).map(usize::from)
    }

    pub fn is_social(&self) -> bool {
        Self::SOCIAL_STEPS.contains(self)
    }
}

impl fmt::Display for KycStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for KycStep {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map(Self)
            .map_err(|_| TypesError::InvalidKycStep(s.to_string()))
    }
}
