//! Stable failure reasons.
//!
//! The reason string is what lands in the attempt log and what the alerting
//! loop groups on, so the strings must not change between releases.

use crate::VerifyError;
use serde::{Deserialize, Serialize};
use socialkyc_fetch::FetchError;
use socialkyc_store::UniqueConstraint;
use std::fmt;

/// Alert category that triggers a webhook post.
pub const EXHAUSTED_RETRIES: &str = "exhausted retries";

const DUPLICATE_USER_HANDLE: &str = "duplicate userhandle";
const DUPLICATE_SOCIALS: &str = "duplicate socials";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    InvalidUrl,
    UsernameNotFound,
    TextNotFound,
    PostNotFound,
    InvalidPageContent,
    FetchExhausted,
    FetchBodyRead,
    ScrapeFailed,
    NetworkUnavailable,
    DuplicateUserHandle,
    DuplicateSocials,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid url",
            Self::UsernameNotFound => "username not found",
            Self::TextNotFound => "expected text not found",
            Self::PostNotFound => "post not found",
            Self::InvalidPageContent => "invalid page content",
            Self::FetchExhausted => "fetch failed: exhausted retries",
            Self::FetchBodyRead => "fetch failed: body read",
            Self::ScrapeFailed => "scrape failed",
            Self::NetworkUnavailable => "network unavailable",
            Self::DuplicateUserHandle => DUPLICATE_USER_HANDLE,
            Self::DuplicateSocials => DUPLICATE_SOCIALS,
        }
    }

    pub fn from_verify_error(err: &VerifyError) -> Self {
        match err {
            VerifyError::InvalidUrl(_) => Self::InvalidUrl,
            VerifyError::UsernameNotFound(_) => Self::UsernameNotFound,
            VerifyError::TextNotFound => Self::TextNotFound,
            VerifyError::PostNotFound => Self::PostNotFound,
            VerifyError::InvalidPageContent => Self::InvalidPageContent,
            VerifyError::ScrapeFailed(FetchError::FetchFailed { .. }) => Self::FetchExhausted,
            VerifyError::ScrapeFailed(FetchError::FetchReadFailed(_)) => Self::FetchBodyRead,
            VerifyError::ScrapeFailed(_) => Self::ScrapeFailed,
            VerifyError::Unavailable(_) | VerifyError::MissingCredentials(_) => {
                Self::NetworkUnavailable
            }
        }
    }

    pub fn from_constraint(constraint: UniqueConstraint) -> Self {
        match constraint {
            UniqueConstraint::UserHandle => Self::DuplicateUserHandle,
            UniqueConstraint::SocialLink => Self::DuplicateSocials,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert category of a recorded reason: the duplicate reasons as-is,
/// otherwise the text after the last `": "`.
pub fn category(reason: &str) -> &str {
    if reason == DUPLICATE_USER_HANDLE || reason == DUPLICATE_SOCIALS {
        return reason;
    }
    match reason.rfind(": ") {
        Some(i) => &reason[i + 2..],
        None => reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socialkyc_types::SocialNetwork;

    #[test]
    fn fetch_errors_split_by_kind() {
        let exhausted = VerifyError::ScrapeFailed(FetchError::FetchFailed {
            attempts: 3,
            reason: "503".into(),
        });
        let read = VerifyError::ScrapeFailed(FetchError::FetchReadFailed("eof".into()));
        let other = VerifyError::ScrapeFailed(FetchError::MissingApiKey);
        assert_eq!(FailureReason::from_verify_error(&exhausted), FailureReason::FetchExhausted);
        assert_eq!(FailureReason::from_verify_error(&read), FailureReason::FetchBodyRead);
        assert_eq!(FailureReason::from_verify_error(&other), FailureReason::ScrapeFailed);
    }

    #[test]
    fn unavailable_network() {
        let err = VerifyError::Unavailable(SocialNetwork::Facebook);
        assert_eq!(
            FailureReason::from_verify_error(&err).as_str(),
            "network unavailable"
        );
    }

    #[test]
    fn duplicates_map_by_constraint() {
        assert_eq!(
            FailureReason::from_constraint(UniqueConstraint::UserHandle).as_str(),
            "duplicate userhandle"
        );
        assert_eq!(
            FailureReason::from_constraint(UniqueConstraint::SocialLink).as_str(),
            "duplicate socials"
        );
    }

    #[test]
    fn categories() {
        assert_eq!(category("fetch failed: exhausted retries"), EXHAUSTED_RETRIES);
        assert_eq!(category("fetch failed: body read"), "body read");
        assert_eq!(category("a: b: c"), "c");
        assert_eq!(category("post not found"), "post not found");
        assert_eq!(category("duplicate userhandle"), "duplicate userhandle");
        assert_eq!(category("duplicate socials"), "duplicate socials");
    }
}
