use std::fmt;
use thiserror::Error;

/// The uniqueness rules a social link insert can violate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniqueConstraint {
    /// The user already has a link on this network.
    SocialLink,
    /// Another user already claimed this handle on this network.
    UserHandle,
}

impl fmt::Display for UniqueConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SocialLink => f.write_str("social link"),
            Self::UserHandle => f.write_str("user handle"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate {0}")]
    Duplicate(UniqueConstraint),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
