//! Translation from sqlx errors and column types.

use crate::schema::{SOCIALS_PKEY, SOCIALS_USER_HANDLE_KEY};
use chrono::{DateTime, Utc};
use socialkyc_store::{StoreError, UniqueConstraint};
use socialkyc_types::{KycStep, SocialNetwork, Timestamp};

pub(crate) fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Which of our unique constraints `name` refers to.
///
/// Returns `None` for anything we did not declare, so an unexpected
/// constraint surfaces as a backend error instead of being guessed at.
pub fn unique_constraint(name: Option<&str>) -> Option<UniqueConstraint> {
    match name {
        Some(SOCIALS_PKEY) => Some(UniqueConstraint::SocialLink),
        Some(SOCIALS_USER_HANDLE_KEY) => Some(UniqueConstraint::UserHandle),
        _ => None,
    }
}

pub(crate) fn insert_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            if let Some(constraint) = unique_constraint(db_err.constraint()) {
                return StoreError::Duplicate(constraint);
            }
            tracing::error!(
                constraint = ?db_err.constraint(),
                "unique violation on an unmapped constraint"
            );
        }
    }
    backend(e)
}

pub(crate) fn to_datetime(ts: Timestamp) -> Result<DateTime<Utc>, StoreError> {
    i64::try_from(ts.as_secs())
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| StoreError::Serialization(format!("timestamp out of range: {ts}")))
}

pub(crate) fn from_datetime(dt: DateTime<Utc>) -> Timestamp {
    Timestamp::new(u64::try_from(dt.timestamp()).unwrap_or(0))
}

pub(crate) fn step_column(step: KycStep) -> i16 {
    i16::from(step.as_u8())
}

pub(crate) fn parse_social(raw: &str) -> Result<SocialNetwork, StoreError> {
    raw.parse::<SocialNetwork>()
        .map_err(|e| StoreError::Serialization(e.to_string()))
}
