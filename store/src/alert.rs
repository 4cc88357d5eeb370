//! Alert coordination state.
//!
//! Several replicas run the same alert loops against shared storage. The
//! per-(step, network) row is only read and advanced inside an
//! [`AlertTransaction`], which holds an exclusive lock on it until commit or
//! drop. Dropping a transaction without committing discards its changes.

use crate::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use socialkyc_types::{KycStep, SocialNetwork, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    pub kyc_step: KycStep,
    pub social: SocialNetwork,
    pub last_alert_at: Timestamp,
    pub frequency_secs: u64,
}

/// Number of unsuccessful attempts recorded with `reason`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonCount {
    pub reason: String,
    pub count: u64,
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Create the row for (step, network) if it does not exist yet.
    async fn ensure_alert_state(
        &self,
        kyc_step: KycStep,
        social: SocialNetwork,
        default_frequency_secs: u64,
        now: Timestamp,
    ) -> Result<(), StoreError>;

    /// Read the committed row for (step, network) without locking it.
    async fn read_alert_state(
        &self,
        kyc_step: KycStep,
        social: SocialNetwork,
    ) -> Result<AlertState, StoreError>;

    /// Begin a transaction holding the row lock for (step, network).
    ///
    /// Waits while another holder has the lock.
    async fn lock_alert_state(
        &self,
        kyc_step: KycStep,
        social: SocialNetwork,
    ) -> Result<Box<dyn AlertTransaction>, StoreError>;
}

#[async_trait]
pub trait AlertTransaction: Send {
    /// The locked row as read when the lock was taken.
    fn state(&self) -> &AlertState;

    /// Unsuccessful attempts for the locked (step, network) since `since`,
    /// grouped by raw reason.
    async fn unsuccessful_reasons_since(
        &mut self,
        since: Timestamp,
    ) -> Result<Vec<ReasonCount>, StoreError>;

    /// Step completions for the locked (step, network) since `since`.
    async fn successes_since(&mut self, since: Timestamp) -> Result<u64, StoreError>;

    async fn set_last_alert_at(&mut self, at: Timestamp) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
