//! The user-record collaborator.

use crate::StoreError;
use async_trait::async_trait;
use socialkyc_types::{KycStep, Timestamp, User, UserId};

/// Partial update of a user. `None` fields are left untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserUpdate {
    pub id: UserId,
    pub kyc_step_passed: Option<KycStep>,
    pub kyc_steps_last_updated_at: Option<Vec<Option<Timestamp>>>,
}

impl UserUpdate {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            kyc_step_passed: None,
            kyc_steps_last_updated_at: None,
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user_by_id(&self, id: &UserId) -> Result<User, StoreError>;

    async fn modify_user(&self, update: &UserUpdate) -> Result<(), StoreError>;
}
