//! Nullable user repository: in-memory user records.

use async_trait::async_trait;
use socialkyc_store::{StoreError, UserRepository, UserUpdate};
use socialkyc_types::{User, UserId};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct NullUserRepository {
    users: Mutex<HashMap<UserId, User>>,
    modifications: AtomicUsize,
}

impl NullUserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            modifications: AtomicUsize::new(0),
        }
    }

    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }

    /// Current record for `id`, for assertions.
    pub fn get(&self, id: &UserId) -> Option<User> {
        self.users.lock().unwrap().get(id).cloned()
    }

    /// Number of successful `modify_user` calls.
    pub fn modification_count(&self) -> usize {
        self.modifications.load(Ordering::SeqCst)
    }
}

impl Default for NullUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for NullUserRepository {
    async fn get_user_by_id(&self, id: &UserId) -> Result<User, StoreError> {
        self.users
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    async fn modify_user(&self, update: &UserUpdate) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&update.id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", update.id)))?;
        if let Some(step) = update.kyc_step_passed {
            user.kyc_step_passed = step;
        }
        if let Some(stamps) = &update.kyc_steps_last_updated_at {
            user.kyc_steps_last_updated_at = stamps.clone();
        }
        self.modifications.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
