//! Nullable store: thread-safe in-memory storage for testing.
//!
//! Alert rows are guarded by per-row async mutexes, so two tasks locking the
//! same (step, network) serialize exactly like `SELECT ... FOR UPDATE` does.

use async_trait::async_trait;
use socialkyc_store::{
    AlertState, AlertStore, AlertTransaction, ReasonCount, SocialLink, SocialStore,
    StepCompletion, StoreError, UniqueConstraint, UnsuccessfulAttempt,
};
use socialkyc_types::{KycStep, SocialNetwork, Timestamp, UserId};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

type AlertKey = (KycStep, SocialNetwork);

#[derive(Default)]
struct Tables {
    socials: Mutex<Vec<SocialLink>>,
    completions: Mutex<Vec<StepCompletion>>,
    attempts: Mutex<Vec<UnsuccessfulAttempt>>,
    alerts: Mutex<HashMap<AlertKey, Arc<RowLock<AlertState>>>>,
    alert_commits: AtomicUsize,
    fail_social_inserts: AtomicBool,
}

/// In-memory implementation of [`SocialStore`] and [`AlertStore`].
#[derive(Clone, Default)]
pub struct NullStore {
    tables: Arc<Tables>,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent social link inserts fail with a backend error.
    pub fn fail_social_inserts(&self, fail: bool) {
        self.tables.fail_social_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn social_links(&self) -> Vec<SocialLink> {
        self.tables.socials.lock().unwrap().clone()
    }

    pub fn completions(&self) -> Vec<StepCompletion> {
        self.tables.completions.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> Vec<UnsuccessfulAttempt> {
        self.tables.attempts.lock().unwrap().clone()
    }

    /// Current committed alert row, waiting for any holder to release it.
    pub async fn alert_state(&self, kyc_step: KycStep, social: SocialNetwork) -> Option<AlertState> {
        let row = self.row(kyc_step, social)?;
        let state = row.lock().await.clone();
        Some(state)
    }

    /// Overwrite the frequency of an existing alert row, as an operator would.
    pub async fn set_alert_frequency(&self, kyc_step: KycStep, social: SocialNetwork, secs: u64) {
        if let Some(row) = self.row(kyc_step, social) {
            row.lock().await.frequency_secs = secs;
        }
    }

    /// Number of committed alert transactions.
    pub fn alert_commits(&self) -> usize {
        self.tables.alert_commits.load(Ordering::SeqCst)
    }

    fn row(&self, kyc_step: KycStep, social: SocialNetwork) -> Option<Arc<RowLock<AlertState>>> {
        self.tables
            .alerts
            .lock()
            .unwrap()
            .get(&(kyc_step, social))
            .cloned()
    }
}

#[async_trait]
impl SocialStore for NullStore {
    async fn insert_social_link(&self, link: &SocialLink) -> Result<(), StoreError> {
        if self.tables.fail_social_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".into()));
        }
        let mut socials = self.tables.socials.lock().unwrap();
        if socials.iter().any(|s| s == link) {
            return Ok(());
        }
        if socials
            .iter()
            .any(|s| s.user_id == link.user_id && s.social == link.social)
        {
            return Err(StoreError::Duplicate(UniqueConstraint::SocialLink));
        }
        if socials
            .iter()
            .any(|s| s.social == link.social && s.user_handle == link.user_handle)
        {
            return Err(StoreError::Duplicate(UniqueConstraint::UserHandle));
        }
        socials.push(link.clone());
        Ok(())
    }

    async fn insert_step_completion(&self, completion: &StepCompletion) -> Result<(), StoreError> {
        let mut completions = self.tables.completions.lock().unwrap();
        completions
            .retain(|c| !(c.user_id == completion.user_id && c.kyc_step == completion.kyc_step));
        completions.push(completion.clone());
        Ok(())
    }

    async fn append_unsuccessful_attempt(
        &self,
        attempt: &UnsuccessfulAttempt,
    ) -> Result<(), StoreError> {
        self.tables.attempts.lock().unwrap().push(attempt.clone());
        Ok(())
    }

    async fn count_unsuccessful_attempts(
        &self,
        user_id: &UserId,
        kyc_step: KycStep,
        since: Timestamp,
    ) -> Result<u64, StoreError> {
        Ok(self
            .tables
            .attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.user_id == *user_id && a.kyc_step == kyc_step && a.created_at >= since)
            .count() as u64)
    }
}

#[async_trait]
impl AlertStore for NullStore {
    async fn ensure_alert_state(
        &self,
        kyc_step: KycStep,
        social: SocialNetwork,
        default_frequency_secs: u64,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        self.tables
            .alerts
            .lock()
            .unwrap()
            .entry((kyc_step, social))
            .or_insert_with(|| {
                Arc::new(RowLock::new(AlertState {
                    kyc_step,
                    social,
                    last_alert_at: now,
                    frequency_secs: default_frequency_secs,
                }))
            });
        Ok(())
    }

    async fn read_alert_state(
        &self,
        kyc_step: KycStep,
        social: SocialNetwork,
    ) -> Result<AlertState, StoreError> {
        self.alert_state(kyc_step, social).await.ok_or_else(|| {
            StoreError::NotFound(format!("alert state for step {kyc_step} on {social}"))
        })
    }

    async fn lock_alert_state(
        &self,
        kyc_step: KycStep,
        social: SocialNetwork,
    ) -> Result<Box<dyn AlertTransaction>, StoreError> {
        let row = self.row(kyc_step, social).ok_or_else(|| {
            StoreError::NotFound(format!("alert state for step {kyc_step} on {social}"))
        })?;
        let guard = row.lock_owned().await;
        let pending = guard.clone();
        Ok(Box::new(NullAlertTransaction {
            guard,
            pending,
            tables: Arc::clone(&self.tables),
        }))
    }
}

struct NullAlertTransaction {
    guard: OwnedMutexGuard<AlertState>,
    pending: AlertState,
    tables: Arc<Tables>,
}

#[async_trait]
impl AlertTransaction for NullAlertTransaction {
    fn state(&self) -> &AlertState {
        &self.guard
    }

    async fn unsuccessful_reasons_since(
        &mut self,
        since: Timestamp,
    ) -> Result<Vec<ReasonCount>, StoreError> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for attempt in self.tables.attempts.lock().unwrap().iter() {
            if attempt.kyc_step == self.guard.kyc_step
                && attempt.social == self.guard.social
                && attempt.created_at >= since
            {
                *counts.entry(attempt.reason.clone()).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(reason, count)| ReasonCount { reason, count })
            .collect())
    }

    async fn successes_since(&mut self, since: Timestamp) -> Result<u64, StoreError> {
        Ok(self
            .tables
            .completions
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                c.kyc_step == self.guard.kyc_step
                    && c.social == self.guard.social
                    && c.created_at >= since
            })
            .count() as u64)
    }

    async fn set_last_alert_at(&mut self, at: Timestamp) -> Result<(), StoreError> {
        self.pending.last_alert_at = at;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut this = *self;
        *this.guard = this.pending;
        this.tables.alert_commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(user: &str, handle: &str) -> SocialLink {
        SocialLink {
            user_id: UserId::new(user),
            social: SocialNetwork::Twitter,
            user_handle: handle.into(),
        }
    }

    #[tokio::test]
    async fn social_link_constraints_are_distinguished() {
        let store = NullStore::new();
        store.insert_social_link(&link("u1", "alice")).await.unwrap();

        let err = store.insert_social_link(&link("u2", "alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueConstraint::UserHandle)));

        let err = store.insert_social_link(&link("u1", "bob")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueConstraint::SocialLink)));
    }

    #[tokio::test]
    async fn relinking_the_same_handle_is_a_no_op() {
        let store = NullStore::new();
        store.insert_social_link(&link("u1", "alice")).await.unwrap();
        store.insert_social_link(&link("u1", "alice")).await.unwrap();
        assert_eq!(store.social_links(), vec![link("u1", "alice")]);
    }

    #[tokio::test]
    async fn uncommitted_alert_changes_are_discarded() {
        let store = NullStore::new();
        let (step, social) = (KycStep::SOCIAL_1, SocialNetwork::Twitter);
        store.ensure_alert_state(step, social, 60, Timestamp::new(10)).await.unwrap();

        let mut txn = store.lock_alert_state(step, social).await.unwrap();
        txn.set_last_alert_at(Timestamp::new(99)).await.unwrap();
        drop(txn);
        assert_eq!(store.alert_state(step, social).await.unwrap().last_alert_at, Timestamp::new(10));

        let mut txn = store.lock_alert_state(step, social).await.unwrap();
        txn.set_last_alert_at(Timestamp::new(99)).await.unwrap();
        txn.commit().await.unwrap();
        assert_eq!(store.alert_state(step, social).await.unwrap().last_alert_at, Timestamp::new(99));
        assert_eq!(store.alert_commits(), 1);
    }

    #[tokio::test]
    async fn ensure_keeps_existing_rows() {
        let store = NullStore::new();
        let (step, social) = (KycStep::SOCIAL_2, SocialNetwork::Twitter);
        store.ensure_alert_state(step, social, 60, Timestamp::new(1)).await.unwrap();
        store.set_alert_frequency(step, social, 600).await;
        store.ensure_alert_state(step, social, 60, Timestamp::new(2)).await.unwrap();
        let state = store.alert_state(step, social).await.unwrap();
        assert_eq!(state.frequency_secs, 600);
        assert_eq!(state.last_alert_at, Timestamp::new(1));
        assert_eq!(store.read_alert_state(step, social).await.unwrap(), state);
        assert!(matches!(
            store.read_alert_state(KycStep::SOCIAL_1, social).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
