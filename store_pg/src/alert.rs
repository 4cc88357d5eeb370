//! `AlertStore` on PostgreSQL.
//!
//! The alert row is taken with `SELECT ... FOR UPDATE` inside a transaction;
//! the lock is released on commit, or on rollback when the transaction is
//! dropped.

use crate::error::{backend, from_datetime, parse_social, step_column, to_datetime};
use crate::PgStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use socialkyc_store::{AlertState, AlertStore, AlertTransaction, ReasonCount, StoreError};
use socialkyc_types::{KycStep, SocialNetwork, Timestamp};
use sqlx::{Postgres, Transaction};

#[async_trait]
impl AlertStore for PgStore {
    async fn ensure_alert_state(
        &self,
        kyc_step: KycStep,
        social: SocialNetwork,
        default_frequency_secs: u64,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO unsuccessful_social_kyc_alerts (last_alert_at, frequency_in_seconds, kyc_step, social)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (kyc_step, social) DO NOTHING
            "#,
        )
        .bind(to_datetime(now)?)
        .bind(i64::try_from(default_frequency_secs).unwrap_or(i64::MAX))
        .bind(step_column(kyc_step))
        .bind(social.as_str())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn read_alert_state(
        &self,
        kyc_step: KycStep,
        social: SocialNetwork,
    ) -> Result<AlertState, StoreError> {
        let row: Option<AlertRow> = sqlx::query_as(
            r#"
            SELECT last_alert_at, frequency_in_seconds, social
            FROM unsuccessful_social_kyc_alerts
            WHERE kyc_step = $1 AND social = $2
            "#,
        )
        .bind(step_column(kyc_step))
        .bind(social.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        alert_state(kyc_step, social, row)
    }

    async fn lock_alert_state(
        &self,
        kyc_step: KycStep,
        social: SocialNetwork,
    ) -> Result<Box<dyn AlertTransaction>, StoreError> {
        let mut txn = self.pool.begin().await.map_err(backend)?;
        let row: Option<AlertRow> = sqlx::query_as(
            r#"
            SELECT last_alert_at, frequency_in_seconds, social
            FROM unsuccessful_social_kyc_alerts
            WHERE kyc_step = $1 AND social = $2
            FOR UPDATE
            "#,
        )
        .bind(step_column(kyc_step))
        .bind(social.as_str())
        .fetch_optional(&mut *txn)
        .await
        .map_err(backend)?;

        let state = alert_state(kyc_step, social, row)?;
        Ok(Box::new(PgAlertTransaction { txn, state }))
    }
}

type AlertRow = (DateTime<Utc>, i64, String);

fn alert_state(
    kyc_step: KycStep,
    social: SocialNetwork,
    row: Option<AlertRow>,
) -> Result<AlertState, StoreError> {
    let (last_alert_at, frequency, social_column) = row.ok_or_else(|| {
        StoreError::NotFound(format!("alert state for step {kyc_step} on {social}"))
    })?;
    Ok(AlertState {
        kyc_step,
        social: parse_social(&social_column)?,
        last_alert_at: from_datetime(last_alert_at),
        frequency_secs: u64::try_from(frequency).unwrap_or(0),
    })
}

struct PgAlertTransaction {
    txn: Transaction<'static, Postgres>,
    state: AlertState,
}

#[async_trait]
impl AlertTransaction for PgAlertTransaction {
    fn state(&self) -> &AlertState {
        &self.state
    }

    async fn unsuccessful_reasons_since(
        &mut self,
        since: Timestamp,
    ) -> Result<Vec<ReasonCount>, StoreError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT reason, COUNT(*)
            FROM social_kyc_unsuccessful_attempts
            WHERE kyc_step = $1 AND social = $2 AND created_at >= $3
            GROUP BY reason
            ORDER BY reason
            "#,
        )
        .bind(step_column(self.state.kyc_step))
        .bind(self.state.social.as_str())
        .bind(to_datetime(since)?)
        .fetch_all(&mut *self.txn)
        .await
        .map_err(backend)?;

        Ok(rows
            .into_iter()
            .map(|(reason, count)| ReasonCount {
                reason,
                count: u64::try_from(count).unwrap_or(0),
            })
            .collect())
    }

    async fn successes_since(&mut self, since: Timestamp) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM social_kyc_steps
            WHERE kyc_step = $1 AND social = $2 AND created_at >= $3
            "#,
        )
        .bind(step_column(self.state.kyc_step))
        .bind(self.state.social.as_str())
        .bind(to_datetime(since)?)
        .fetch_one(&mut *self.txn)
        .await
        .map_err(backend)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn set_last_alert_at(&mut self, at: Timestamp) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE unsuccessful_social_kyc_alerts
            SET last_alert_at = $1
            WHERE kyc_step = $2 AND social = $3
            "#,
        )
        .bind(to_datetime(at)?)
        .bind(step_column(self.state.kyc_step))
        .bind(self.state.social.as_str())
        .execute(&mut *self.txn)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(backend)
    }
}
