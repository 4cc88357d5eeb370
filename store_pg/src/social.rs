//! `SocialStore` on PostgreSQL.

use crate::error::{backend, insert_error, step_column, to_datetime};
use crate::PgStore;
use async_trait::async_trait;
use socialkyc_store::{SocialLink, SocialStore, StepCompletion, StoreError, UnsuccessfulAttempt};
use socialkyc_types::{KycStep, Timestamp, UserId};

impl PgStore {
    async fn social_link_exists(&self, link: &SocialLink) -> Result<bool, StoreError> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM socials
                WHERE user_id = $1 AND social = $2 AND user_handle = $3
            )
            "#,
        )
        .bind(link.user_id.as_str())
        .bind(link.social.as_str())
        .bind(&link.user_handle)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)
    }
}

#[async_trait]
impl SocialStore for PgStore {
    async fn insert_social_link(&self, link: &SocialLink) -> Result<(), StoreError> {
        let inserted =
            sqlx::query("INSERT INTO socials (user_id, social, user_handle) VALUES ($1, $2, $3)")
                .bind(link.user_id.as_str())
                .bind(link.social.as_str())
                .bind(&link.user_handle)
                .execute(&self.pool)
                .await
                .map_err(insert_error);
        match inserted {
            Ok(_) => Ok(()),
            // An identical row violates both constraints; either may be reported.
            Err(StoreError::Duplicate(constraint)) => {
                if self.social_link_exists(link).await? {
                    Ok(())
                } else {
                    Err(StoreError::Duplicate(constraint))
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn insert_step_completion(&self, completion: &StepCompletion) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO social_kyc_steps (created_at, kyc_step, user_id, social, user_handle)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, kyc_step) DO UPDATE
            SET created_at = EXCLUDED.created_at,
                social = EXCLUDED.social,
                user_handle = EXCLUDED.user_handle
            "#,
        )
        .bind(to_datetime(completion.created_at)?)
        .bind(step_column(completion.kyc_step))
        .bind(completion.user_id.as_str())
        .bind(completion.social.as_str())
        .bind(&completion.user_handle)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn append_unsuccessful_attempt(
        &self,
        attempt: &UnsuccessfulAttempt,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO social_kyc_unsuccessful_attempts (created_at, kyc_step, reason, user_id, social)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(to_datetime(attempt.created_at)?)
        .bind(step_column(attempt.kyc_step))
        .bind(&attempt.reason)
        .bind(attempt.user_id.as_str())
        .bind(attempt.social.as_str())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn count_unsuccessful_attempts(
        &self,
        user_id: &UserId,
        kyc_step: KycStep,
        since: Timestamp,
    ) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM social_kyc_unsuccessful_attempts
            WHERE user_id = $1 AND kyc_step = $2 AND created_at >= $3
            "#,
        )
        .bind(user_id.as_str())
        .bind(step_column(kyc_step))
        .bind(to_datetime(since)?)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
