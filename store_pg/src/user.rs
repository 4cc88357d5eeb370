//! `UserRepository` on the `users` table.
//!
//! The table mirrors the records of the users service; only the KYC columns
//! are ever written from here.

use crate::error::{backend, from_datetime, step_column, to_datetime};
use crate::PgStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use socialkyc_store::{StoreError, UserRepository, UserUpdate};
use socialkyc_types::{KycStep, Timestamp, User, UserId};

type UserRow = (String, String, i16, Vec<Option<DateTime<Utc>>>);

#[async_trait]
impl UserRepository for PgStore {
    async fn get_user_by_id(&self, id: &UserId) -> Result<User, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, kyc_step_passed, kyc_steps_last_updated_at
            FROM users WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        let (id, username, passed, stamps) =
            row.ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        let passed = u8::try_from(passed)
            .map_err(|_| StoreError::Serialization(format!("kyc step out of range: {passed}")))?;
        Ok(User {
            id: UserId::new(id),
            username,
            kyc_step_passed: KycStep::new(passed),
            kyc_steps_last_updated_at: stamps
                .into_iter()
                .map(|stamp| stamp.map(from_datetime))
                .collect(),
        })
    }

    async fn modify_user(&self, update: &UserUpdate) -> Result<(), StoreError> {
        let stamps = update
            .kyc_steps_last_updated_at
            .as_ref()
            .map(|stamps| to_datetimes(stamps))
            .transpose()?;
        let result = sqlx::query(
            r#"
            UPDATE users
            SET kyc_step_passed = COALESCE($2, kyc_step_passed),
                kyc_steps_last_updated_at = COALESCE($3, kyc_steps_last_updated_at)
            WHERE id = $1
            "#,
        )
        .bind(update.id.as_str())
        .bind(update.kyc_step_passed.map(step_column))
        .bind(stamps)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {}", update.id)));
        }
        Ok(())
    }
}

fn to_datetimes(stamps: &[Option<Timestamp>]) -> Result<Vec<Option<DateTime<Utc>>>, StoreError> {
    stamps
        .iter()
        .map(|stamp| stamp.map(to_datetime).transpose())
        .collect()
}
