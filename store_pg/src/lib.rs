//! PostgreSQL storage backend for social KYC verification.
//!
//! Implements [`SocialStore`](socialkyc_store::SocialStore),
//! [`AlertStore`](socialkyc_store::AlertStore) and
//! [`UserRepository`](socialkyc_store::UserRepository) on a shared `PgPool`. All SQL
//! is runtime-checked (`sqlx::query`, not `sqlx::query!`) so building does not
//! need a live database.

pub mod alert;
pub mod error;
pub mod pool;
pub mod schema;
pub mod social;
pub mod user;

pub use pool::PgStore;
