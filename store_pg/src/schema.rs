//! Table definitions.
//!
//! Constraint names are spelled out because duplicate detection maps them back
//! to [`UniqueConstraint`](socialkyc_store::UniqueConstraint) by name.

pub const SOCIALS_PKEY: &str = "socials_pkey";
pub const SOCIALS_USER_HANDLE_KEY: &str = "socials_social_user_handle_key";

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id                        TEXT PRIMARY KEY,
    username                  TEXT NOT NULL,
    kyc_step_passed           SMALLINT NOT NULL DEFAULT 0,
    kyc_steps_last_updated_at TIMESTAMPTZ[] NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS socials (
    user_id     TEXT NOT NULL,
    social      TEXT NOT NULL,
    user_handle TEXT NOT NULL,
    CONSTRAINT socials_pkey PRIMARY KEY (user_id, social),
    CONSTRAINT socials_social_user_handle_key UNIQUE (social, user_handle)
);

CREATE TABLE IF NOT EXISTS social_kyc_steps (
    created_at  TIMESTAMPTZ NOT NULL,
    kyc_step    SMALLINT NOT NULL,
    user_id     TEXT NOT NULL,
    social      TEXT NOT NULL,
    user_handle TEXT NOT NULL,
    PRIMARY KEY (user_id, kyc_step)
);
CREATE INDEX IF NOT EXISTS social_kyc_steps_window_ix
    ON social_kyc_steps (kyc_step, social, created_at);

CREATE TABLE IF NOT EXISTS social_kyc_unsuccessful_attempts (
    created_at TIMESTAMPTZ NOT NULL,
    kyc_step   SMALLINT NOT NULL,
    reason     TEXT NOT NULL,
    user_id    TEXT NOT NULL,
    social     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS social_kyc_unsuccessful_attempts_user_ix
    ON social_kyc_unsuccessful_attempts (user_id, kyc_step, created_at);
CREATE INDEX IF NOT EXISTS social_kyc_unsuccessful_attempts_window_ix
    ON social_kyc_unsuccessful_attempts (kyc_step, social, created_at);

CREATE TABLE IF NOT EXISTS unsuccessful_social_kyc_alerts (
    last_alert_at        TIMESTAMPTZ NOT NULL,
    frequency_in_seconds BIGINT NOT NULL,
    kyc_step             SMALLINT NOT NULL,
    social               TEXT NOT NULL,
    PRIMARY KEY (kyc_step, social)
);
"#;
