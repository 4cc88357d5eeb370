//! Shared helpers for social KYC verification.

pub mod time;

pub use time::{backoff_delay, format_duration};
