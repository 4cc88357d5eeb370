//! Fundamental types for social KYC verification.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! KYC steps, social networks, user records, timestamps and the clock seam.

pub mod error;
pub mod kyc;
pub mod social;
pub mod time;
pub mod user;

pub use error::TypesError;
pub use kyc::KycStep;
pub use social::SocialNetwork;
pub use time::{Clock, SystemClock, Timestamp};
pub use user::{User, UserId};
