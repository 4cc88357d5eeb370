//! Abstract storage traits for social KYC verification.
//!
//! Every storage backend (PostgreSQL, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod alert;
pub mod error;
pub mod social;
pub mod user;

pub use alert::{AlertState, AlertStore, AlertTransaction, ReasonCount};
pub use error::{StoreError, UniqueConstraint};
pub use social::{SocialLink, SocialStore, StepCompletion, UnsuccessfulAttempt};
pub use user::{UserRepository, UserUpdate};
