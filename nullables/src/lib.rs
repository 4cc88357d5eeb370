//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies (clock, storage, user records, page fetches) are
//! abstracted behind traits. This crate provides test-friendly implementations
//! that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch a database or the network
//!
//! Everything here is `Send + Sync` so it can be shared across tokio tasks.

pub mod clock;
pub mod fetcher;
pub mod store;
pub mod users;

pub use clock::NullClock;
pub use fetcher::NullFetcher;
pub use store::NullStore;
pub use users::NullUserRepository;
