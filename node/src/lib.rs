//! Social KYC service node.
//!
//! The node builds the verification engine from configuration and runs the
//! background work next to it:
//! - the remote config synchronizer, refreshing a shared JSON snapshot
//! - one alerting loop per social KYC step
//!
//! Logging, configuration and graceful shutdown live here as well.

pub mod alerting;
pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod remote_config;
pub mod shutdown;

pub use alerting::{categorize, AlertError, AlertFrequencies, AlertLoop, AlertReport, AlertSink, WebhookSink};
pub use config::ServiceConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use node::{Backends, SocialKycNode};
pub use remote_config::{
    ConfigSnapshot, ConfigSource, HttpConfigSource, RemoteConfigError, RemoteConfigSynchronizer,
    SnapshotHolder,
};
pub use shutdown::ShutdownController;
