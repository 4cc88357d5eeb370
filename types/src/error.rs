//! Parsing errors for the shared types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("unknown social network: {0}")]
    UnknownNetwork(String),

    #[error("invalid KYC step: {0}")]
    InvalidKycStep(String),
}
