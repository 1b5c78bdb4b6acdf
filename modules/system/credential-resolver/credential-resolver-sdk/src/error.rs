//! Error types for credential stores.

use guard_security::GateError;
use thiserror::Error;

/// Errors a [`crate::CredentialStore`] may report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store cannot be reached right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for GateError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => Self::Unavailable(msg),
            StoreError::Internal(msg) => Self::Internal(msg),
        }
    }
}
