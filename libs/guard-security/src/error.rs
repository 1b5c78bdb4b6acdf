//! Failure taxonomy of the request gate.
//!
//! [`AuthError`] covers every way a request can be refused. Each variant maps to
//! exactly one [`ErrorKind`], and the gateway maps each kind to one HTTP status
//! and one machine-readable error code. [`GateError`] adds the infrastructure
//! failures that are not the caller's fault.

use std::fmt;

/// Closed set of refusal kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingToken,
    TokenNotFound,
    TokenExpired,
    TokenRevoked,
    ImpersonationDisabled,
    InsufficientScope,
    InsufficientGranularScope,
    RestrictedClient,
    DpopValidationFailed,
    Forbidden,
    NotFound,
}

impl ErrorKind {
    pub const ALL: [Self; 11] = [
        Self::MissingToken,
        Self::TokenNotFound,
        Self::TokenExpired,
        Self::TokenRevoked,
        Self::ImpersonationDisabled,
        Self::InsufficientScope,
        Self::InsufficientGranularScope,
        Self::RestrictedClient,
        Self::DpopValidationFailed,
        Self::Forbidden,
        Self::NotFound,
    ];

    /// Whether the kind means the caller's identity could not be established.
    #[must_use]
    pub fn is_authentication_failure(self) -> bool {
        matches!(
            self,
            Self::MissingToken
                | Self::TokenNotFound
                | Self::TokenExpired
                | Self::TokenRevoked
                | Self::ImpersonationDisabled
                | Self::RestrictedClient
                | Self::DpopValidationFailed
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A refused request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no credentials supplied")]
    MissingToken,

    #[error("token does not match any credential")]
    TokenNotFound,

    #[error("token has expired")]
    TokenExpired,

    #[error("token has been revoked")]
    TokenRevoked,

    #[error("impersonation tokens are disabled")]
    ImpersonationDisabled,

    #[error("token lacks all of the required scopes {required:?}")]
    InsufficientScope { required: Vec<String> },

    #[error("token lacks granular permission '{permission}'")]
    InsufficientGranularScope { permission: String },

    #[error("restricted language server client: {0}")]
    RestrictedClient(String),

    #[error("DPoP proof rejected: {0}")]
    DpopValidationFailed(String),

    #[error("forbidden")]
    Forbidden { reason: Option<String> },

    #[error("not found")]
    NotFound { resource: Option<String> },
}

impl AuthError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingToken => ErrorKind::MissingToken,
            Self::TokenNotFound => ErrorKind::TokenNotFound,
            Self::TokenExpired => ErrorKind::TokenExpired,
            Self::TokenRevoked => ErrorKind::TokenRevoked,
            Self::ImpersonationDisabled => ErrorKind::ImpersonationDisabled,
            Self::InsufficientScope { .. } => ErrorKind::InsufficientScope,
            Self::InsufficientGranularScope { .. } => ErrorKind::InsufficientGranularScope,
            Self::RestrictedClient(_) => ErrorKind::RestrictedClient,
            Self::DpopValidationFailed(_) => ErrorKind::DpopValidationFailed,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    #[must_use]
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: Some(reason.into()),
        }
    }

    /// Generic not-found, indistinguishable from a missing route.
    #[must_use]
    pub fn not_found() -> Self {
        Self::NotFound { resource: None }
    }

    #[must_use]
    pub fn insufficient_scope<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::InsufficientScope {
            required: required.into_iter().map(Into::into).collect(),
        }
    }
}

/// Any failure the gate can produce.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A collaborator (credential store, flag service, directory) is unreachable.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GateError {
    #[must_use]
    pub fn as_auth(&self) -> Option<&AuthError> {
        match self {
            Self::Auth(err) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        self.as_auth().map(AuthError::kind)
    }
}
