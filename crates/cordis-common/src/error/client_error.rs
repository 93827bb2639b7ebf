//! Top-level client error
//!
//! Wraps configuration and domain failures and adds the lifecycle errors
//! only the gateway client can raise.

use cordis_core::DomainError;

use crate::config::ConfigError;

/// Errors surfaced by the public client API
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// `connect` was called after an explicit `disconnect`
    #[error("Session terminated; create a new client to connect again")]
    SessionTerminated,

    #[error("Internal error: {0}")]
    Internal(#[source] anyhow::Error),
}

impl ClientError {
    /// Wrap any error as internal
    pub fn internal<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Internal(err.into())
    }

    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
            Self::SessionTerminated => "SESSION_TERMINATED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Domain(DomainError::Transport(_)) => true,
            Self::Domain(DomainError::Api { status, .. }) => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;
