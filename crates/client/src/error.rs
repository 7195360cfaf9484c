// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

use crate::Handle;

/// Coarse classification used by callers to decide how to react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    WalletUnavailable,
    SigningRejected,
    Validation,
    AuthorizationExpired,
    AuthorizationMismatch,
    RuntimeUnavailable,
    Ledger,
    DecryptionDenied,
    Cancelled,
}

/// Every failure the workflow surfaces. Cloneable so that callers sharing one in-flight
/// operation all receive the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no wallet connected")]
    WalletUnavailable,

    #[error("signature request rejected: {0}")]
    SigningRejected(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("decryption authorization expired at {expired_at} (now {now})")]
    AuthorizationExpired { expired_at: u64, now: u64 },

    #[error("decryption authorization does not cover {0}")]
    AuthorizationMismatch(String),

    #[error("encryption runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("ledger call failed: {0}")]
    Ledger(String),

    #[error("decryption denied for {handle}: {reason}")]
    DecryptionDenied { handle: Handle, reason: String },

    #[error("operation cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Configuration(_) => ErrorKind::Configuration,
            ClientError::WalletUnavailable => ErrorKind::WalletUnavailable,
            ClientError::SigningRejected(_) => ErrorKind::SigningRejected,
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::AuthorizationExpired { .. } => ErrorKind::AuthorizationExpired,
            ClientError::AuthorizationMismatch(_) => ErrorKind::AuthorizationMismatch,
            ClientError::RuntimeUnavailable(_) => ErrorKind::RuntimeUnavailable,
            ClientError::Ledger(_) => ErrorKind::Ledger,
            ClientError::DecryptionDenied { .. } => ErrorKind::DecryptionDenied,
            ClientError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Transient failures where repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::RuntimeUnavailable(_) | ClientError::Ledger(_)
        )
    }

    /// Failures that are resolved by obtaining a fresh decryption authorization.
    pub fn needs_reauthorization(&self) -> bool {
        matches!(
            self,
            ClientError::SigningRejected(_) | ClientError::AuthorizationExpired { .. }
        )
    }

    /// Flattens an `anyhow` chain from configuration plumbing.
    pub fn configuration(err: anyhow::Error) -> Self {
        ClientError::Configuration(format!("{err:#}"))
    }

    pub fn runtime(err: impl std::fmt::Display) -> Self {
        ClientError::RuntimeUnavailable(err.to_string())
    }

    pub fn ledger(err: impl std::fmt::Display) -> Self {
        ClientError::Ledger(err.to_string())
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
