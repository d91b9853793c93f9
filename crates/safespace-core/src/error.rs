// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the SafeSpace gateway.

use thiserror::Error;

/// Message shown to clients when the upstream completion service fails.
const UPSTREAM_UNAVAILABLE: &str =
    "I'm having trouble responding right now. Please try again in a moment.";

/// Message shown to clients when the gateway itself is misconfigured.
const SERVICE_MISCONFIGURED: &str = "Chat service is not configured";

/// The primary error type used across the gateway crates.
#[derive(Debug, Error)]
pub enum SafeSpaceError {
    /// Client-caused input errors (missing user id or message).
    #[error("validation error: {0}")]
    Validation(String),

    /// Operator-caused errors (missing upstream credential, invalid config).
    #[error("configuration error: {0}")]
    Config(String),

    /// Upstream completion provider errors (non-success status, transport failure).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        /// HTTP status returned by the upstream, when one was received.
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SafeSpaceError {
    /// Shorthand for a provider error without a status or source.
    pub fn provider(message: impl Into<String>) -> Self {
        SafeSpaceError::Provider {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Returns true when the error was caused by the client's request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SafeSpaceError::Validation(_))
    }

    /// A human-readable description that is safe to relay to clients.
    ///
    /// Validation messages are passed through; everything else is replaced
    /// with a fixed description so upstream bodies and internal details never
    /// reach the client.
    pub fn client_message(&self) -> String {
        match self {
            SafeSpaceError::Validation(message) => message.clone(),
            SafeSpaceError::Config(_) => SERVICE_MISCONFIGURED.to_string(),
            SafeSpaceError::Provider { .. } | SafeSpaceError::Internal(_) => {
                UPSTREAM_UNAVAILABLE.to_string()
            }
        }
    }
}
