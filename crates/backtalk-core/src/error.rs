//! Error types shared by the transport boundary.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The connection is gone and cannot carry more traffic.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// Message send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// `start` was called on a transport that is already running.
    #[error("transport already started")]
    AlreadyStarted,
}

impl TransportError {
    /// Creates a connection-closed error.
    pub fn closed(reason: impl Into<String>) -> Self {
        Self::ConnectionClosed {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Timestamp Errors
// =============================================================================

/// Errors produced when parsing a chat-platform timestamp.
#[derive(Debug, Clone, Error)]
pub enum TimestampError {
    /// The timestamp is not of the form `<seconds>[.<fraction>]`.
    #[error("malformed timestamp: {0:?}")]
    Malformed(String),

    /// The timestamp does not fit in the supported date range.
    #[error("timestamp out of range: {0}")]
    OutOfRange(#[from] time::error::ComponentRange),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
