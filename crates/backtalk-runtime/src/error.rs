//! Runtime error types.

use thiserror::Error;

use backtalk_core::{HandlerError, TransportError};

/// Reasons the event loop stopped, and other runtime failures.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The cancellation token fired.
    #[error("Event loop cancelled")]
    Cancelled,

    /// The platform rejected the bot's credentials.
    #[error("Invalid credentials")]
    InvalidAuth,

    /// A handler returned an error. Handler errors always stop the loop.
    #[error("Handler failed: {0}")]
    HandlerFailed(#[source] HandlerError),

    /// The transport could not be started.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl RuntimeError {
    /// Returns whether the loop stopped because it was asked to.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
