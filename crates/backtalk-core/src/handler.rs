//! The handler capability.
//!
//! Every behavior the bot can perform in response to a message, including
//! the intent registry and the direct-message filter, is a [`Handler`].
//! Handlers compose by wrapping one another; nothing in the core depends on
//! a concrete handler type.
//!
//! # Example
//!
//! ```rust,ignore
//! use backtalk_core::{Handler, handler_fn};
//!
//! let greet = handler_fn(|conn, event| async move {
//!     conn.reply(&event, "hello!").await?;
//!     Ok(())
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::connection::BoxedConnection;
use crate::event::MessageEvent;

/// Error returned by a handler.
///
/// Returning an error from a handler stops the event loop, so handlers should
/// turn recoverable problems into `Ok(())` and keep errors for states the bot
/// cannot continue from.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Responds to a message event.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handles `event`, using `connection` for any replies.
    async fn handle(&self, connection: BoxedConnection, event: Arc<MessageEvent>) -> HandlerResult;
}

/// A shared handler trait object.
pub type BoxedHandler = Arc<dyn Handler>;

#[async_trait]
impl<H> Handler for Arc<H>
where
    H: Handler + ?Sized,
{
    async fn handle(&self, connection: BoxedConnection, event: Arc<MessageEvent>) -> HandlerResult {
        (**self).handle(connection, event).await
    }
}

// ============================================================================
// HandlerFn
// ============================================================================

/// A [`Handler`] backed by an async closure. Created by [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wraps an async closure as a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(BoxedConnection, Arc<MessageEvent>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    HandlerFn { f }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(BoxedConnection, Arc<MessageEvent>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, connection: BoxedConnection, event: Arc<MessageEvent>) -> HandlerResult {
        (self.f)(connection, event).await
    }
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}
