//! Direct-message filtering.
//!
//! [`DirectFilter`] wraps a handler so that it only sees messages addressed to
//! the bot: messages in a private one-to-one channel, or messages starting
//! with the bot's mention prefix (`"<@BOTID> "`). Everything else is dropped
//! and reported as handled.
//!
//! The session info is read from the connection on every message, so private
//! channels opened after startup are honored.
//!
//! ```rust,ignore
//! use backtalk_framework::{DirectFilterLayer, direct_filter};
//! use tower_layer::Layer;
//!
//! let handler = direct_filter(registry);
//! // or
//! let handler = DirectFilterLayer.layer(registry);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tower_layer::Layer;
use tracing::trace;

use backtalk_core::{BoxedConnection, Handler, HandlerResult, MessageEvent};

/// Wraps `inner` in a [`DirectFilter`].
pub fn direct_filter<H>(inner: H) -> DirectFilter<H>
where
    H: Handler,
{
    DirectFilter { inner }
}

/// A handler that forwards only messages addressed to the bot.
#[derive(Debug, Clone)]
pub struct DirectFilter<H> {
    inner: H,
}

impl<H> DirectFilter<H> {
    /// Returns a reference to the wrapped handler.
    pub fn get_ref(&self) -> &H {
        &self.inner
    }

    /// Consumes the filter, returning the wrapped handler.
    pub fn into_inner(self) -> H {
        self.inner
    }
}

#[async_trait]
impl<H> Handler for DirectFilter<H>
where
    H: Handler,
{
    async fn handle(&self, connection: BoxedConnection, event: Arc<MessageEvent>) -> HandlerResult {
        let session = connection.session_info();
        if !session.is_addressed(&event) {
            trace!(channel = %event.channel, "Ignoring message not addressed to the bot");
            return Ok(());
        }

        self.inner.handle(connection, event).await
    }
}

/// [`Layer`] that applies [`DirectFilter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectFilterLayer;

impl<H> Layer<H> for DirectFilterLayer
where
    H: Handler,
{
    type Service = DirectFilter<H>;

    fn layer(&self, inner: H) -> Self::Service {
        direct_filter(inner)
    }
}
