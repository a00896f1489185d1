//! The transport boundary.
//!
//! A [`Transport`] owns the link to the chat platform. The core never
//! reconnects on its own: calling [`Transport::start`] hands connection
//! management to the transport, which keeps the returned event stream alive
//! across drops and reconnects for as long as it can.

pub mod local;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::connection::BoxedConnection;
use crate::error::TransportResult;
use crate::event::TransportEvent;

pub use local::{LocalConnection, LocalHandle, LocalTransport, OutgoingMessage};

/// The inbound event sequence of a transport.
pub type EventStream = BoxStream<'static, TransportEvent>;

/// A chat-platform transport.
#[async_trait]
pub trait Transport: Send {
    /// Returns the reply-capable connection handle.
    fn connection(&self) -> BoxedConnection;

    /// Begins background connection management and returns the inbound
    /// event sequence.
    ///
    /// The stream ends only when the transport gives up for good.
    async fn start(&mut self) -> TransportResult<EventStream>;
}
