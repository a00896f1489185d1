//! In-process transport backed by channels.
//!
//! [`LocalTransport`] stands in for a chat platform: a [`LocalHandle`] pushes
//! inbound events and collects everything the bot sends. It is used by tests
//! and by the console demo.
//!
//! ```rust,ignore
//! let (transport, mut handle) = LocalTransport::new(session);
//! handle.message("U1", "D1", "good morning")?;
//! let reply = handle.recv_outgoing().await;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::{EventStream, Transport};
use crate::connection::{BoxedConnection, Connection, SessionInfo};
use crate::error::{TransportError, TransportResult};
use crate::event::{MessageEvent, TransportEvent};

/// A message sent by the bot through a [`LocalConnection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Destination channel.
    pub channel: String,
    /// Message text.
    pub text: String,
}

// =============================================================================
// LocalConnection
// =============================================================================

/// Connection half of the local transport.
#[derive(Debug)]
pub struct LocalConnection {
    session: RwLock<SessionInfo>,
    outgoing_tx: mpsc::UnboundedSender<OutgoingMessage>,
}

#[async_trait]
impl Connection for LocalConnection {
    fn session_info(&self) -> SessionInfo {
        self.session.read().clone()
    }

    async fn send_message(&self, channel: &str, text: &str) -> TransportResult<()> {
        trace!(channel, len = text.len(), "Sending local message");
        self.outgoing_tx
            .send(OutgoingMessage {
                channel: channel.to_string(),
                text: text.to_string(),
            })
            .map_err(|_| TransportError::SendFailed("local receiver dropped".to_string()))
    }
}

// =============================================================================
// LocalTransport
// =============================================================================

/// An in-process [`Transport`].
pub struct LocalTransport {
    connection: Arc<LocalConnection>,
    inbound_rx: Option<mpsc::UnboundedReceiver<TransportEvent>>,
}

impl LocalTransport {
    /// Creates a transport and the handle that drives it.
    pub fn new(session: SessionInfo) -> (Self, LocalHandle) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();

        let connection = Arc::new(LocalConnection {
            session: RwLock::new(session),
            outgoing_tx,
        });

        let transport = Self {
            connection: Arc::clone(&connection),
            inbound_rx: Some(inbound_rx),
        };
        let handle = LocalHandle {
            connection,
            inbound_tx: Some(inbound_tx),
            outgoing_rx,
        };

        (transport, handle)
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn connection(&self) -> BoxedConnection {
        self.connection.clone()
    }

    async fn start(&mut self) -> TransportResult<EventStream> {
        let rx = self
            .inbound_rx
            .take()
            .ok_or(TransportError::AlreadyStarted)?;

        debug!("Local transport started");

        let connected = stream::once(async {
            TransportEvent::Connected {
                connection_count: 1,
            }
        });
        let inbound = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(connected.chain(inbound).boxed())
    }
}

// =============================================================================
// LocalHandle
// =============================================================================

/// The platform side of a [`LocalTransport`].
pub struct LocalHandle {
    connection: Arc<LocalConnection>,
    inbound_tx: Option<mpsc::UnboundedSender<TransportEvent>>,
    outgoing_rx: mpsc::UnboundedReceiver<OutgoingMessage>,
}

impl LocalHandle {
    /// Delivers an inbound event.
    pub fn push(&self, event: TransportEvent) -> TransportResult<()> {
        let tx = self
            .inbound_tx
            .as_ref()
            .ok_or_else(|| TransportError::closed("local transport closed"))?;
        tx.send(event)
            .map_err(|_| TransportError::closed("event stream dropped"))
    }

    /// Delivers a chat message.
    pub fn message(
        &self,
        user: impl Into<String>,
        channel: impl Into<String>,
        text: impl Into<String>,
    ) -> TransportResult<()> {
        self.push(MessageEvent::new(user, channel, text).into())
    }

    /// Ends the inbound event stream.
    pub fn close(&mut self) {
        self.inbound_tx = None;
    }

    /// Replaces the list of private channels reported in the session info.
    pub fn set_private_channels(&self, channels: Vec<String>) {
        self.connection.session.write().private_channels = channels;
    }

    /// Adds a private channel to the session info.
    pub fn add_private_channel(&self, channel: impl Into<String>) {
        self.connection
            .session
            .write()
            .private_channels
            .push(channel.into());
    }

    /// Returns the connection half, as handlers see it.
    pub fn connection(&self) -> BoxedConnection {
        self.connection.clone()
    }

    /// Waits for the next message sent by the bot.
    pub async fn recv_outgoing(&mut self) -> Option<OutgoingMessage> {
        self.outgoing_rx.recv().await
    }

    /// Returns the next message sent by the bot, if one is already queued.
    pub fn try_recv_outgoing(&mut self) -> Option<OutgoingMessage> {
        self.outgoing_rx.try_recv().ok()
    }
}
