//! # Backtalk Core
//!
//! The shared vocabulary of the backtalk bot: events, the connection and
//! transport boundary, and the [`Handler`] capability that every piece of
//! bot behavior implements.
//!
//! ```text
//! ┌───────────┐  TransportEvent  ┌───────────┐  (conn, event)  ┌───────────┐
//! │ Transport │─────────────────▶│ EventLoop │────────────────▶│  Handler  │
//! └───────────┘                  └───────────┘                 └───────────┘
//!       ▲                                                            │
//!       └──────────────── Connection::send_message ◀─────────────────┘
//! ```
//!
//! The concrete chat platform lives behind [`Transport`] and [`Connection`].
//! [`LocalTransport`] is an in-process implementation for tests and demos.

pub mod connection;
pub mod error;
pub mod event;
pub mod handler;
pub mod transport;

pub use connection::{BotIdentity, BoxedConnection, Connection, SessionInfo};
pub use error::{TimestampError, TransportError, TransportResult};
pub use event::{MessageEvent, TransportEvent, parse_timestamp};
pub use handler::{BoxedHandler, Handler, HandlerError, HandlerFn, HandlerResult, handler_fn};
pub use transport::{
    EventStream, LocalConnection, LocalHandle, LocalTransport, OutgoingMessage, Transport,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::connection::{BoxedConnection, Connection, SessionInfo};
    pub use super::event::{MessageEvent, TransportEvent};
    pub use super::handler::{Handler, HandlerResult, handler_fn};
    pub use super::transport::Transport;
}
