//! Inbound events delivered by a transport.
//!
//! A transport produces a sequence of [`TransportEvent`]s. Only
//! [`TransportEvent::Message`] carries user content; the remaining variants
//! describe the state of the underlying connection.
//!
//! ```text
//! TransportEvent
//! ├── Connected { connection_count }
//! ├── Message(MessageEvent { user, channel, text, timestamp })
//! ├── Error { message }
//! ├── InvalidAuth
//! └── Other { kind }
//! ```

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::TimestampError;

const NANOS_PER_SEC: i128 = 1_000_000_000;
const FRACTION_DIGITS: usize = 9;

// ============================================================================
// MessageEvent
// ============================================================================

/// A chat message received by the bot.
///
/// Events are immutable once received and are shared between the event loop
/// and handlers as `Arc<MessageEvent>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Identifier of the sending user.
    pub user: String,
    /// Identifier of the channel the message was posted in.
    pub channel: String,
    /// Raw message text.
    pub text: String,
    /// Platform timestamp in `<seconds>.<fraction>` form.
    pub timestamp: String,
}

impl MessageEvent {
    /// Creates a message event stamped with the current time.
    pub fn new(
        user: impl Into<String>,
        channel: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            user: user.into(),
            channel: channel.into(),
            text: text.into(),
            timestamp: format!("{}.{:06}", now.unix_timestamp(), now.microsecond()),
        }
    }

    /// Replaces the timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Parses [`timestamp`](Self::timestamp) into a date-time value.
    pub fn time(&self) -> Result<OffsetDateTime, TimestampError> {
        parse_timestamp(&self.timestamp)
    }
}

// ============================================================================
// TransportEvent
// ============================================================================

/// A tagged item of the inbound event sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportEvent {
    /// The transport (re)established its connection.
    Connected {
        /// How many times the transport has connected so far.
        connection_count: u32,
    },
    /// A chat message.
    Message(MessageEvent),
    /// A non-fatal transport-level error.
    Error {
        /// Human-readable description.
        message: String,
    },
    /// The credentials were rejected. Nothing can fix this mid-run.
    InvalidAuth,
    /// Any other platform event the core does not interpret.
    Other {
        /// Platform-specific event name.
        kind: String,
    },
}

impl TransportEvent {
    /// Returns a short name for this event kind, used in logs.
    pub fn kind(&self) -> &str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Message(_) => "message",
            Self::Error { .. } => "error",
            Self::InvalidAuth => "invalid_auth",
            Self::Other { kind } => kind,
        }
    }
}

impl From<MessageEvent> for TransportEvent {
    fn from(event: MessageEvent) -> Self {
        Self::Message(event)
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// Converts a platform timestamp such as `"1512802153.000011"` into a UTC
/// date-time.
///
/// The fractional part is read as a decimal fraction of a second; digits past
/// nanosecond precision are ignored.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, TimestampError> {
    let malformed = || TimestampError::Malformed(raw.to_string());

    let (secs, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    let secs: i64 = secs.parse().map_err(|_| malformed())?;

    let mut digits: String = fraction.chars().take(FRACTION_DIGITS).collect();
    while digits.len() < FRACTION_DIGITS {
        digits.push('0');
    }
    let nanos: i128 = digits.parse().map_err(|_| malformed())?;

    let total = i128::from(secs) * NANOS_PER_SEC + nanos;
    Ok(OffsetDateTime::from_unix_timestamp_nanos(total)?)
}
