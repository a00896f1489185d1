//! The reply-capable connection handle passed to handlers.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportResult;
use crate::event::MessageEvent;

/// The bot's own account on the chat platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    /// Platform user id.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl BotIdentity {
    /// Creates an identity from the bot's user ID and display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Session information reported by the transport.
///
/// The private channel list can change while the bot runs (new direct
/// conversations, reconnects), so consumers should ask the connection for a
/// fresh copy instead of caching one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    /// The bot's own identity.
    pub user: BotIdentity,
    /// Ids of private one-to-one channels with the bot.
    pub private_channels: Vec<String>,
}

impl SessionInfo {
    /// Creates session info with no private channels.
    pub fn new(user: BotIdentity) -> Self {
        Self {
            user,
            private_channels: Vec::new(),
        }
    }

    /// Adds a private channel (builder pattern).
    pub fn with_private_channel(mut self, channel: impl Into<String>) -> Self {
        self.private_channels.push(channel.into());
        self
    }

    /// Returns whether `channel` is a private one-to-one channel with the bot.
    pub fn is_private_channel(&self, channel: &str) -> bool {
        self.private_channels.iter().any(|c| c == channel)
    }

    /// The prefix a message must start with to explicitly address the bot.
    pub fn mention_prefix(&self) -> String {
        format!("<@{}> ", self.user.id)
    }

    /// Returns whether `event` is addressed to the bot, either by being sent
    /// in a private channel or by starting with the mention prefix.
    pub fn is_addressed(&self, event: &MessageEvent) -> bool {
        self.is_private_channel(&event.channel) || event.text.starts_with(&self.mention_prefix())
    }
}

/// A live connection to the chat platform.
///
/// Handlers receive a [`BoxedConnection`] alongside every event and use it to
/// reply. Implementations must be cheap to share.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Returns the current session info.
    fn session_info(&self) -> SessionInfo;

    /// Sends `text` to `channel`.
    async fn send_message(&self, channel: &str, text: &str) -> TransportResult<()>;

    /// Sends `text` to the channel `event` was received on.
    async fn reply(&self, event: &MessageEvent, text: &str) -> TransportResult<()> {
        self.send_message(&event.channel, text).await
    }
}

/// A shared connection trait object.
pub type BoxedConnection = Arc<dyn Connection>;

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionInfo {
        SessionInfo::new(BotIdentity::new("UBOT", "backtalk")).with_private_channel("D1")
    }

    #[test]
    fn test_mention_prefix() {
        assert_eq!(session().mention_prefix(), "<@UBOT> ");
    }

    #[test]
    fn test_is_addressed() {
        let info = session();
        assert!(info.is_addressed(&MessageEvent::new("U1", "D1", "hello")));
        assert!(info.is_addressed(&MessageEvent::new("U1", "C1", "<@UBOT> hello")));
        assert!(!info.is_addressed(&MessageEvent::new("U1", "C1", "hello <@UBOT>")));
        assert!(!info.is_addressed(&MessageEvent::new("U1", "C1", "<@UBOT>hello")));
    }
}
