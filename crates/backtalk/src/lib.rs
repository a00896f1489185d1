//! # Backtalk
//!
//! A chat bot that understands what it is told.
//!
//! Backtalk turns free-text messages into intents with a naive Bayes
//! classifier and routes each message to the handler registered for its
//! intent.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐    ┌───────────┐    ┌──────────────┐    ┌────────────────┐    ┌─────────┐
//! │ Transport │───▶│ EventLoop │───▶│ DirectFilter │───▶│ IntentRegistry │───▶│ Handler │
//! └───────────┘    └───────────┘    └──────────────┘    └────────────────┘    └─────────┘
//!                                                               │
//!                                                               ▼
//!                                                         ┌────────────┐
//!                                                         │ Classifier │
//!                                                         └────────────┘
//! ```
//!
//! - **Transport**: the chat platform connection (external; [`LocalTransport`](core::LocalTransport) for tests)
//! - **EventLoop**: drops the bot's own messages and stops on fatal conditions
//! - **DirectFilter**: keeps only messages addressed to the bot
//! - **IntentRegistry**: classifies and dispatches, with an unknown-intent fallback
//! - **Classifier**: trained online or restored from a JSON model
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use backtalk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let classifier = NaiveBayesClassifier::from_json(&std::fs::read("model.json")?)?;
//!
//!     let registry = IntentRegistry::new(Arc::new(classifier))
//!         .with_intent("Morning", handler_fn(|conn, event| async move {
//!             conn.reply(&event, "good morning to you too").await?;
//!             Ok(())
//!         }))
//!         .with_intent(UNKNOWN_INTENT, handler_fn(|_, _| async { Ok(()) }));
//!
//!     let mut event_loop = EventLoop::new(transport);
//!     event_loop.run_until_shutdown(&direct_filter(registry)).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: `backtalk.toml` configuration files (default)
//! - `json-log`: JSON log output

pub use backtalk_classifier as classifier;
pub use backtalk_core as core;
pub use backtalk_framework as framework;
pub use backtalk_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use backtalk::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime
    pub use backtalk_runtime::{CancellationToken, EventLoop, RuntimeError};

    // Routing
    pub use backtalk_framework::{DirectFilterLayer, IntentRegistry, UNKNOWN_INTENT, direct_filter};

    // Classification
    pub use backtalk_classifier::{Classifier, ClassifierError, NaiveBayesClassifier};

    // Handlers and the transport boundary
    pub use backtalk_core::{
        BoxedConnection, Connection, Handler, HandlerError, HandlerResult, MessageEvent,
        SessionInfo, Transport, TransportEvent, handler_fn,
    };
}
