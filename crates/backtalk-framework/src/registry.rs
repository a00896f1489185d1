//! Intent registry.
//!
//! The [`IntentRegistry`] classifies each message and hands it to the handler
//! registered for the resulting intent. Messages the classifier cannot place
//! are routed to [`UNKNOWN_INTENT`].
//!
//! ```rust,ignore
//! use backtalk_framework::{IntentRegistry, UNKNOWN_INTENT};
//!
//! let registry = IntentRegistry::new(classifier)
//!     .with_intent("Morning", morning)
//!     .with_intent("Night", night)
//!     .with_intent(UNKNOWN_INTENT, shrug);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, Level, debug, info, span, trace};

use backtalk_classifier::Classifier;
use backtalk_core::{BoxedConnection, BoxedHandler, Handler, HandlerResult, MessageEvent};

/// Intent used for messages that could not be classified.
pub const UNKNOWN_INTENT: &str = "Backtalk_MetaIntent_UnableToClassifyIntent";

/// Routes classified messages to per-intent handlers.
///
/// At most one handler runs per message. A message whose intent has no
/// registered handler is accepted silently.
pub struct IntentRegistry {
    classifier: Arc<dyn Classifier>,
    intents: HashMap<String, BoxedHandler>,
}

impl IntentRegistry {
    /// Creates a registry with no intents.
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            intents: HashMap::new(),
        }
    }

    /// Registers `handler` for `intent`, replacing any earlier registration.
    pub fn register<H>(&mut self, intent: impl Into<String>, handler: H)
    where
        H: Handler + 'static,
    {
        let intent = intent.into();
        if self.intents.insert(intent.clone(), Arc::new(handler)).is_some() {
            debug!(intent = %intent, "Replaced intent handler");
        }
    }

    /// Registers `handler` for `intent` (builder pattern).
    pub fn with_intent<H>(mut self, intent: impl Into<String>, handler: H) -> Self
    where
        H: Handler + 'static,
    {
        self.register(intent, handler);
        self
    }

    /// Returns whether a handler is registered for `intent`.
    pub fn is_registered(&self, intent: &str) -> bool {
        self.intents.contains_key(intent)
    }

    /// Returns the number of registered intents.
    pub fn intent_count(&self) -> usize {
        self.intents.len()
    }

    /// The classifier used to resolve intents.
    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    /// Resolves the intent of `text`, falling back to [`UNKNOWN_INTENT`].
    pub fn resolve(&self, text: &str) -> String {
        match self.classifier.classify(text) {
            Ok(intent) => intent,
            Err(e) => {
                info!(text, reason = %e, "Unable to classify text");
                UNKNOWN_INTENT.to_string()
            }
        }
    }

    /// Classifies `event` and runs the matching handler, if any.
    ///
    /// The handler's result is returned unchanged.
    pub async fn dispatch(
        &self,
        connection: BoxedConnection,
        event: Arc<MessageEvent>,
    ) -> HandlerResult {
        let intent = self.resolve(&event.text);
        let span = span!(Level::DEBUG, "dispatch", intent = %intent, channel = %event.channel);

        let Some(handler) = self.intents.get(&intent) else {
            trace!(parent: &span, "No handler registered for intent");
            return Ok(());
        };

        debug!(parent: &span, "Dispatching message");
        handler.handle(connection, event).instrument(span).await
    }
}

#[async_trait]
impl Handler for IntentRegistry {
    async fn handle(&self, connection: BoxedConnection, event: Arc<MessageEvent>) -> HandlerResult {
        self.dispatch(connection, event).await
    }
}

impl fmt::Debug for IntentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut intents: Vec<&str> = self.intents.keys().map(String::as_str).collect();
        intents.sort_unstable();

        f.debug_struct("IntentRegistry")
            .field("labels", &self.classifier.labels())
            .field("threshold", &self.classifier.threshold())
            .field("intents", &intents)
            .finish()
    }
}
