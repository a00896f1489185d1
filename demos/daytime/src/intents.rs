//! The daytime intents and their handlers.

use backtalk::prelude::*;
use tracing::info;

pub const MORNING: &str = "Morning";
pub const AFTERNOON: &str = "Afternoon";
pub const EVENING: &str = "Evening";
pub const NIGHT: &str = "Night";

/// Training data used when no model or samples file is configured.
pub const DEFAULT_SAMPLES: &[u8] = include_bytes!("../samples.json");

/// Builds a handler that logs the message and answers with `reply`.
fn answer(reply: &'static str) -> impl Handler + 'static {
    handler_fn(move |conn: BoxedConnection, event: Arc<MessageEvent>| async move {
        info!(user = %event.user, text = %event.text, "{reply}");
        conn.reply(&event, reply).await?;
        Ok::<(), HandlerError>(())
    })
}

/// Registers a handler for every time of day plus the unknown-intent fallback.
pub fn registry(classifier: Arc<dyn Classifier>) -> IntentRegistry {
    IntentRegistry::new(classifier)
        .with_intent(MORNING, answer("Looks like morning"))
        .with_intent(AFTERNOON, answer("Looks like afternoon"))
        .with_intent(EVENING, answer("Looks like evening"))
        .with_intent(NIGHT, answer("Looks like nighttime"))
        .with_intent(UNKNOWN_INTENT, answer("Don't know what to make of it"))
}
