//! The bot's event loop.
//!
//! [`EventLoop`] starts a [`Transport`], then pulls inbound events one at a
//! time and feeds message events to a handler. Handlers never overlap: the
//! next event is read only after the previous handler call returns.
//!
//! ```text
//! Idle ──▶ Connecting ──▶ Running ──┬──▶ ShuttingDown ──┬──▶ Stopped
//!                                   └──▶ Fatal ─────────┘
//! ```
//!
//! The loop ends when
//!
//! - the cancellation token fires ([`RuntimeError::Cancelled`]),
//! - the transport reports invalid credentials ([`RuntimeError::InvalidAuth`]),
//! - a handler fails ([`RuntimeError::HandlerFailed`]),
//! - or the event stream ends (`Ok(())`).
//!
//! Transport error notices are logged and skipped. Reconnecting is the
//! transport's job.
//!
//! # Example
//!
//! ```rust,ignore
//! use backtalk_runtime::EventLoop;
//!
//! let mut event_loop = EventLoop::new(transport);
//! event_loop.run_until_shutdown(&direct_filter(registry)).await?;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::error::{RuntimeError, RuntimeResult};
use backtalk_core::{BoxedConnection, Handler, Transport, TransportEvent};

/// Lifecycle state of an [`EventLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Not started yet.
    #[default]
    Idle,
    /// Starting the transport.
    Connecting,
    /// Consuming events.
    Running,
    /// Stopping after cancellation or the end of the event stream.
    ShuttingDown,
    /// Stopping after invalid credentials or a handler failure.
    Fatal,
    /// Finished.
    Stopped,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Running => write!(f, "Running"),
            Self::ShuttingDown => write!(f, "ShuttingDown"),
            Self::Fatal => write!(f, "Fatal"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Counters collected while the loop runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Inbound events of any kind.
    pub events: u64,
    /// Message events handed to the handler.
    pub messages_handled: u64,
    /// Message events sent by the bot itself.
    pub self_messages_skipped: u64,
    /// Transport error notices.
    pub transport_errors: u64,
}

/// Drives a [`Transport`] and dispatches its messages to a handler.
pub struct EventLoop<T> {
    transport: T,
    connection: BoxedConnection,
    state: LoopState,
    stats: LoopStats,
}

impl<T> EventLoop<T>
where
    T: Transport,
{
    /// Creates an idle loop over `transport`.
    pub fn new(transport: T) -> Self {
        let connection = transport.connection();
        Self {
            transport,
            connection,
            state: LoopState::Idle,
            stats: LoopStats::default(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Counters collected so far.
    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// The connection handlers receive.
    pub fn connection(&self) -> &BoxedConnection {
        &self.connection
    }

    fn set_state(&mut self, state: LoopState) {
        let old_state = self.state;
        self.state = state;
        debug!(old_state = %old_state, new_state = %state, "Event loop state changed");
    }

    /// Runs until `cancel` fires or a terminating event arrives.
    ///
    /// Cancellation is checked before every event, so queued events are not
    /// processed once the token has fired. A handler that is already running
    /// is never interrupted.
    pub async fn run<H>(&mut self, handler: &H, cancel: CancellationToken) -> RuntimeResult<()>
    where
        H: Handler + ?Sized,
    {
        let result = self.run_inner(handler, cancel).await;
        self.set_state(LoopState::Stopped);

        match &result {
            Ok(()) => info!(stats = ?self.stats, "Event loop stopped"),
            Err(e) => info!(stats = ?self.stats, reason = %e, "Event loop stopped"),
        }
        result
    }

    async fn run_inner<H>(&mut self, handler: &H, cancel: CancellationToken) -> RuntimeResult<()>
    where
        H: Handler + ?Sized,
    {
        self.set_state(LoopState::Connecting);
        let mut events = match self.transport.start().await {
            Ok(events) => events,
            Err(e) => {
                error!(error = %e, "Failed to start transport");
                self.set_state(LoopState::Fatal);
                return Err(e.into());
            }
        };
        self.set_state(LoopState::Running);

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Cancellation requested");
                    self.set_state(LoopState::ShuttingDown);
                    return Err(RuntimeError::Cancelled);
                }
                event = events.next() => event,
            };

            let Some(event) = event else {
                info!("Event stream ended");
                self.set_state(LoopState::ShuttingDown);
                return Ok(());
            };
            self.stats.events += 1;

            match event {
                TransportEvent::Connected { connection_count } => {
                    info!(connection_count, "Connected");
                }
                TransportEvent::Message(message) => {
                    let own_id = self.connection.session_info().user.id;
                    if message.user == own_id {
                        trace!(channel = %message.channel, "Skipping own message");
                        self.stats.self_messages_skipped += 1;
                        continue;
                    }

                    let message = Arc::new(message);
                    if let Err(e) = handler.handle(self.connection.clone(), message).await {
                        error!(error = %e, "Handler failed, stopping");
                        self.set_state(LoopState::Fatal);
                        return Err(RuntimeError::HandlerFailed(e));
                    }
                    self.stats.messages_handled += 1;
                }
                TransportEvent::Error { message } => {
                    warn!(error = %message, "Transport reported an error");
                    self.stats.transport_errors += 1;
                }
                TransportEvent::InvalidAuth => {
                    error!("Invalid credentials, stopping");
                    self.set_state(LoopState::Fatal);
                    return Err(RuntimeError::InvalidAuth);
                }
                TransportEvent::Other { kind } => {
                    trace!(kind = %kind, "Ignoring event");
                }
            }
        }
    }

    /// Runs until Ctrl+C or SIGTERM.
    ///
    /// Stopping on a signal is reported as `Ok(())`.
    pub async fn run_until_shutdown<H>(&mut self, handler: &H) -> RuntimeResult<()>
    where
        H: Handler + ?Sized,
    {
        info!("Bot is running. Press Ctrl+C to stop.");
        self.run_until(handler, shutdown_signal()).await
    }

    /// Runs until `shutdown` completes.
    ///
    /// Stopping because `shutdown` completed is reported as `Ok(())`. Events
    /// still queued at that point are not processed.
    pub async fn run_until<H, F>(&mut self, handler: &H, shutdown: F) -> RuntimeResult<()>
    where
        H: Handler + ?Sized,
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let watcher = tokio::spawn(async move {
            shutdown.await;
            trigger.cancel();
        });

        let result = self.run(handler, cancel).await;
        watcher.abort();

        match result {
            Err(RuntimeError::Cancelled) => {
                debug!("Shutdown requested");
                Ok(())
            }
            other => other,
        }
    }
}

impl<T> fmt::Debug for EventLoop<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Completes on Ctrl+C or, on Unix, SIGTERM.
///
/// Never completes if no signal handler can be installed.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = ctrl_c() => {}
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::oneshot;

    use backtalk_core::{
        BotIdentity, HandlerError, LocalHandle, LocalTransport, MessageEvent, SessionInfo,
        TransportError, handler_fn,
    };

    fn local() -> (EventLoop<LocalTransport>, LocalHandle) {
        let session = SessionInfo::new(BotIdentity::new("UBOT", "backtalk"));
        let (transport, handle) = LocalTransport::new(session);
        (EventLoop::new(transport), handle)
    }

    /// Counts calls and fails on "boom".
    fn recorder(calls: Arc<AtomicUsize>) -> impl Handler + 'static {
        handler_fn(move |_, event: Arc<MessageEvent>| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if event.text == "boom" {
                    return Err::<(), HandlerError>("handler exploded".into());
                }
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn test_skips_own_messages() {
        let (mut event_loop, mut handle) = local();
        let calls = Arc::new(AtomicUsize::new(0));

        handle.message("UBOT", "C1", "good morning").unwrap();
        handle.message("U1", "C1", "good morning").unwrap();
        handle.message("UBOT", "D1", "boom").unwrap();
        handle.close();

        let result = event_loop
            .run(&recorder(calls.clone()), CancellationToken::new())
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(event_loop.state(), LoopState::Stopped);

        let stats = event_loop.stats();
        assert_eq!(stats.events, 4); // includes Connected
        assert_eq!(stats.messages_handled, 1);
        assert_eq!(stats.self_messages_skipped, 2);
    }

    #[tokio::test]
    async fn test_invalid_auth_stops_immediately() {
        let (mut event_loop, handle) = local();
        let calls = Arc::new(AtomicUsize::new(0));

        handle.message("U1", "C1", "first").unwrap();
        handle.push(TransportEvent::InvalidAuth).unwrap();
        handle.message("U1", "C1", "second").unwrap();
        handle.message("U1", "C1", "third").unwrap();

        let result = event_loop
            .run(&recorder(calls.clone()), CancellationToken::new())
            .await;

        assert!(matches!(result, Err(RuntimeError::InvalidAuth)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(event_loop.state(), LoopState::Stopped);
    }

    #[tokio::test]
    async fn test_handler_error_is_fatal() {
        let (mut event_loop, handle) = local();
        let calls = Arc::new(AtomicUsize::new(0));

        handle.message("U1", "C1", "hi").unwrap();
        handle.message("U1", "C1", "boom").unwrap();
        handle.message("U1", "C1", "hi again").unwrap();

        let result = event_loop
            .run(&recorder(calls.clone()), CancellationToken::new())
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, RuntimeError::HandlerFailed(_)));
        assert_eq!(err.to_string(), "Handler failed: handler exploded");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transport_errors_are_not_fatal() {
        let (mut event_loop, mut handle) = local();
        let calls = Arc::new(AtomicUsize::new(0));

        handle
            .push(TransportEvent::Error {
                message: "socket hiccup".to_string(),
            })
            .unwrap();
        handle
            .push(TransportEvent::Other {
                kind: "user_typing".to_string(),
            })
            .unwrap();
        handle.message("U1", "C1", "still here").unwrap();
        handle.close();

        let result = event_loop
            .run(&recorder(calls.clone()), CancellationToken::new())
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(event_loop.stats().transport_errors, 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_processes_nothing() {
        let (mut event_loop, handle) = local();
        let calls = Arc::new(AtomicUsize::new(0));
        handle.message("U1", "C1", "hi").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = event_loop.run(&recorder(calls.clone()), cancel).await;

        assert!(matches!(result, Err(RuntimeError::Cancelled)));
        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(event_loop.state(), LoopState::Stopped);
    }

    #[tokio::test]
    async fn test_cancel_checked_between_events() {
        let (mut event_loop, handle) = local();
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let trigger = cancel.clone();
        let counter = calls.clone();
        let handler = handler_fn(move |_, _| {
            let trigger = trigger.clone();
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                trigger.cancel();
                Ok::<(), HandlerError>(())
            }
        });

        for _ in 0..3 {
            handle.message("U1", "C1", "hi").unwrap();
        }

        let result = event_loop.run(&handler, cancel).await;

        assert!(matches!(result, Err(RuntimeError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting() {
        let (mut event_loop, _handle) = local();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            trigger.cancel();
        });

        let handler = handler_fn(|_, _| async { Ok::<(), HandlerError>(()) });
        let result = event_loop.run(&handler, cancel).await;
        assert!(matches!(result, Err(RuntimeError::Cancelled)));
    }

    #[tokio::test]
    async fn test_run_until_reports_shutdown_as_ok() {
        let (mut event_loop, handle) = local();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let (fired_tx, fired_rx) = oneshot::channel::<()>();
        let calls = Arc::new(AtomicUsize::new(0));

        // The first message requests shutdown and returns only once the
        // shutdown future has completed.
        let pending = Arc::new(Mutex::new(Some((stop_tx, fired_rx))));
        let counter = calls.clone();
        let handler = handler_fn(move |_, _| {
            let counter = counter.clone();
            let pending = pending.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let next = pending.lock().unwrap().take();
                if let Some((stop_tx, fired_rx)) = next {
                    let _ = stop_tx.send(());
                    let _ = fired_rx.await;
                }
                Ok::<(), HandlerError>(())
            }
        });

        for _ in 0..3 {
            handle.message("U1", "C1", "hi").unwrap();
        }

        let shutdown = async move {
            let _ = stop_rx.await;
            let _ = fired_tx.send(());
        };
        let result = event_loop.run_until(&handler, shutdown).await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(event_loop.state(), LoopState::Stopped);
        assert_eq!(event_loop.stats().messages_handled, 1);
    }

    #[tokio::test]
    async fn test_run_until_passes_through_fatal_errors() {
        let (mut event_loop, handle) = local();
        handle.push(TransportEvent::InvalidAuth).unwrap();

        let handler = handler_fn(|_, _| async { Ok::<(), HandlerError>(()) });
        let result = event_loop
            .run_until(&handler, std::future::pending::<()>())
            .await;

        assert!(matches!(result, Err(RuntimeError::InvalidAuth)));
        assert_eq!(event_loop.state(), LoopState::Stopped);
    }

    #[tokio::test]
    async fn test_start_failure() {
        let (mut event_loop, mut handle) = local();
        handle.close();

        let handler = handler_fn(|_, _| async { Ok::<(), HandlerError>(()) });
        event_loop
            .run(&handler, CancellationToken::new())
            .await
            .unwrap();

        let result = event_loop.run(&handler, CancellationToken::new()).await;
        assert!(matches!(
            result,
            Err(RuntimeError::Transport(TransportError::AlreadyStarted))
        ));
        assert_eq!(event_loop.state(), LoopState::Stopped);
    }

    #[tokio::test]
    async fn test_replies_through_connection() {
        let (mut event_loop, mut handle) = local();
        let handler = handler_fn(|conn: BoxedConnection, event: Arc<MessageEvent>| async move {
            conn.reply(&event, &format!("you said: {}", event.text)).await?;
            Ok::<(), HandlerError>(())
        });

        handle.message("U1", "D1", "hello").unwrap();
        handle.close();
        event_loop
            .run(&handler, CancellationToken::new())
            .await
            .unwrap();

        let reply = handle.recv_outgoing().await.unwrap();
        assert_eq!(reply.channel, "D1");
        assert_eq!(reply.text, "you said: hello");
    }

    #[tokio::test]
    async fn test_filtered_intent_routing() {
        use backtalk_classifier::NaiveBayesClassifier;
        use backtalk_framework::{IntentRegistry, UNKNOWN_INTENT, direct_filter};

        let classifier = NaiveBayesClassifier::new(["Morning", "Night"], 0.5).unwrap();
        tokio_test::assert_ok!(classifier.train("Morning", "good morning").await);
        tokio_test::assert_ok!(classifier.train("Night", "good night").await);
        tokio_test::assert_ok!(classifier.finish_training().await);

        let reply = |text: &'static str| {
            handler_fn(move |conn: BoxedConnection, event: Arc<MessageEvent>| async move {
                conn.reply(&event, text).await?;
                Ok::<(), HandlerError>(())
            })
        };
        let handler = direct_filter(
            IntentRegistry::new(Arc::new(classifier))
                .with_intent("Morning", reply("morning!"))
                .with_intent("Night", reply("night!"))
                .with_intent(UNKNOWN_INTENT, reply("what?")),
        );

        let session =
            SessionInfo::new(BotIdentity::new("UBOT", "backtalk")).with_private_channel("D1");
        let (transport, mut handle) = LocalTransport::new(session);
        let mut event_loop = EventLoop::new(transport);

        handle.message("U1", "D1", "good morning").unwrap();
        handle.message("U1", "C1", "good night").unwrap();
        handle.message("U1", "C1", "<@UBOT> good night").unwrap();
        handle.message("UBOT", "D1", "good night").unwrap();
        handle.message("U1", "D1", "banana").unwrap();
        handle.close();

        tokio_test::assert_ok!(event_loop.run(&handler, CancellationToken::new()).await);

        let replies: Vec<String> = std::iter::from_fn(|| handle.try_recv_outgoing())
            .map(|m| m.text)
            .collect();
        assert_eq!(replies, vec!["morning!", "night!", "what?"]);
    }
}
