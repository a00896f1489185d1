//! Backtalk Runtime - runs a bot against a live transport.
//!
//! This crate provides:
//! - the [`EventLoop`] that pumps transport events into a handler
//! - layered configuration ([`config`])
//! - logging setup ([`logging`])
//!
//! ```rust,ignore
//! use backtalk_runtime::{EventLoop, config::load_config, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let mut event_loop = EventLoop::new(transport);
//!     event_loop.run_until_shutdown(&handler).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod event_loop;
pub mod logging;

pub use config::{BacktalkConfig, ConfigError, ConfigLoader, ConfigResult};
pub use error::{RuntimeError, RuntimeResult};
pub use event_loop::{EventLoop, LoopState, LoopStats, shutdown_signal};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;
pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
