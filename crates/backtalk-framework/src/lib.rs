//! # Backtalk Framework
//!
//! Handler building blocks that sit between the event loop and user code:
//!
//! - [`IntentRegistry`] classifies a message and runs the handler registered
//!   for its intent.
//! - [`DirectFilter`] drops messages that are not addressed to the bot.
//!
//! Both implement [`Handler`](backtalk_core::Handler), so they nest freely:
//!
//! ```rust,ignore
//! use backtalk_framework::{IntentRegistry, UNKNOWN_INTENT, direct_filter};
//!
//! let handler = direct_filter(
//!     IntentRegistry::new(classifier)
//!         .with_intent("Morning", morning)
//!         .with_intent(UNKNOWN_INTENT, shrug),
//! );
//! ```

pub mod filter;
pub mod registry;

pub use filter::{DirectFilter, DirectFilterLayer, direct_filter};
pub use registry::{IntentRegistry, UNKNOWN_INTENT};
