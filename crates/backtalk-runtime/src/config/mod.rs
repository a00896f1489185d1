//! Configuration for backtalk bots.
//!
//! Settings are layered with figment: built-in defaults, then a
//! `backtalk.toml` file, then `BACKTALK_*` environment variables, then
//! programmatic overrides. See [`ConfigLoader`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BacktalkConfig, BotConfig, ClassifierConfig, LogFormat, LogLevel, LogOutput, LogRotation,
    LoggingConfig, SpanEventConfig,
};
pub use validation::validate_config;
