//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// ```toml
/// [logging]
/// level = "debug"
/// output = "stderr"
///
/// [bot]
/// model_path = "model.json"
/// direct_only = true
///
/// [classifier]
/// threshold = 0.6
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktalkConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Bot behavior.
    #[serde(default)]
    pub bot: BotConfig,

    /// Classifier settings used when training in-process.
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as used in filter directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line format of log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Newline-delimited JSON. Requires the `json-log` feature.
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Write to [`LoggingConfig::file_path`].
    File,
}

/// Rotation policy for file output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level, overridden by `RUST_LOG` when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file used when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids in every line.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in every line.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module levels, e.g. `backtalk_classifier = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

// =============================================================================
// Bot
// =============================================================================

/// Bot behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Persisted model to load at startup.
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// Training data to build a model from when no model file is given.
    #[serde(default)]
    pub samples_path: Option<PathBuf>,

    /// Only react to messages addressed to the bot.
    #[serde(default = "default_direct_only")]
    pub direct_only: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            samples_path: None,
            direct_only: default_direct_only(),
        }
    }
}

fn default_direct_only() -> bool {
    true
}

// =============================================================================
// Classifier
// =============================================================================

/// Classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Minimum probability for a label to be accepted.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Bound of the training queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_threshold() -> f64 {
    0.5
}

fn default_queue_capacity() -> usize {
    backtalk_classifier::DEFAULT_QUEUE_CAPACITY
}
