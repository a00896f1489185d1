//! Classifier error types.

use thiserror::Error;

/// Errors returned by the classifier API.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// A training sample referenced a label the classifier was not built with.
    #[error("unknown intent '{0}'")]
    UnknownLabel(String),

    /// No label cleared the acceptance threshold.
    #[error("unable to classify intent")]
    IntentUnclear,

    /// Some queued samples could not be incorporated. Each one was logged.
    #[error("experienced {0} training errors")]
    TrainingErrors(usize),

    /// The persisted model is corrupt or of another type.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// The classifier was restored from a model and is inference-only.
    #[error("classifier was restored from a model and cannot be trained")]
    TrainingUnsupported,

    /// `finish_training` has already closed the training queue.
    #[error("training has already finished")]
    TrainingFinished,

    /// The label set is empty or contains duplicates.
    #[error("invalid label set: {0}")]
    InvalidLabels(String),

    /// The acceptance threshold is not within `[0, 1]`.
    #[error("threshold {0} is outside [0, 1]")]
    InvalidThreshold(f64),

    /// A training classifier was created outside a Tokio runtime.
    #[error("no Tokio runtime available for the training worker: {0}")]
    NoRuntime(String),

    /// Writing the model failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ClassifierError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidModel(err.to_string())
    }
}

/// Failure to incorporate a single training sample.
#[derive(Debug, Clone, Error)]
pub enum TrainingError {
    /// The sample text produced no tokens.
    #[error("sample for intent '{label}' contains no words")]
    EmptySample {
        /// Label the sample was submitted under.
        label: String,
    },
}

/// Result type for classifier operations.
pub type ClassifierResult<T> = Result<T, ClassifierError>;
