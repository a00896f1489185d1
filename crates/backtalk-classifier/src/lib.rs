//! Incremental text classification for intent routing.
//!
//! The crate provides a multinomial naive Bayes classifier that is trained
//! online from `(label, text)` samples, gates its answers behind a confidence
//! threshold and persists to a small JSON model.
//!
//! # Training
//!
//! ```rust,ignore
//! use backtalk_classifier::NaiveBayesClassifier;
//!
//! let classifier = NaiveBayesClassifier::new(["Morning", "Night"], 0.5)?;
//! classifier.train("Morning", "good morning").await?;
//! classifier.train("Night", "good night").await?;
//! classifier.finish_training().await?;
//!
//! std::fs::write("model.json", classifier.to_json()?)?;
//! ```
//!
//! # Inference
//!
//! ```rust,ignore
//! let classifier = NaiveBayesClassifier::from_json(&std::fs::read("model.json")?)?;
//! match classifier.classify("good morning") {
//!     Ok(label) => println!("intent: {label}"),
//!     Err(ClassifierError::IntentUnclear) => println!("not sure"),
//!     Err(e) => return Err(e.into()),
//! }
//! ```

pub mod error;
pub mod model;
pub mod naive_bayes;
pub mod samples;
mod stats;
pub mod tokenize;
mod training;

pub use error::{ClassifierError, ClassifierResult, TrainingError};
pub use model::{Model, NAIVE_BAYES};
pub use naive_bayes::{DEFAULT_QUEUE_CAPACITY, NaiveBayesClassifier, Prediction};
pub use samples::Samples;
pub use tokenize::tokenize;

/// Maps text onto one of a fixed set of labels.
///
/// This is the only classifier surface the intent registry depends on.
pub trait Classifier: Send + Sync {
    /// Returns the label for `text`, or [`ClassifierError::IntentUnclear`]
    /// when no label is confident enough.
    fn classify(&self, text: &str) -> ClassifierResult<String>;

    /// Labels this classifier can produce.
    fn labels(&self) -> &[String];

    /// Minimum probability for a label to be accepted.
    fn threshold(&self) -> f64;
}
