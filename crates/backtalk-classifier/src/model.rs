//! Persisted model format.
//!
//! ```json
//! {
//!   "Type": "NaiveBayes",
//!   "Labels": ["Morning", "Night"],
//!   "Threshold": 0.5,
//!   "Model": { "documents": [1, 1], "words": [2, 2], "vocabulary": { "good": [1, 1] } }
//! }
//! ```
//!
//! The field names of the envelope are fixed. `Model` is opaque to everything
//! but the classifier that wrote it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClassifierError, ClassifierResult};

/// Type tag written by [`NaiveBayesClassifier`](crate::NaiveBayesClassifier).
pub const NAIVE_BAYES: &str = "NaiveBayes";

/// A value snapshot of a classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Classifier type tag.
    #[serde(rename = "Type")]
    pub model_type: String,
    /// Labels in index order.
    #[serde(rename = "Labels")]
    pub labels: Vec<String>,
    /// Acceptance threshold.
    #[serde(rename = "Threshold")]
    pub threshold: f64,
    /// Algorithm-specific parameters.
    #[serde(rename = "Model")]
    pub params: Value,
}

impl Model {
    /// Parses a model from its JSON form.
    pub fn from_slice(data: &[u8]) -> ClassifierResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Renders the model as JSON.
    pub fn to_vec(&self) -> ClassifierResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ClassifierError::InvalidModel(e.to_string()))
    }

    /// Fails unless the type tag equals `expected`.
    pub(crate) fn expect_type(&self, expected: &str) -> ClassifierResult<()> {
        if self.model_type == expected {
            Ok(())
        } else {
            Err(ClassifierError::InvalidModel(format!(
                "unknown model type '{}'",
                self.model_type
            )))
        }
    }
}
