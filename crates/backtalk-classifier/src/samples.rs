//! Training corpus file format.
//!
//! ```json
//! {
//!   "Intents": {
//!     "Morning": ["good morning", "rise and shine"],
//!     "Night": ["good night", "time for bed"]
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClassifierError, ClassifierResult};
use crate::naive_bayes::NaiveBayesClassifier;

/// Example utterances grouped by intent.
///
/// Intents are kept sorted so that the label order of a trained model does not
/// depend on the order of keys in the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Samples {
    #[serde(rename = "Intents", default)]
    pub intents: BTreeMap<String, Vec<String>>,
}

impl Samples {
    /// Parses a samples file.
    pub fn from_slice(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    /// Intent names in label order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.intents.keys().map(String::as_str)
    }

    /// Number of intents.
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    /// Returns `true` if there are no intents.
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Total number of utterances across all intents.
    pub fn sample_count(&self) -> usize {
        self.intents.values().map(Vec::len).sum()
    }

    /// Builds a classifier over every intent, trains it on every utterance and
    /// closes training.
    pub async fn train(
        &self,
        threshold: f64,
        queue_capacity: usize,
    ) -> ClassifierResult<NaiveBayesClassifier> {
        if self.is_empty() {
            return Err(ClassifierError::InvalidLabels(
                "samples contain no intents".to_string(),
            ));
        }

        let classifier =
            NaiveBayesClassifier::with_queue_capacity(self.labels(), threshold, queue_capacity)?;

        for (intent, texts) in &self.intents {
            debug!(intent = %intent, samples = texts.len(), "Queueing samples");
            for text in texts {
                classifier.train(intent, text.as_str()).await?;
            }
        }

        classifier.finish_training().await?;
        Ok(classifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naive_bayes::DEFAULT_QUEUE_CAPACITY;

    const DAY: &str = r#"{
        "Intents": {
            "Night": ["good night", "it's cold outside", "the moon is out"],
            "Morning": ["good morning", "what is for breakfast"]
        }
    }"#;

    #[test]
    fn test_labels_sorted() {
        let samples = Samples::from_slice(DAY.as_bytes()).unwrap();
        assert_eq!(samples.labels().collect::<Vec<_>>(), ["Morning", "Night"]);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples.sample_count(), 5);
    }

    #[test]
    fn test_missing_intents_is_empty() {
        let samples = Samples::from_slice(b"{}").unwrap();
        assert!(samples.is_empty());
        assert!(Samples::from_slice(b"[]").is_err());
    }

    #[tokio::test]
    async fn test_train() {
        let samples = Samples::from_slice(DAY.as_bytes()).unwrap();
        let classifier = samples.train(0.5, DEFAULT_QUEUE_CAPACITY).await.unwrap();

        assert_eq!(classifier.labels(), ["Morning", "Night"]);
        assert_eq!(classifier.classify("the moon is out").unwrap(), "Night");
        assert_eq!(
            classifier.classify("what is for breakfast").unwrap(),
            "Morning"
        );
    }

    #[tokio::test]
    async fn test_train_empty() {
        let result = Samples::default().train(0.5, DEFAULT_QUEUE_CAPACITY).await;
        assert!(matches!(result, Err(ClassifierError::InvalidLabels(_))));
    }

    #[tokio::test]
    async fn test_train_reports_empty_sample() {
        let samples = Samples::from_slice(br#"{"Intents": {"A": ["hello", "?!"]}}"#).unwrap();
        let result = samples.train(0.5, DEFAULT_QUEUE_CAPACITY).await;
        assert!(matches!(result, Err(ClassifierError::TrainingErrors(1))));
    }
}
