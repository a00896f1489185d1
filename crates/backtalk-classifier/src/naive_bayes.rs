//! Multinomial naive Bayes intent classifier.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::mem;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::Classifier;
use crate::error::{ClassifierError, ClassifierResult};
use crate::model::{Model, NAIVE_BAYES};
use crate::stats::{WordStats, best_probability};
use crate::tokenize::tokenize;
use crate::training::{Sample, Trainer};

/// Default bound of the training queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// The most likely label for a text, before thresholding.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Winning label.
    pub label: String,
    /// Normalized probability of the winning label.
    pub probability: f64,
}

enum TrainingState {
    Open(Trainer),
    Finished,
    Unsupported,
}

impl TrainingState {
    fn name(&self) -> &'static str {
        match self {
            Self::Open(_) => "open",
            Self::Finished => "finished",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Incremental naive Bayes classifier over a fixed label set.
///
/// A classifier built with [`new`](Self::new) accepts samples through
/// [`train`](Self::train) until [`finish_training`](Self::finish_training) is
/// called. Samples are folded in by a background task in submission order.
/// A classifier restored with [`from_model`](Self::from_model) or
/// [`from_json`](Self::from_json) is inference-only.
///
/// # Example
///
/// ```rust,ignore
/// let classifier = NaiveBayesClassifier::new(["Morning", "Night"], 0.5)?;
/// classifier.train("Morning", "good morning").await?;
/// classifier.train("Night", "good night").await?;
/// classifier.finish_training().await?;
///
/// assert_eq!(classifier.classify("good morning")?, "Morning");
/// ```
pub struct NaiveBayesClassifier {
    labels: Arc<[String]>,
    index: HashMap<String, usize>,
    threshold: f64,
    stats: Arc<RwLock<WordStats>>,
    training: Mutex<TrainingState>,
}

impl NaiveBayesClassifier {
    /// Creates a classifier ready for training.
    ///
    /// Must be called within a Tokio runtime; the training worker is spawned
    /// on it.
    pub fn new<I, S>(labels: I, threshold: f64) -> ClassifierResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_queue_capacity(labels, threshold, DEFAULT_QUEUE_CAPACITY)
    }

    /// Creates a classifier whose training queue holds at most `capacity`
    /// pending samples.
    pub fn with_queue_capacity<I, S>(
        labels: I,
        threshold: f64,
        capacity: usize,
    ) -> ClassifierResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Arc<[String]> = labels.into_iter().map(Into::into).collect();
        let index = index_labels(&labels).map_err(ClassifierError::InvalidLabels)?;
        check_threshold(threshold)?;

        let runtime =
            Handle::try_current().map_err(|e| ClassifierError::NoRuntime(e.to_string()))?;
        let stats = Arc::new(RwLock::new(WordStats::new(labels.len())));
        let trainer = Trainer::spawn(&runtime, stats.clone(), labels.clone(), capacity);

        debug!(labels = labels.len(), threshold, capacity, "Created naive Bayes classifier");

        Ok(Self {
            labels,
            index,
            threshold,
            stats,
            training: Mutex::new(TrainingState::Open(trainer)),
        })
    }

    /// Queues a training sample.
    ///
    /// Waits only when the queue is full, never for the sample to be
    /// incorporated.
    pub async fn train(&self, label: &str, text: impl Into<String>) -> ClassifierResult<()> {
        let label_index = *self
            .index
            .get(label)
            .ok_or_else(|| ClassifierError::UnknownLabel(label.to_string()))?;

        let sender = match &*self.training.lock() {
            TrainingState::Open(trainer) => trainer.sender(),
            TrainingState::Finished => return Err(ClassifierError::TrainingFinished),
            TrainingState::Unsupported => return Err(ClassifierError::TrainingUnsupported),
        };

        sender
            .send(Sample {
                label: label_index,
                text: text.into(),
            })
            .await
            .map_err(|_| ClassifierError::TrainingFinished)
    }

    /// Closes the training queue and waits until every queued sample has been
    /// processed.
    ///
    /// Returns [`ClassifierError::TrainingErrors`] with the number of samples
    /// that could not be used. Each failure is logged individually.
    pub async fn finish_training(&self) -> ClassifierResult<()> {
        let trainer = {
            let mut state = self.training.lock();
            match mem::replace(&mut *state, TrainingState::Finished) {
                TrainingState::Open(trainer) => trainer,
                TrainingState::Finished => return Err(ClassifierError::TrainingFinished),
                TrainingState::Unsupported => {
                    *state = TrainingState::Unsupported;
                    return Err(ClassifierError::TrainingUnsupported);
                }
            }
        };

        let failures = trainer.finish().await;
        info!(
            vocabulary = self.stats.read().vocabulary_size(),
            failures, "Classifier training complete"
        );

        if failures > 0 {
            return Err(ClassifierError::TrainingErrors(failures));
        }
        Ok(())
    }

    /// Returns the most likely label and its probability.
    ///
    /// `None` when no token of `text` has been seen during training.
    pub fn predict(&self, text: &str) -> Option<Prediction> {
        let tokens = tokenize(text);
        let scores = self.stats.read().scores(&tokens)?;
        let (best, probability) = best_probability(&scores);

        Some(Prediction {
            label: self.labels[best].clone(),
            probability,
        })
    }

    /// Classifies `text`, failing with [`ClassifierError::IntentUnclear`] when
    /// the winning probability is below the threshold.
    pub fn classify(&self, text: &str) -> ClassifierResult<String> {
        let Some(prediction) = self.predict(text) else {
            debug!("No known words, unable to classify");
            return Err(ClassifierError::IntentUnclear);
        };

        if prediction.probability >= self.threshold {
            debug!(
                label = %prediction.label,
                probability = prediction.probability,
                "Classified intent"
            );
            Ok(prediction.label)
        } else {
            debug!(
                label = %prediction.label,
                probability = prediction.probability,
                threshold = self.threshold,
                "Best label is below the threshold"
            );
            Err(ClassifierError::IntentUnclear)
        }
    }

    /// Acceptance threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Labels in index order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Snapshots the classifier as a [`Model`].
    pub fn to_model(&self) -> ClassifierResult<Model> {
        let params = serde_json::to_value(&*self.stats.read())?;
        Ok(Model {
            model_type: NAIVE_BAYES.to_string(),
            labels: self.labels.to_vec(),
            threshold: self.threshold,
            params,
        })
    }

    /// Serializes the classifier to JSON.
    pub fn to_json(&self) -> ClassifierResult<Vec<u8>> {
        self.to_model()?.to_vec()
    }

    /// Writes the JSON model to `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> ClassifierResult<()> {
        writer.write_all(&self.to_json()?)?;
        writer.flush()?;
        Ok(())
    }

    /// Restores an inference-only classifier.
    pub fn from_model(model: Model) -> ClassifierResult<Self> {
        model.expect_type(NAIVE_BAYES)?;

        let labels: Arc<[String]> = model.labels.into();
        let index = index_labels(&labels).map_err(ClassifierError::InvalidModel)?;
        check_threshold(model.threshold)
            .map_err(|e| ClassifierError::InvalidModel(e.to_string()))?;

        let stats: WordStats = serde_json::from_value(model.params)?;
        stats
            .validate(labels.len())
            .map_err(ClassifierError::InvalidModel)?;

        debug!(
            labels = labels.len(),
            vocabulary = stats.vocabulary_size(),
            "Restored naive Bayes classifier"
        );

        Ok(Self {
            labels,
            index,
            threshold: model.threshold,
            stats: Arc::new(RwLock::new(stats)),
            training: Mutex::new(TrainingState::Unsupported),
        })
    }

    /// Restores an inference-only classifier from JSON.
    pub fn from_json(data: &[u8]) -> ClassifierResult<Self> {
        Self::from_model(Model::from_slice(data)?)
    }
}

impl Classifier for NaiveBayesClassifier {
    fn classify(&self, text: &str) -> ClassifierResult<String> {
        NaiveBayesClassifier::classify(self, text)
    }

    fn labels(&self) -> &[String] {
        NaiveBayesClassifier::labels(self)
    }

    fn threshold(&self) -> f64 {
        NaiveBayesClassifier::threshold(self)
    }
}

impl fmt::Debug for NaiveBayesClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NaiveBayesClassifier")
            .field("labels", &self.labels)
            .field("threshold", &self.threshold)
            .field("vocabulary", &self.stats.read().vocabulary_size())
            .field("training", &self.training.lock().name())
            .finish()
    }
}

fn index_labels(labels: &[String]) -> Result<HashMap<String, usize>, String> {
    if labels.is_empty() {
        return Err("at least one label is required".to_string());
    }

    let mut index = HashMap::with_capacity(labels.len());
    for (i, label) in labels.iter().enumerate() {
        if label.is_empty() {
            return Err("labels must not be empty".to_string());
        }
        if index.insert(label.clone(), i).is_some() {
            return Err(format!("duplicate label '{label}'"));
        }
    }
    Ok(index)
}

fn check_threshold(threshold: f64) -> ClassifierResult<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(ClassifierError::InvalidThreshold(threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    async fn morning_night() -> NaiveBayesClassifier {
        let classifier = NaiveBayesClassifier::new(["Morning", "Night"], 0.5).unwrap();
        classifier.train("Morning", "good morning").await.unwrap();
        classifier.train("Night", "good night").await.unwrap();
        classifier.finish_training().await.unwrap();
        classifier
    }

    fn with_threshold(classifier: &NaiveBayesClassifier, threshold: f64) -> NaiveBayesClassifier {
        let mut model = classifier.to_model().unwrap();
        model.threshold = threshold;
        NaiveBayesClassifier::from_model(model).unwrap()
    }

    #[tokio::test]
    async fn test_morning_night() {
        let classifier = morning_night().await;

        assert_eq!(classifier.classify("good morning").unwrap(), "Morning");
        assert_eq!(classifier.classify("Good night!").unwrap(), "Night");
        assert!(matches!(
            classifier.classify("banana"),
            Err(ClassifierError::IntentUnclear)
        ));
        assert!(matches!(
            classifier.classify(""),
            Err(ClassifierError::IntentUnclear)
        ));
    }

    #[tokio::test]
    async fn test_prediction_probability() {
        let classifier = morning_night().await;

        let prediction = classifier.predict("good morning").unwrap();
        assert_eq!(prediction.label, "Morning");
        assert!((prediction.probability - 2.0 / 3.0).abs() < 1e-12);

        // "good" carries no preference, so the first label wins the tie.
        let prediction = classifier.predict("good").unwrap();
        assert_eq!(prediction.label, "Morning");
        assert!((prediction.probability - 0.5).abs() < 1e-12);

        assert!(classifier.predict("banana").is_none());
    }

    #[tokio::test]
    async fn test_threshold_boundary() {
        let classifier = morning_night().await;
        let probability = classifier.predict("good morning").unwrap().probability;

        let at = with_threshold(&classifier, probability);
        assert_eq!(at.classify("good morning").unwrap(), "Morning");

        let below = with_threshold(&classifier, probability - 1e-9);
        assert_eq!(below.classify("good morning").unwrap(), "Morning");

        let above = with_threshold(&classifier, probability + 1e-9);
        assert!(matches!(
            above.classify("good morning"),
            Err(ClassifierError::IntentUnclear)
        ));
    }

    #[tokio::test]
    async fn test_round_trip() {
        let classifier = morning_night().await;
        let restored = NaiveBayesClassifier::from_json(&classifier.to_json().unwrap()).unwrap();

        assert_eq!(restored.labels(), classifier.labels());
        assert_eq!(restored.threshold(), classifier.threshold());
        for text in ["good morning", "good night", "good", "banana", "morning night", ""] {
            assert_eq!(restored.predict(text), classifier.predict(text), "{text}");
            assert_eq!(
                restored.classify(text).ok(),
                classifier.classify(text).ok(),
                "{text}"
            );
        }
    }

    #[tokio::test]
    async fn test_write_to() {
        let classifier = morning_night().await;
        let mut buf = Vec::new();
        classifier.write_to(&mut buf).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json["Type"], "NaiveBayes");
        assert_eq!(json["Labels"], serde_json::json!(["Morning", "Night"]));
        assert_eq!(json["Threshold"], 0.5);
        assert_eq!(json["Model"]["documents"], serde_json::json!([1, 1]));
        assert_eq!(json["Model"]["vocabulary"]["good"], serde_json::json!([1, 1]));
    }

    #[tokio::test]
    async fn test_unknown_label_leaves_stats_unchanged() {
        let classifier = NaiveBayesClassifier::new(["Morning", "Night"], 0.5).unwrap();
        classifier.train("Morning", "good morning").await.unwrap();

        let err = classifier.train("Noon", "good noon").await.unwrap_err();
        assert!(matches!(err, ClassifierError::UnknownLabel(ref label) if label == "Noon"));

        classifier.train("Night", "good night").await.unwrap();
        classifier.finish_training().await.unwrap();

        assert!(classifier.predict("noon").is_none());
        assert_eq!(
            classifier.to_model().unwrap().params,
            morning_night().await.to_model().unwrap().params
        );
    }

    #[tokio::test]
    async fn test_empty_samples_are_counted() {
        let classifier = NaiveBayesClassifier::new(["Morning", "Night"], 0.5).unwrap();
        classifier.train("Morning", "good morning").await.unwrap();
        classifier.train("Morning", "?!").await.unwrap();
        classifier.train("Night", "good night").await.unwrap();

        let err = classifier.finish_training().await.unwrap_err();
        assert!(matches!(err, ClassifierError::TrainingErrors(1)));

        // The valid samples were still incorporated.
        assert_eq!(classifier.classify("good night").unwrap(), "Night");
    }

    #[tokio::test]
    async fn test_training_after_finish() {
        let classifier = morning_night().await;

        assert!(matches!(
            classifier.train("Morning", "rise and shine").await,
            Err(ClassifierError::TrainingFinished)
        ));
        assert!(matches!(
            classifier.finish_training().await,
            Err(ClassifierError::TrainingFinished)
        ));
    }

    #[tokio::test]
    async fn test_restored_classifier_is_inference_only() {
        let classifier = morning_night().await;
        let restored = NaiveBayesClassifier::from_json(&classifier.to_json().unwrap()).unwrap();

        assert!(matches!(
            restored.train("Morning", "rise and shine").await,
            Err(ClassifierError::TrainingUnsupported)
        ));
        assert!(matches!(
            restored.finish_training().await,
            Err(ClassifierError::TrainingUnsupported)
        ));
        // Still unsupported on the second attempt.
        assert!(matches!(
            restored.finish_training().await,
            Err(ClassifierError::TrainingUnsupported)
        ));
    }

    #[tokio::test]
    async fn test_constructor_validation() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            NaiveBayesClassifier::new(empty, 0.5),
            Err(ClassifierError::InvalidLabels(_))
        ));
        assert!(matches!(
            NaiveBayesClassifier::new(["A", "A"], 0.5),
            Err(ClassifierError::InvalidLabels(_))
        ));
        assert!(matches!(
            NaiveBayesClassifier::new(["A", ""], 0.5),
            Err(ClassifierError::InvalidLabels(_))
        ));
        assert!(matches!(
            NaiveBayesClassifier::new(["A"], 1.5),
            Err(ClassifierError::InvalidThreshold(_))
        ));
        assert!(matches!(
            NaiveBayesClassifier::new(["A"], f64::NAN),
            Err(ClassifierError::InvalidThreshold(_))
        ));
        assert_ok!(NaiveBayesClassifier::new(["A"], 0.0));
        assert_ok!(NaiveBayesClassifier::new(["A"], 1.0));
    }

    #[test]
    fn test_new_outside_runtime() {
        assert!(matches!(
            NaiveBayesClassifier::new(["A"], 0.5),
            Err(ClassifierError::NoRuntime(_))
        ));
    }

    #[test]
    fn test_invalid_models() {
        let valid = serde_json::json!({
            "Type": "NaiveBayes",
            "Labels": ["Morning", "Night"],
            "Threshold": 0.5,
            "Model": {
                "documents": [1, 1],
                "words": [2, 2],
                "vocabulary": { "good": [1, 1], "morning": [1, 0], "night": [0, 1] }
            }
        });
        assert_ok!(NaiveBayesClassifier::from_json(valid.to_string().as_bytes()));

        let mut wrong_type = valid.clone();
        wrong_type["Type"] = "Perceptron".into();

        let mut short_counts = valid.clone();
        short_counts["Model"]["documents"] = serde_json::json!([1]);

        let mut bad_totals = valid.clone();
        bad_totals["Model"]["words"] = serde_json::json!([3, 2]);

        let mut duplicate_labels = valid.clone();
        duplicate_labels["Labels"] = serde_json::json!(["Morning", "Morning"]);

        let mut bad_threshold = valid.clone();
        bad_threshold["Threshold"] = (-0.1).into();

        let mut bad_blob = valid.clone();
        bad_blob["Model"] = "opaque".into();

        for model in [
            wrong_type,
            short_counts,
            bad_totals,
            duplicate_labels,
            bad_threshold,
            bad_blob,
        ] {
            let result = NaiveBayesClassifier::from_json(model.to_string().as_bytes());
            assert!(
                matches!(result, Err(ClassifierError::InvalidModel(_))),
                "{model}"
            );
        }

        assert_err!(NaiveBayesClassifier::from_json(b"{"));
    }

    /// Collects formatted log lines.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_classify_logs_decision() {
        let classifier = morning_night().await;
        let strict = with_threshold(&classifier, 0.99);

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            assert_eq!(classifier.classify("good morning").unwrap(), "Morning");
            assert_err!(strict.classify("good morning"));
            assert_err!(classifier.classify("banana"));
        });

        let output = String::from_utf8(logs.0.lock().clone()).unwrap();
        assert!(output.contains("Classified intent"), "{output}");
        assert!(output.contains("label=Morning probability="), "{output}");
        assert!(output.contains("Best label is below the threshold"), "{output}");
        assert!(output.contains("threshold=0.99"), "{output}");
        assert!(output.contains("No known words"), "{output}");
    }

    #[tokio::test]
    async fn test_queue_backpressure_preserves_order() {
        let classifier =
            NaiveBayesClassifier::with_queue_capacity(["Morning", "Night"], 0.5, 1).unwrap();
        for _ in 0..100 {
            classifier.train("Morning", "good morning").await.unwrap();
            classifier.train("Night", "good night").await.unwrap();
        }
        classifier.finish_training().await.unwrap();

        let model = classifier.to_model().unwrap();
        assert_eq!(model.params["documents"], serde_json::json!([100, 100]));
        assert_eq!(classifier.classify("good morning").unwrap(), "Morning");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reclassifies_training_material() {
        let material: &[(&str, &[&str])] = &[
            (
                "WhatServiceInDC",
                &[
                    "What {Service} is out?",
                    "What {Service} is in {Datacenter}?",
                    "What {Service} is out in {Datacenter}?",
                ],
            ),
            (
                "WhenServiceReleased",
                &[
                    "When was {Service} [last] [released|deployed] [to {Datacenter}?",
                    "When was {Service} released?",
                    "When was {Service} deployed?",
                    "When was {Service} last released?",
                    "When was {Service} last deployed?",
                    "When was {Service} released to {Datacenter}?",
                    "When was {Service} deployed to {Datacenter}?",
                    "When was {Service} last released to {Datacenter}?",
                    "When was {Service} last deployed to {Datacenter}?",
                ],
            ),
            (
                "WhatReleaseHistory",
                &[
                    "What is the release history for {Service} in {Datacenter}?",
                    "What is the release history of {Service} to {Datacenter}?",
                    "What is the release history of {Service}?",
                ],
            ),
            (
                "WhatsWeird",
                &[
                    "What is weird with {Service}?",
                    "What is weird in {Datacenter}?",
                    "What is weird with {Service} in {Datacenter}?",
                    "What's wrong with {Service}?",
                    "What's suspicious with {Service}?",
                    "What's unusual with {Service}?",
                ],
            ),
        ];

        let labels = material.iter().map(|(label, _)| *label);
        let classifier = NaiveBayesClassifier::new(labels, 0.5).unwrap();
        for (label, samples) in material {
            for sample in *samples {
                classifier.train(label, *sample).await.unwrap();
            }
        }
        classifier.finish_training().await.unwrap();

        for (label, samples) in material {
            for sample in *samples {
                assert_eq!(classifier.classify(sample).unwrap(), *label, "{sample}");
            }
        }
    }

    #[tokio::test]
    async fn test_debug_output() {
        let classifier = morning_night().await;
        let debug = format!("{classifier:?}");
        assert!(debug.contains("NaiveBayesClassifier"));
        assert!(debug.contains("finished"));
    }
}
