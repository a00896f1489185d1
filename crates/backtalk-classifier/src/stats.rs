//! Word frequency statistics and multinomial naive Bayes scoring.
//!
//! For every label `l` the score of a token sequence is
//!
//! ```text
//! ln((docs(l) + 1) / (total_docs + L))
//!   + Σ_w [ ln(count(w, l) + 1) - ln(words(l) + V) ]
//! ```
//!
//! where `L` is the number of labels, `V` the vocabulary size and the sum runs
//! over tokens found in the vocabulary. Both the prior and the word
//! likelihoods use add-one smoothing. Scores are turned into probabilities
//! with a softmax.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Accumulated training statistics, indexed by label position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct WordStats {
    /// Number of training samples per label.
    documents: Vec<u64>,
    /// Number of tokens per label.
    words: Vec<u64>,
    /// Per-label occurrence counts of every known token.
    vocabulary: BTreeMap<String, Vec<u64>>,
}

impl WordStats {
    pub(crate) fn new(labels: usize) -> Self {
        Self {
            documents: vec![0; labels],
            words: vec![0; labels],
            vocabulary: BTreeMap::new(),
        }
    }

    /// Adds one tokenized sample for `label`.
    pub(crate) fn observe(&mut self, label: usize, tokens: &[String]) {
        let labels = self.documents.len();
        self.documents[label] += 1;
        self.words[label] += tokens.len() as u64;
        for token in tokens {
            self.vocabulary
                .entry(token.clone())
                .or_insert_with(|| vec![0; labels])[label] += 1;
        }
    }

    /// Checks that restored statistics describe exactly `labels` labels.
    pub(crate) fn validate(&self, labels: usize) -> Result<(), String> {
        if self.documents.len() != labels || self.words.len() != labels {
            return Err(format!(
                "expected statistics for {labels} labels, found {} document and {} word counts",
                self.documents.len(),
                self.words.len()
            ));
        }

        let mut totals = vec![0u64; labels];
        for (word, counts) in &self.vocabulary {
            if counts.len() != labels {
                return Err(format!(
                    "word '{word}' has {} counts, expected {labels}",
                    counts.len()
                ));
            }
            for (total, count) in totals.iter_mut().zip(counts) {
                *total += count;
            }
        }
        if totals != self.words {
            return Err("word totals do not match vocabulary counts".to_string());
        }

        Ok(())
    }

    pub(crate) fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Log-scores per label, or `None` when no token is in the vocabulary.
    pub(crate) fn scores(&self, tokens: &[String]) -> Option<Vec<f64>> {
        let labels = self.documents.len() as f64;
        let total_docs: u64 = self.documents.iter().sum();
        let vocabulary = self.vocabulary.len() as f64;

        let mut scores: Vec<f64> = self
            .documents
            .iter()
            .map(|&docs| ((docs + 1) as f64 / (total_docs as f64 + labels)).ln())
            .collect();

        let mut evidence = false;
        for token in tokens {
            let Some(counts) = self.vocabulary.get(token) else {
                continue;
            };
            evidence = true;
            for ((score, &count), &words) in scores.iter_mut().zip(counts).zip(&self.words) {
                *score += ((count + 1) as f64).ln() - (words as f64 + vocabulary).ln();
            }
        }

        evidence.then_some(scores)
    }
}

/// Returns the index of the best score and its softmax probability.
///
/// Ties go to the lowest index.
pub(crate) fn best_probability(scores: &[f64]) -> (usize, f64) {
    let (best, max) = scores
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, max), (i, &score)| {
            if score > max { (i, score) } else { (best, max) }
        });

    let denominator: f64 = scores.iter().map(|score| (score - max).exp()).sum();
    (best, 1.0 / denominator)
}
