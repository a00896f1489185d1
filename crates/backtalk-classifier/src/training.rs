//! Background training worker.
//!
//! Samples are pushed onto a bounded queue and folded into the shared
//! statistics by a single task, in submission order. Samples that cannot be
//! used are reported on a separate unbounded channel so the worker never
//! blocks on error reporting.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::TrainingError;
use crate::stats::WordStats;
use crate::tokenize::tokenize;

/// A queued training sample.
#[derive(Debug)]
pub(crate) struct Sample {
    pub(crate) label: usize,
    pub(crate) text: String,
}

/// Owns the sending side of the queue and the worker task.
pub(crate) struct Trainer {
    samples: mpsc::Sender<Sample>,
    errors: mpsc::UnboundedReceiver<TrainingError>,
    worker: JoinHandle<()>,
}

impl Trainer {
    pub(crate) fn spawn(
        runtime: &Handle,
        stats: Arc<RwLock<WordStats>>,
        labels: Arc<[String]>,
        capacity: usize,
    ) -> Self {
        let (samples, rx) = mpsc::channel(capacity.max(1));
        let (error_tx, errors) = mpsc::unbounded_channel();
        let worker = runtime.spawn(run_worker(rx, error_tx, stats, labels));

        Self {
            samples,
            errors,
            worker,
        }
    }

    /// Sender for enqueueing samples. Cloned so the caller can await outside
    /// any lock.
    pub(crate) fn sender(&self) -> mpsc::Sender<Sample> {
        self.samples.clone()
    }

    /// Closes the queue, waits for the worker to drain it and returns the
    /// number of samples that failed.
    pub(crate) async fn finish(self) -> usize {
        let Self {
            samples,
            mut errors,
            worker,
        } = self;
        drop(samples);

        let mut failures = 0;
        if let Err(e) = worker.await {
            warn!(error = %e, "Training worker terminated abnormally");
            failures += 1;
        }

        while let Some(err) = errors.recv().await {
            warn!(error = %err, "Training sample rejected");
            failures += 1;
        }

        debug!(failures, "Training finished");
        failures
    }
}

async fn run_worker(
    mut samples: mpsc::Receiver<Sample>,
    errors: mpsc::UnboundedSender<TrainingError>,
    stats: Arc<RwLock<WordStats>>,
    labels: Arc<[String]>,
) {
    while let Some(sample) = samples.recv().await {
        let tokens = tokenize(&sample.text);
        if tokens.is_empty() {
            let _ = errors.send(TrainingError::EmptySample {
                label: labels[sample.label].clone(),
            });
            continue;
        }

        trace!(label = %labels[sample.label], tokens = tokens.len(), "Observing sample");
        stats.write().observe(sample.label, &tokens);
    }
}
