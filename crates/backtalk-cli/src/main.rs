//! `btmodel`: trains an intent model from a samples file.
//!
//! ```bash
//! btmodel --samples samples.json -o model.json --threshold 0.7
//! ```
//!
//! The samples file maps every intent to example utterances:
//!
//! ```json
//! { "Intents": { "Morning": ["good morning"], "Night": ["good night"] } }
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use backtalk_classifier::{DEFAULT_QUEUE_CAPACITY, NaiveBayesClassifier, Samples};
use backtalk_runtime::LoggingBuilder;
use backtalk_runtime::config::LogOutput;
use clap::Parser;
use tracing::{Level, info};

#[derive(Parser, Debug)]
#[command(name = "btmodel", version, about = "Train a backtalk intent model")]
struct Args {
    /// Path to the training data file
    #[arg(long)]
    samples: PathBuf,

    /// Path to write the final model to
    #[arg(short = 'o', long = "output", default_value = "model.json")]
    output: PathBuf,

    /// Acceptance threshold
    #[arg(long, default_value_t = 0.7)]
    threshold: f64,

    /// Maximum number of samples waiting to be trained
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    LoggingBuilder::new()
        .with_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .output(LogOutput::Stderr)
        .with_target(false)
        .init();

    let started = Instant::now();
    let (classifier, intents) = train(&args.samples, args.threshold, args.queue_capacity).await?;

    let model = classifier
        .to_json()
        .context("failed to serialize the model")?;
    tokio::fs::write(&args.output, model)
        .await
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "{} (trained on {intents} intents in {:?})",
        args.output.display(),
        started.elapsed()
    );
    Ok(())
}

/// Reads `path` and trains a classifier on it. Returns the classifier and the
/// number of intents it knows.
async fn train(
    path: &Path,
    threshold: f64,
    queue_capacity: usize,
) -> Result<(NaiveBayesClassifier, usize)> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let samples = Samples::from_slice(&data)
        .with_context(|| format!("{} is not a valid samples file", path.display()))?;

    if samples.is_empty() {
        bail!("no training data provided in {}", path.display());
    }

    info!(
        intents = samples.len(),
        samples = samples.sample_count(),
        threshold,
        "Training model"
    );

    let classifier = samples
        .train(threshold, queue_capacity)
        .await
        .context("unexpected training error")?;
    Ok((classifier, samples.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("btmodel-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["btmodel", "--samples", "s.json"]).unwrap();
        assert_eq!(args.samples, PathBuf::from("s.json"));
        assert_eq!(args.output, PathBuf::from("model.json"));
        assert_eq!(args.threshold, 0.7);
        assert_eq!(args.queue_capacity, DEFAULT_QUEUE_CAPACITY);

        let args =
            Args::try_parse_from(["btmodel", "--samples", "s.json", "-o", "out.json"]).unwrap();
        assert_eq!(args.output, PathBuf::from("out.json"));
    }

    #[test]
    fn test_samples_required() {
        assert!(Args::try_parse_from(["btmodel"]).is_err());
    }

    #[tokio::test]
    async fn test_train_and_restore() {
        let path = write_temp(
            "day.json",
            r#"{"Intents": {
                "Morning": ["good morning", "what is for breakfast"],
                "Night": ["good night", "the moon is out"]
            }}"#,
        );

        let (classifier, intents) = train(&path, 0.5, 4).await.unwrap();
        assert_eq!(intents, 2);

        let restored = NaiveBayesClassifier::from_json(&classifier.to_json().unwrap()).unwrap();
        assert_eq!(restored.threshold(), 0.5);
        assert_eq!(restored.classify("the moon is out").unwrap(), "Night");

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_train_rejects_empty_file() {
        let path = write_temp("empty.json", r#"{"Intents": {}}"#);
        let err = train(&path, 0.5, 4).await.unwrap_err();
        assert!(err.to_string().contains("no training data"));
        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_train_missing_file() {
        let err = train(Path::new("/nonexistent/samples.json"), 0.5, 4)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
