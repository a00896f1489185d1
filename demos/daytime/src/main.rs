//! Daytime Bot Example
//!
//! A console bot that guesses the time of day from what you tell it.
//!
//! Every line typed on stdin is delivered as a message from user `U1`. Plain
//! lines go to the private channel `D1`; a line starting with `#channel `
//! is posted in that public channel instead, where the bot only listens when
//! mentioned:
//!
//! ```text
//! the moon is out
//! [D1] Looks like nighttime
//! #general time for lunch
//! #general <@UDAYTIME> time for lunch
//! [general] Looks like afternoon
//! ```
//!
//! # Configuration
//!
//! `backtalk.toml` in the working directory, or `BACKTALK_*` variables:
//!
//! - `bot.model_path`: a model written by `btmodel`
//! - `bot.samples_path`: a samples file to train from at startup
//! - `bot.direct_only`: ignore messages not addressed to the bot
//!
//! Without either path the bundled `samples.json` is used.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package daytime
//! ```

mod intents;

use anyhow::{Context, Result};
use backtalk::classifier::Samples;
use backtalk::core::{BotIdentity, BoxedHandler, LocalHandle, LocalTransport, OutgoingMessage};
use backtalk::prelude::*;
use backtalk::runtime::config::{BacktalkConfig, ConfigLoader, LogOutput};
use backtalk::runtime::logging;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const BOT_ID: &str = "UDAYTIME";
const USER_ID: &str = "U1";
const DIRECT_CHANNEL: &str = "D1";

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = ConfigLoader::new().with_current_dir().load()?;

    // Replies are printed to stdout.
    if config.logging.output == LogOutput::Stdout {
        config.logging.output = LogOutput::Stderr;
    }
    logging::init_from_config(&config.logging);

    let classifier = load_classifier(&config).await?;
    info!(labels = ?classifier.labels(), "Classifier ready");

    let registry = intents::registry(Arc::new(classifier));
    let handler: BoxedHandler = if config.bot.direct_only {
        Arc::new(direct_filter(registry))
    } else {
        Arc::new(registry)
    };

    let session = SessionInfo::new(BotIdentity::new(BOT_ID, "daytime"))
        .with_private_channel(DIRECT_CHANNEL);
    let (transport, mut handle) = LocalTransport::new(session);
    let mut event_loop = EventLoop::new(transport);

    let result = {
        let run = event_loop.run_until_shutdown(handler.as_ref());
        tokio::pin!(run);

        tokio::select! {
            result = &mut run => result,
            input = console(&mut handle) => {
                input?;
                run.await
            }
        }
    };

    while let Some(reply) = handle.try_recv_outgoing() {
        print_reply(&reply);
    }

    info!(stats = ?event_loop.stats(), "Bot stopped");
    result.context("event loop failed")
}

/// Restores the configured model, or trains one from samples.
async fn load_classifier(config: &BacktalkConfig) -> Result<NaiveBayesClassifier> {
    if let Some(path) = &config.bot.model_path {
        info!(path = %path.display(), "Loading model");
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        return Ok(NaiveBayesClassifier::from_json(&data)?);
    }

    let samples = match &config.bot.samples_path {
        Some(path) => {
            info!(path = %path.display(), "Training from samples");
            let data = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            Samples::from_slice(&data)?
        }
        None => Samples::from_slice(intents::DEFAULT_SAMPLES)?,
    };

    Ok(samples
        .train(config.classifier.threshold, config.classifier.queue_capacity)
        .await?)
}

/// Feeds stdin lines into the transport and prints replies until stdin ends.
async fn console(handle: &mut LocalHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let (channel, text) = parse_line(&line);
                if !text.is_empty() {
                    handle.message(USER_ID, channel, text)?;
                }
            }
            Some(reply) = handle.recv_outgoing() => print_reply(&reply),
        }
    }

    handle.close();
    Ok(())
}

/// Splits a console line into its channel and text.
fn parse_line(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.strip_prefix('#').and_then(|rest| rest.split_once(' ')) {
        Some((channel, text)) if !channel.is_empty() => (channel, text.trim_start()),
        _ => (DIRECT_CHANNEL, line),
    }
}

fn print_reply(reply: &OutgoingMessage) {
    println!("[{}] {}", reply.channel, reply.text);
}
