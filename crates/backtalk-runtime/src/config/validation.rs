//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BacktalkConfig, BotConfig, ClassifierConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &BacktalkConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_bot_config(&config.bot)?;
    validate_classifier_config(&config.classifier)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Invalid log filter module name: {module:?}"
        )));
    }

    Ok(())
}

fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    if bot
        .model_path
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(ConfigError::missing_field("bot.model_path"));
    }

    if bot
        .samples_path
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(ConfigError::missing_field("bot.samples_path"));
    }

    Ok(())
}

fn validate_classifier_config(classifier: &ClassifierConfig) -> ConfigResult<()> {
    if !(0.0..=1.0).contains(&classifier.threshold) {
        return Err(ConfigError::validation(format!(
            "Classifier threshold must be within [0, 1], got {}",
            classifier.threshold
        )));
    }

    if classifier.queue_capacity == 0 {
        return Err(ConfigError::validation(
            "Classifier queue capacity must be greater than 0",
        ));
    }

    Ok(())
}
