//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Profile-specific file (`backtalk.{profile}.toml`)
//! 3. Main file (`backtalk.toml`)
//! 4. Environment variables (`BACKTALK_*`)
//! 5. Programmatic overrides
//!
//! # Environment Variable Mapping
//!
//! Variables use the `BACKTALK_` prefix and `__` as the nesting separator:
//!
//! - `BACKTALK_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `BACKTALK_BOT__MODEL_PATH=model.json` → `bot.model_path = "model.json"`
//! - `BACKTALK_CLASSIFIER__THRESHOLD=0.6` → `classifier.threshold = 0.6`
//!
//! # Example
//!
//! ```rust,ignore
//! use backtalk_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./config/backtalk.toml")
//!     .profile("production")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace};

use super::error::{ConfigError, ConfigResult};
use super::schema::BacktalkConfig;
use super::validation::validate_config;

const ENV_PREFIX: &str = "BACKTALK_";
const FILE_STEM: &str = "backtalk";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name. `prod` and `dev` are accepted as short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads the profile from `BACKTALK_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var("BACKTALK_PROFILE")
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layered configuration loader.
pub struct ConfigLoader {
    /// Programmatic overrides, merged last.
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific file to load instead of searching.
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that searches the default locations and reads the
    /// environment.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the current directory to the search paths.
    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Adds the user config directory (`~/.config/backtalk` on Linux) to the
    /// search paths.
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(dir) => self.search_path(dir.join(FILE_STEM)),
            None => self,
        }
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a configuration value on top of every other source.
    pub fn merge(mut self, config: BacktalkConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Sets a single key on top of every other source, e.g.
    /// `.set("classifier.threshold", 0.8)`.
    pub fn set<V: serde::Serialize>(mut self, key: &str, value: V) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads and validates the configuration.
    pub fn load(self) -> ConfigResult<BacktalkConfig> {
        let profile = self.profile.clone();
        let config: BacktalkConfig = self.build_figment()?.extract()?;
        validate_config(&config)?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            "Configuration loaded"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(BacktalkConfig::default()));

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_config_file(figment, &path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(
                Env::prefixed(ENV_PREFIX)
                    .ignore(&["PROFILE"])
                    .split("__"),
            );
        }

        Ok(figment.merge(self.overrides))
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join(FILE_STEM));
        }
        paths
    }

    /// Merges the profile file and the main file from the first search path
    /// that has a main file.
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        for dir in self.resolve_search_paths() {
            let base = dir.join(format!("{FILE_STEM}.toml"));
            if !base.exists() {
                continue;
            }

            let profiled = dir.join(format!("{FILE_STEM}.{}.toml", self.profile));
            if profiled.exists() {
                debug!(path = %profiled.display(), "Loading profile-specific config");
                figment = merge_toml(figment, &profiled);
            }

            info!(path = %base.display(), "Loading configuration file");
            return merge_toml(figment, &base);
        }

        debug!("No configuration file found, using defaults");
        figment
    }
}

fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    match path.extension().and_then(|e| e.to_str()) {
        #[cfg(feature = "toml-config")]
        Some("toml") => Ok(merge_toml(figment, path)),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(feature = "toml-config")]
fn merge_toml(figment: Figment, path: &Path) -> Figment {
    figment.merge(Toml::file(path))
}

#[cfg(not(feature = "toml-config"))]
fn merge_toml(figment: Figment, path: &Path) -> Figment {
    tracing::warn!(path = %path.display(), "TOML support disabled, ignoring file");
    figment
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<BacktalkConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from `path`, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<BacktalkConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================
